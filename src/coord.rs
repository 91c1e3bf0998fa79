// src/coord.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::geo::bd09_to_gcj02;
use crate::geo::gcj02_to_bd09;
use crate::geo::gcj02_to_wgs84;
use crate::geo::in_china_bounds;
use crate::geo::wgs84_to_gcj02;

/* ---------------- DOMAIN TYPES ---------------- */

// The three coordinate systems used by Chinese web maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CoordSystem {
    Wgs84,
    Gcj02,
    Bd09,
}

impl fmt::Display for CoordSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CoordSystem::Wgs84 => "WGS84",
            CoordSystem::Gcj02 => "GCJ02",
            CoordSystem::Bd09 => "BD09",
        };
        write!(f, "{s}")
    }
}

// Errors raised while labelling a coordinate.
#[derive(Debug, thiserror::Error)]
pub enum CoordError {
    #[error("unknown coordinate system `{0}` (expected WGS84, GCJ02 or BD09)")]
    UnknownCoordinateSystem(String),
}

impl FromStr for CoordSystem {
    type Err = CoordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "WGS84" => Ok(CoordSystem::Wgs84),
            "GCJ02" => Ok(CoordSystem::Gcj02),
            "BD09" => Ok(CoordSystem::Bd09),
            _ => Err(CoordError::UnknownCoordinateSystem(s.to_string())),
        }
    }
}

// A longitude/latitude pair tagged with its system, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub system: CoordSystem,
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinate {
    pub fn new(system: CoordSystem, longitude: f64, latitude: f64) -> Self {
        Self { system, longitude, latitude }
    }

    // Whether the point falls inside the area where GCJ02 differs from WGS84.
    pub fn in_china(&self) -> bool {
        in_china_bounds(self.longitude, self.latitude)
    }

    // The same point expressed in `target`, running only the legs needed.
    pub fn to_system(self, target: CoordSystem) -> Coordinate {
        let (lon, lat) = (self.longitude, self.latitude);

        let (lon, lat) = match (self.system, target) {
            (CoordSystem::Wgs84, CoordSystem::Wgs84)
            | (CoordSystem::Gcj02, CoordSystem::Gcj02)
            | (CoordSystem::Bd09, CoordSystem::Bd09) => return self,
            (CoordSystem::Wgs84, CoordSystem::Gcj02) => wgs84_to_gcj02(lon, lat),
            (CoordSystem::Wgs84, CoordSystem::Bd09) => {
                let (gcj_lon, gcj_lat) = wgs84_to_gcj02(lon, lat);
                gcj02_to_bd09(gcj_lon, gcj_lat)
            }
            (CoordSystem::Gcj02, CoordSystem::Wgs84) => gcj02_to_wgs84(lon, lat),
            (CoordSystem::Gcj02, CoordSystem::Bd09) => gcj02_to_bd09(lon, lat),
            (CoordSystem::Bd09, CoordSystem::Gcj02) => bd09_to_gcj02(lon, lat),
            (CoordSystem::Bd09, CoordSystem::Wgs84) => {
                let (gcj_lon, gcj_lat) = bd09_to_gcj02(lon, lat);
                gcj02_to_wgs84(gcj_lon, gcj_lat)
            }
        };

        Coordinate::new(target, lon, lat)
    }
}

/* ---------------- DISPATCHER ---------------- */

// One point expressed in all three systems.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionResult {
    pub origin: CoordSystem,
    pub wgs84: Coordinate,
    pub gcj02: Coordinate,
    pub bd09: Coordinate,
}

impl ConversionResult {
    // Original coordinate first, then the two derived ones.
    pub fn coordinates(&self) -> [Coordinate; 3] {
        match self.origin {
            CoordSystem::Gcj02 => [self.gcj02, self.bd09, self.wgs84],
            CoordSystem::Bd09 => [self.bd09, self.gcj02, self.wgs84],
            CoordSystem::Wgs84 => [self.wgs84, self.gcj02, self.bd09],
        }
    }
}

// Expands a coordinate into its three representations.
// Everything goes through GCJ02: BD09 and WGS84 are never converted directly.
pub fn expand_all_systems(coord: Coordinate) -> ConversionResult {
    let (lon, lat) = (coord.longitude, coord.latitude);

    let (wgs84, gcj02, bd09) = match coord.system {
        CoordSystem::Gcj02 => {
            let (bd_lon, bd_lat) = gcj02_to_bd09(lon, lat);
            let (wgs_lon, wgs_lat) = gcj02_to_wgs84(lon, lat);
            (
                Coordinate::new(CoordSystem::Wgs84, wgs_lon, wgs_lat),
                coord,
                Coordinate::new(CoordSystem::Bd09, bd_lon, bd_lat),
            )
        }
        CoordSystem::Bd09 => {
            let (gcj_lon, gcj_lat) = bd09_to_gcj02(lon, lat);
            let (wgs_lon, wgs_lat) = gcj02_to_wgs84(gcj_lon, gcj_lat);
            (
                Coordinate::new(CoordSystem::Wgs84, wgs_lon, wgs_lat),
                Coordinate::new(CoordSystem::Gcj02, gcj_lon, gcj_lat),
                coord,
            )
        }
        CoordSystem::Wgs84 => {
            let (gcj_lon, gcj_lat) = wgs84_to_gcj02(lon, lat);
            let (bd_lon, bd_lat) = gcj02_to_bd09(gcj_lon, gcj_lat);
            (
                coord,
                Coordinate::new(CoordSystem::Gcj02, gcj_lon, gcj_lat),
                Coordinate::new(CoordSystem::Bd09, bd_lon, bd_lat),
            )
        }
    };

    ConversionResult { origin: coord.system, wgs84, gcj02, bd09 }
}

// Same as `expand_all_systems`, for a system given by name.
pub fn expand_labeled(system: &str, lon: f64, lat: f64) -> Result<ConversionResult, CoordError> {
    let system: CoordSystem = system.parse()?;
    Ok(expand_all_systems(Coordinate::new(system, lon, lat)))
}
