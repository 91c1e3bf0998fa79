// src/geo.rs

use std::f64::consts::PI;

/* ---------------- CONSTANTES ---------------- */

// Krasovsky 1940 semi-major axis in meters.
const AXIS: f64 = 6378245.0;
// Eccentricity squared of the same ellipsoid.
const ECCENTRICITY_SQ: f64 = 0.006_693_421_622_965_943_23;
// Baidu trigonometric factor (PI * 3000 / 180).
const X_PI: f64 = PI * 3000.0 / 180.0;
// Baidu constant shifts, in degrees.
const BD_LON_OFFSET: f64 = 0.0065;
const BD_LAT_OFFSET: f64 = 0.0060;

// Half-width of the inverse search box, in degrees.
const SEARCH_HALF_WIDTH: f64 = 0.01;
// Residual below which the inverse search stops.
const INVERSE_TOLERANCE: f64 = 1e-10;
// Hard cap on bisection steps.
const INVERSE_MAX_ITER: usize = 10_000;

/* ---------------- CHINA BOUNDS ---------------- */

// Mainland China bounding rectangle (exclusive on every side).
// Outside it GCJ02 and WGS84 are the same coordinates.
pub fn in_china_bounds(lon: f64, lat: f64) -> bool {
    (73.66 < lon && lon < 135.05) && (3.86 < lat && lat < 53.55)
}

/* ---------------- OFFSET MODEL ---------------- */

// Raw offset of the GCJ02 obfuscation, evaluated on coordinates already
// centered on (105, 35).
// Returns (lat component, lon component), both unitless.
pub fn raw_offset(lon: f64, lat: f64) -> (f64, f64) {
    let lonlat = lon * lat;
    let abs_lon = lon.abs().sqrt();
    let lon_pi = lon * PI;
    let lat_pi = lat * PI;

    let d = 20.0 * (6.0 * lon_pi).sin() + 20.0 * (2.0 * lon_pi).sin();
    let mut x = d;
    let mut y = d;

    x += 20.0 * lat_pi.sin() + 40.0 * (lat_pi / 3.0).sin();
    y += 20.0 * lon_pi.sin() + 40.0 * (lon_pi / 3.0).sin();

    x += 160.0 * (lat_pi / 12.0).sin() + 320.0 * (lat_pi / 30.0).sin();
    y += 150.0 * (lon_pi / 12.0).sin() + 300.0 * (lon_pi / 30.0).sin();

    x *= 2.0 / 3.0;
    y *= 2.0 / 3.0;

    x += 2.0 * lon + 3.0 * lat + 0.2 * lat * lat + 0.1 * lonlat + 0.2 * abs_lon - 100.0;
    y += lon + 2.0 * lat + 0.1 * lon * lon + 0.1 * lonlat + 0.1 * abs_lon + 300.0;

    (x, y)
}

// Applies the scaled offset unconditionally.
fn apply_china_offset(lon: f64, lat: f64) -> (f64, f64) {
    let (dlat, dlon) = raw_offset(lon - 105.0, lat - 35.0);

    let rad_lat = lat / 180.0 * PI;
    let magic = rad_lat.sin();
    let magic = 1.0 - ECCENTRICITY_SQ * magic * magic;
    let sqrt_magic = magic.sqrt();

    let dlat = (dlat * 180.0) / ((AXIS * (1.0 - ECCENTRICITY_SQ)) / (magic * sqrt_magic) * PI);
    let dlon = (dlon * 180.0) / (AXIS / sqrt_magic * rad_lat.cos() * PI);

    (lon + dlon, lat + dlat)
}

/* ---------------- WGS84 <-> GCJ02 ---------------- */

// WGS84 -> GCJ02.
pub fn wgs84_to_gcj02(lon: f64, lat: f64) -> (f64, f64) {
    if !in_china_bounds(lon, lat) {
        return (lon, lat);
    }
    apply_china_offset(lon, lat)
}

// GCJ02 -> WGS84, by coordinate-wise bisection on the forward transform.
// Relies on the forward map being monotonic per axis near the root.
// When the iteration cap is hit the last midpoint is returned as is; at a
// small share of points the box collapses off the root on one axis and the
// result is only good to about 1e-5 degree.
pub fn gcj02_to_wgs84(lon: f64, lat: f64) -> (f64, f64) {
    let mut min_lon = lon - SEARCH_HALF_WIDTH;
    let mut max_lon = lon + SEARCH_HALF_WIDTH;
    let mut min_lat = lat - SEARCH_HALF_WIDTH;
    let mut max_lat = lat + SEARCH_HALF_WIDTH;

    let mut mid_lon = lon;
    let mut mid_lat = lat;

    for _ in 0..INVERSE_MAX_ITER {
        mid_lon = (min_lon + max_lon) / 2.0;
        mid_lat = (min_lat + max_lat) / 2.0;

        let (probe_lon, probe_lat) = wgs84_to_gcj02(mid_lon, mid_lat);
        let dlon = probe_lon - lon;
        let dlat = probe_lat - lat;

        if dlon.abs() < INVERSE_TOLERANCE && dlat.abs() < INVERSE_TOLERANCE {
            break;
        }

        if dlat > 0.0 {
            max_lat = mid_lat;
        } else {
            min_lat = mid_lat;
        }

        if dlon > 0.0 {
            max_lon = mid_lon;
        } else {
            min_lon = mid_lon;
        }
    }

    (mid_lon, mid_lat)
}

/* ---------------- GCJ02 <-> BD09 ---------------- */

// GCJ02 -> BD09.
pub fn gcj02_to_bd09(lon: f64, lat: f64) -> (f64, f64) {
    let z = (lon * lon + lat * lat).sqrt() + 0.00002 * (lat * X_PI).sin();
    let theta = lat.atan2(lon) + 0.000003 * (lon * X_PI).cos();
    (z * theta.cos() + BD_LON_OFFSET, z * theta.sin() + BD_LAT_OFFSET)
}

// BD09 -> GCJ02.
// Only an approximate inverse of `gcj02_to_bd09` (up to about 1.8e-6 degree over China).
pub fn bd09_to_gcj02(lon: f64, lat: f64) -> (f64, f64) {
    let x = lon - BD_LON_OFFSET;
    let y = lat - BD_LAT_OFFSET;
    let z = (x * x + y * y).sqrt() - 0.00002 * (y * X_PI).sin();
    let theta = y.atan2(x) - 0.000003 * (x * X_PI).cos();
    (z * theta.cos(), z * theta.sin())
}
