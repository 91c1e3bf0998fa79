// src/main.rs

/*
ARCHITECTURE OVERVIEW

This binary converts points between the three coordinate systems used by
Chinese web maps: WGS84 (GPS), GCJ02 (national obfuscated system) and
BD09 (Baidu).

High-level flow:
1. Parse CLI arguments and pick a command:
   - `csv`   → CSV-to-CSV batch conversion
   - `point` → one point, printed as JSON
2. Read input coordinates, either as separate `lon` / `lat` fields or as a
   single "lon,lat" location string, and label them with their system.
3. Expand every point into all three systems.
4. Write enriched rows (CSV) or the expansion (JSON).

Key design choices:
- All conversions go through GCJ02 (BD09 <-> GCJ02 <-> WGS84).
- GCJ02 -> WGS84 has no closed form and is solved by bisection.
- Errors are handled per-line in permissive mode, or fail-fast in strict mode.
- Math lives in `geo`, the data model and dispatcher in `coord`,
  text parsing in `util`.

The main module focuses on orchestration and I/O only.
*/

use std::collections::HashSet;
use std::fs::File;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use csv::{Reader, ReaderBuilder, Writer};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod util;
use crate::util::ParseError;
use crate::util::parse_location;
use crate::util::parse_lon_lat;
use crate::util::round;

mod geo;

mod coord;
use crate::coord::ConversionResult;
use crate::coord::CoordError;
use crate::coord::CoordSystem;
use crate::coord::Coordinate;
use crate::coord::expand_all_systems;
use crate::coord::expand_labeled;

/* ---------------- CONSTANTES ---------------- */

// Required CSV headers per input format (order-independent).
const SPLIT_HEADERS: &[&str] = &["name", "lon", "lat"];
const LOCATION_HEADERS: &[&str] = &["name", "location"];
// Needed unless a default system is given on the command line.
const SYSTEM_HEADER: &str = "system";

/* ---------------- CLI ---------------- */

// Command-line interface definition.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert every row of a CSV file into all three systems
    Csv(CsvArgs),
    /// Convert a single point and print the result as JSON
    Point(PointArgs),
}

#[derive(Args, Debug)]
struct CsvArgs {
    /// Input CSV file path
    #[arg(short, long)]
    input: PathBuf,

    /// Output CSV file path
    #[arg(short, long)]
    output: PathBuf,

    /// Coordinate input format
    #[arg(short = 'f', long, value_enum, default_value_t = InputFormat::Split)]
    input_format: InputFormat,

    /// Default coordinate system for rows without a `system` value
    #[arg(short, long)]
    system: Option<String>,

    /// Decimal places kept in the output
    #[arg(short, long, default_value_t = 6)]
    decimals: u32,

    /// Strict mode: stop on first error
    #[arg(long)]
    strict: bool,
}

#[derive(Args, Debug)]
struct PointArgs {
    /// Coordinate system of the input point (WGS84, GCJ02 or BD09)
    #[arg(short, long)]
    system: String,

    /// Point as a "lon,lat" string
    #[arg(short, long, allow_hyphen_values = true)]
    location: Option<String>,

    /// Longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true, conflicts_with = "location", requires = "lat")]
    lon: Option<String>,

    /// Latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true, conflicts_with = "location", requires = "lon")]
    lat: Option<String>,

    /// Only print the point in this system
    #[arg(short, long)]
    to: Option<String>,
}

// Supported coordinate layouts in the input CSV.
#[derive(Copy, Clone, Debug, PartialEq, ValueEnum)]
enum InputFormat {
    /// Separate `lon` and `lat` columns
    Split,
    /// One `location` column holding "lon,lat"
    Location,
}

/* ---------------- MAIN ERROR ---------------- */

// Application-level errors.
#[derive(Error, Debug)]
enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid header (missing or unreadable)")]
    InvalidHeader,

    #[error("Missing header field '{0}'")]
    MissingHeaderField(String),

    #[error("Unreadable row on line {line} (expected: {expected})")]
    InvalidRow {
        line: usize,
        expected: &'static str,
    },

    #[error("Line {line}: no coordinate system given")]
    MissingSystem { line: usize },

    #[error("Line {line}: {source}")]
    UnknownSystem {
        line: usize,
        source: CoordError,
    },

    #[error("Line {line}: {source}")]
    MalformedCoordinate {
        line: usize,
        source: ParseError,
    },

    #[error("No point given (use --location or --lon with --lat)")]
    MissingPoint,

    #[error(transparent)]
    Coord(#[from] CoordError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/* ---------------- INPUT CSV STRUCTS ---------------- */

// Separate longitude / latitude columns.
#[derive(Debug, Deserialize)]
struct InputSplit {
    name: String,
    #[serde(default)]
    system: Option<String>,
    lon: String,
    lat: String,
}

// Single "lon,lat" column.
#[derive(Debug, Deserialize)]
struct InputLocation {
    name: String,
    #[serde(default)]
    system: Option<String>,
    location: String,
}

/* ---------------- OUTPUT CSV STRUCTS ---------------- */

// Output CSV record (one point in all three systems).
#[derive(Debug, Serialize)]
struct OutputRecord {
    id: u64,
    name: String,
    system: CoordSystem,
    input: String,
    in_china: bool,

    wgs84_lon: f64,
    wgs84_lat: f64,
    gcj02_lon: f64,
    gcj02_lat: f64,
    bd09_lon: f64,
    bd09_lat: f64,
}

/* ---------------- LABELED POINT ---------------- */

// A parsed input row, before conversion.
#[derive(Debug, Clone)]
struct LabeledPoint {
    name: String,
    input: String,
    coord: Coordinate,
}

// Turns a raw CSV row into a labeled point.
trait IntoLabeledPoint {
    const FORMAT: &'static str;

    fn into_labeled_point(
        self,
        line: usize,
        default_system: Option<CoordSystem>,
    ) -> Result<LabeledPoint, AppError>;
}

impl IntoLabeledPoint for InputSplit {
    const FORMAT: &'static str = "split";

    fn into_labeled_point(
        self,
        line: usize,
        default_system: Option<CoordSystem>,
    ) -> Result<LabeledPoint, AppError> {
        let system = resolve_system(self.system.as_deref(), default_system, line)?;
        let (lon, lat) = parse_lon_lat(&self.lon, &self.lat)
            .map_err(|source| AppError::MalformedCoordinate { line, source })?;

        Ok(LabeledPoint {
            name: self.name,
            input: format!("{},{}", self.lon.trim(), self.lat.trim()),
            coord: Coordinate::new(system, lon, lat),
        })
    }
}

impl IntoLabeledPoint for InputLocation {
    const FORMAT: &'static str = "location";

    fn into_labeled_point(
        self,
        line: usize,
        default_system: Option<CoordSystem>,
    ) -> Result<LabeledPoint, AppError> {
        let system = resolve_system(self.system.as_deref(), default_system, line)?;
        let (lon, lat) = parse_location(&self.location)
            .map_err(|source| AppError::MalformedCoordinate { line, source })?;

        Ok(LabeledPoint {
            name: self.name,
            input: self.location,
            coord: Coordinate::new(system, lon, lat),
        })
    }
}

// A non-empty row value wins over the command-line default.
fn resolve_system(
    cell: Option<&str>,
    default_system: Option<CoordSystem>,
    line: usize,
) -> Result<CoordSystem, AppError> {
    match cell.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s
            .parse()
            .map_err(|source| AppError::UnknownSystem { line, source }),
        None => default_system.ok_or(AppError::MissingSystem { line }),
    }
}

/* ---------------- MAIN ---------------- */

fn main() -> Result<(), AppError> {

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // Parse CLI arguments.
    let cli = Cli::parse();

    match cli.command {
        Command::Csv(args) => {
            let stats = run_csv(&args)?;
            if stats.invalid > 0 {
                log::warn!("{} ignored line(s)", stats.invalid);
            }
            log::info!("{} point(s) written to {}", stats.written, args.output.display());
        }
        Command::Point(args) => {
            println!("{}", run_point(&args)?);
        }
    }

    Ok(())
}

/* ---------------- POINT ---------------- */

// Converts one point and renders it as pretty JSON.
fn run_point(args: &PointArgs) -> Result<String, AppError> {
    let (lon, lat) = match (&args.location, &args.lon, &args.lat) {
        (Some(location), _, _) => parse_location(location)?,
        (None, Some(lon), Some(lat)) => parse_lon_lat(lon, lat)?,
        _ => return Err(AppError::MissingPoint),
    };

    log::debug!("converting {} ({}, {})", args.system.trim(), lon, lat);

    let json = match &args.to {
        Some(target) => {
            let coord = Coordinate::new(args.system.parse()?, lon, lat);
            serde_json::to_string_pretty(&coord.to_system(target.parse()?))?
        }
        None => serde_json::to_string_pretty(&expand_labeled(&args.system, lon, lat)?.coordinates())?,
    };

    Ok(json)
}

/* ---------------- CSV ---------------- */

// Processing counters.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct RunStats {
    written: u64,
    invalid: u64,
}

// Output options shared by every row.
#[derive(Debug, Clone, Copy)]
struct RowOptions {
    default_system: Option<CoordSystem>,
    decimals: u32,
    strict: bool,
}

// Converts a whole CSV file.
fn run_csv(args: &CsvArgs) -> Result<RunStats, AppError> {

    let default_system = args
        .system
        .as_deref()
        .map(str::parse::<CoordSystem>)
        .transpose()?;

    // CSV reader / writer setup.
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_path(&args.input)?;
    let mut writer = Writer::from_writer(File::create(&args.output)?);

    // Validate required headers.
    let headers = reader.headers()
        .map_err(|_| AppError::InvalidHeader)?;

    let headers: HashSet<_> = headers.iter().collect();
    let required = match args.input_format {
        InputFormat::Split => SPLIT_HEADERS,
        InputFormat::Location => LOCATION_HEADERS,
    };
    for &h in required {
        if !headers.contains(h) {
            return Err(AppError::MissingHeaderField(h.to_string()));
        }
    }
    if default_system.is_none() && !headers.contains(SYSTEM_HEADER) {
        return Err(AppError::MissingHeaderField(SYSTEM_HEADER.to_string()));
    }

    let options = RowOptions {
        default_system,
        decimals: args.decimals,
        strict: args.strict,
    };

    // Dispatch based on input format.
    let stats = match args.input_format {
        InputFormat::Split => process_rows::<InputSplit>(&mut reader, &mut writer, options)?,
        InputFormat::Location => process_rows::<InputLocation>(&mut reader, &mut writer, options)?,
    };

    writer.flush()?;

    Ok(stats)
}

// Reads, converts and writes every row of one input format.
fn process_rows<T>(
    reader: &mut Reader<File>,
    writer: &mut Writer<File>,
    options: RowOptions,
) -> Result<RunStats, AppError>
where
    T: DeserializeOwned + IntoLabeledPoint,
{
    let mut stats = RunStats::default();
    let mut id: u64 = 1;
    let mut line_no = 1;

    for row in reader.deserialize::<T>() {
        line_no += 1;

        let point = row
            .map_err(|_| AppError::InvalidRow { line: line_no, expected: T::FORMAT })
            .and_then(|r| r.into_labeled_point(line_no, options.default_system));

        let point = match point {
            Ok(p) => p,
            Err(e) => {
                stats.invalid += 1;
                if options.strict {
                    return Err(e);
                }
                log::warn!("skipping row: {e}");
                continue;
            }
        };

        let result = expand_all_systems(point.coord);
        log::debug!("line {}: {} -> {:?}", line_no, point.name, result.coordinates());

        write_output(writer, &point, &result, id, options.decimals)?;
        stats.written += 1;
        id += 1;
    }

    Ok(stats)
}

// Serialize one CSV output row.
fn write_output(
    writer: &mut Writer<File>,
    point: &LabeledPoint,
    result: &ConversionResult,
    id: u64,
    decimals: u32,
) -> Result<(), csv::Error> {

    writer.serialize(OutputRecord {
        id,
        name: point.name.clone(),
        system: point.coord.system,
        input: point.input.clone(),
        in_china: point.coord.in_china(),
        wgs84_lon: round(result.wgs84.longitude, decimals),
        wgs84_lat: round(result.wgs84.latitude, decimals),
        gcj02_lon: round(result.gcj02.longitude, decimals),
        gcj02_lat: round(result.gcj02.latitude, decimals),
        bd09_lon: round(result.bd09.longitude, decimals),
        bd09_lat: round(result.bd09.latitude, decimals),
    })?;

    Ok(())
}

/* ---------------- TEST ---------------- */
