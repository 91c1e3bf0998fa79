//src/util.rs

use regex::Regex;
use once_cell::sync::Lazy;

/* ---------------- NUMERIC UTILS -------------- */

// Rounding of a floating-point number to N decimal places (max 10).
// Intentional limit to avoid excessively large exponents.
pub fn round(value: f64, decimals: u32) -> f64 {
    let precision = decimals.min(10);
    let factor = 10_f64.powi(precision as i32);
    (value * factor).round() / factor
}

/* ---------------- STRING PARSING -------------- */

// Field separator of a "lon,lat" location string.
// Accepts the ASCII comma and the full-width one, with optional blanks.
static LOCATION_SEP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s*[,，]\s*").expect("Invalid location separator regex")
});

// Errors raised while reading coordinates from text.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("malformed coordinate string `{input}`")]
    MalformedCoordinateString { input: String },
}

fn parse_degrees(field: &str) -> Result<f64, ParseError> {
    let value: f64 = field
        .trim()
        .parse()
        .map_err(|_| ParseError::MalformedCoordinateString { input: field.to_string() })?;

    if !value.is_finite() {
        return Err(ParseError::MalformedCoordinateString { input: field.to_string() });
    }

    Ok(value)
}

// ("115.668055", "34.449162") => (115.668055, 34.449162)
pub fn parse_lon_lat(lon: &str, lat: &str) -> Result<(f64, f64), ParseError> {
    let lon = parse_degrees(lon)?;
    let lat = parse_degrees(lat)?;
    Ok((lon, lat))
}

// "115.668055,34.449162" => (115.668055, 34.449162)
// Fields after the second one are ignored.
pub fn parse_location(location: &str) -> Result<(f64, f64), ParseError> {
    let mut fields = LOCATION_SEP_RE.split(location.trim());

    match (fields.next(), fields.next()) {
        (Some(lon), Some(lat)) => parse_lon_lat(lon, lat),
        _ => Err(ParseError::MalformedCoordinateString { input: location.to_string() }),
    }
}
