use std::collections::BTreeMap;

const LATITUDE: &str = "GPSLatitude";
const LATITUDE_REF: &str = "GPSLatitudeRef";
const LONGITUDE: &str = "GPSLongitude";
const LONGITUDE_REF: &str = "GPSLongitudeRef";

/// Converts the raw GPS tag map into signed decimal degrees.
///
/// Expects the four standard tags, each coordinate encoded as a DMS triple of
/// rationals (`"40/1, 26/1, 4600/100"`) or plain decimals. Returns `None`
/// whenever any required tag is missing or unparsable; a malformed value is a
/// resolution failure, never a panic. The pair is all-or-nothing: there is no
/// report with only one coordinate.
pub fn resolve_coordinates(gps_raw: &BTreeMap<String, String>) -> Option<(f64, f64)> {
    let lat = convert(gps_raw.get(LATITUDE)?, gps_raw.get(LATITUDE_REF)?)?;
    let lon = convert(gps_raw.get(LONGITUDE)?, gps_raw.get(LONGITUDE_REF)?)?;
    Some((lat, lon))
}

/// Parses one DMS triple and applies the hemisphere reference.
fn convert(coordinate: &str, reference: &str) -> Option<f64> {
    let cleaned = coordinate.replace(['[', ']'], "");
    let mut components = cleaned.split(',').map(parse_component);

    let degrees = components.next()??;
    let minutes = components.next()??;
    let seconds = components.next()??;
    if components.next().is_some() {
        return None;
    }

    let decimal = degrees + minutes / 60.0 + seconds / 3600.0;
    match reference.trim() {
        "S" | "W" => Some(-decimal),
        _ => Some(decimal),
    }
}

/// Parses a single component as `numerator[/denominator]`. A non-numeric
/// value or a zero denominator is a parse failure.
fn parse_component(part: &str) -> Option<f64> {
    let part = part.trim();
    match part.split_once('/') {
        Some((numerator, denominator)) => {
            let numerator: f64 = numerator.trim().parse().ok()?;
            let denominator: f64 = denominator.trim().parse().ok()?;
            (denominator != 0.0).then(|| numerator / denominator)
        }
        None => part.parse().ok(),
    }
}
