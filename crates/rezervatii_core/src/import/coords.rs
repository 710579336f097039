//! Free-text coordinate parsing for reserve sheets.
//!
//! Accepted shapes:
//! - degrees/minutes/seconds with hemisphere letters: `47°04′N 28°30′E`
//! - decimal degrees with hemisphere letters: `46.678361°N 28.228158°E`
//! - two bare numbers, latitude first: `46.678361, 28.228158`

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

const DMS_BODY: &str = r#"(?P<deg>[+-]?\d+(?:[.,]\d+)?)\s*(?:°|º)?\s*(?:(?P<min>[0-5]?\d(?:[.,]\d+)?)\s*(?:′|’|'|m)?\s*(?:(?P<sec>[0-5]?\d(?:[.,]\d+)?)\s*(?:″|"|s)?)?)?\s*"#;

static DMS_LAT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("{DMS_BODY}(?P<hemi>[NSns])")).expect("valid latitude regex")
});
static DMS_LON_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("{DMS_BODY}(?P<hemi>[EWew])")).expect("valid longitude regex")
});
static DEGREE_SIGN_RE: Lazy<Regex> = Lazy::new(|| Regex::new("[°º]").expect("valid degree regex"));
static SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s,;]+").expect("valid separator regex"));

/// Parses `(latitude, longitude)`; both are `None` when the text is not understood
/// or the pair falls outside WGS84 ranges.
pub fn parse_coordinates(raw: &str) -> (Option<f64>, Option<f64>) {
    let text = raw.trim();
    if text.is_empty() {
        return (None, None);
    }

    if let (Some(lat), Some(lon)) = (DMS_LAT_RE.captures(text), DMS_LON_RE.captures(text)) {
        if let (Some(lat), Some(lon)) = (dms_value(&lat), dms_value(&lon)) {
            if in_range(lat, lon) {
                return (Some(lat), Some(lon));
            }
        }
    }

    let stripped = DEGREE_SIGN_RE.replace_all(text, "");
    let numbers: Vec<f64> = SEPARATOR_RE
        .split(stripped.trim())
        .filter_map(|part| part.replace(',', ".").parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .take(2)
        .collect();
    if let [lat, lon] = numbers[..] {
        if in_range(lat, lon) {
            return (Some(lat), Some(lon));
        }
    }

    (None, None)
}

fn dms_value(caps: &Captures<'_>) -> Option<f64> {
    let part = |name: &str| -> Option<f64> {
        match caps.name(name) {
            Some(found) => found.as_str().replace(',', ".").parse().ok(),
            None => Some(0.0),
        }
    };
    let degrees: f64 = part("deg")?;
    let value = degrees.abs() + part("min")? / 60.0 + part("sec")? / 3600.0;
    let hemisphere = caps.name("hemi")?.as_str().to_ascii_uppercase();
    Some(if hemisphere == "S" || hemisphere == "W" {
        -value
    } else {
        value
    })
}

fn in_range(lat: f64, lon: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
}

#[cfg(test)]
mod tests {
    use super::parse_coordinates;

    fn close(actual: Option<f64>, expected: f64) -> bool {
        actual.is_some_and(|value| (value - expected).abs() < 1e-9)
    }

    #[test]
    fn parses_degrees_and_minutes() {
        let (lat, lon) = parse_coordinates("47°04′N 28°30′E");
        assert!(close(lat, 47.0 + 4.0 / 60.0));
        assert!(close(lon, 28.5));
    }

    #[test]
    fn parses_decimal_with_hemisphere() {
        let (lat, lon) = parse_coordinates("46.678361°N 28.228158°E");
        assert!(close(lat, 46.678361));
        assert!(close(lon, 28.228158));
    }

    #[test]
    fn southern_and_western_are_negative() {
        let (lat, lon) = parse_coordinates("33°30′S 70°40′W");
        assert!(close(lat, -33.5));
        assert!(close(lon, -(70.0 + 40.0 / 60.0)));
    }

    #[test]
    fn parses_bare_pairs() {
        let (lat, lon) = parse_coordinates("46.678361, 28.228158");
        assert!(close(lat, 46.678361));
        assert!(close(lon, 28.228158));
        let (lat, lon) = parse_coordinates("46.5 28.25");
        assert!(close(lat, 46.5));
        assert!(close(lon, 28.25));
    }

    #[test]
    fn rejects_out_of_range_and_garbage() {
        assert_eq!(parse_coordinates("95.0, 28.0"), (None, None));
        assert_eq!(parse_coordinates("lângă sat"), (None, None));
        assert_eq!(parse_coordinates("  "), (None, None));
    }
}
