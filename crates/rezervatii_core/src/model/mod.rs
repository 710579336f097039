//! Domain model for reserves, species and their time-indexed links.
//!
//! # Responsibility
//! - Define canonical records used by repositories, search and reports.
//! - Own field-level validation shared by every write path.
//!
//! # Invariants
//! - Persisted records carry `Some(id)`; drafts carry `None`.
//! - Names that must be unique are compared through [`name_key`].
//! - Coordinates are validated against WGS84 ranges before persistence.

pub mod association;
pub mod habitat;
pub mod links;
pub mod reserve;
pub mod site;
pub mod species;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Row identifier assigned by SQLite.
pub type RecordId = i64;

/// Earliest accepted observation/edition year.
pub const MIN_YEAR: i32 = 1800;
/// Latest accepted observation/edition year.
pub const MAX_YEAR: i32 = 2100;

/// Field-level validation failures for domain records.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Required text field is blank.
    Required(&'static str),
    /// Text field is shorter than its minimum length (in chars).
    TooShort { field: &'static str, min: usize },
    /// Text field length is outside `[min, max]` (in chars).
    LengthOutOfRange {
        field: &'static str,
        min: usize,
        max: usize,
    },
    LatitudeOutOfRange(f64),
    LongitudeOutOfRange(f64),
    YearOutOfRange { field: &'static str, value: i32 },
    Negative { field: &'static str, value: f64 },
    UnknownRedBookCategory(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Required(field) => write!(f, "`{field}` is required"),
            Self::TooShort { field, min } => {
                write!(f, "`{field}` must have at least {min} characters")
            }
            Self::LengthOutOfRange { field, min, max } => {
                write!(f, "`{field}` must have between {min} and {max} characters")
            }
            Self::LatitudeOutOfRange(value) => {
                write!(f, "latitude {value} must be between -90 and 90")
            }
            Self::LongitudeOutOfRange(value) => {
                write!(f, "longitude {value} must be between -180 and 180")
            }
            Self::YearOutOfRange { field, value } => write!(
                f,
                "`{field}` year {value} must be between {MIN_YEAR} and {MAX_YEAR}"
            ),
            Self::Negative { field, value } => {
                write!(f, "`{field}` must not be negative, got {value}")
            }
            Self::UnknownRedBookCategory(value) => {
                write!(f, "unknown Red Book category `{value}`")
            }
        }
    }
}

impl Error for ValidationError {}

/// Case-insensitive uniqueness key for names and codes.
pub fn name_key(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Trims text and maps blank values to `None`.
pub fn clean_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub(crate) fn require_min_len(
    field: &'static str,
    value: &str,
    min: usize,
) -> Result<(), ValidationError> {
    let len = value.trim().chars().count();
    if len == 0 {
        return Err(ValidationError::Required(field));
    }
    if len < min {
        return Err(ValidationError::TooShort { field, min });
    }
    Ok(())
}

pub(crate) fn validate_coordinates(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<(), ValidationError> {
    if let Some(lat) = latitude {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(ValidationError::LatitudeOutOfRange(lat));
        }
    }
    if let Some(lon) = longitude {
        if !(-180.0..=180.0).contains(&lon) {
            return Err(ValidationError::LongitudeOutOfRange(lon));
        }
    }
    Ok(())
}

pub(crate) fn validate_year(field: &'static str, year: i32) -> Result<(), ValidationError> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(ValidationError::YearOutOfRange { field, value: year });
    }
    Ok(())
}

pub(crate) fn validate_non_negative(
    field: &'static str,
    value: Option<f64>,
) -> Result<(), ValidationError> {
    match value {
        Some(value) if value < 0.0 => Err(ValidationError::Negative { field, value }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::{clean_optional, name_key, validate_coordinates, validate_year, ValidationError};

    #[test]
    fn name_key_trims_and_lowercases_unicode() {
        assert_eq!(name_key("  Pădurea SEACĂ "), "pădurea seacă");
    }

    #[test]
    fn clean_optional_maps_blank_to_none() {
        assert_eq!(clean_optional(Some("   ")), None);
        assert_eq!(clean_optional(Some(" x ")), Some("x".to_string()));
        assert_eq!(clean_optional(None), None);
    }

    #[test]
    fn coordinates_are_range_checked() {
        assert!(validate_coordinates(Some(47.0), Some(28.5)).is_ok());
        assert_eq!(
            validate_coordinates(Some(91.0), None),
            Err(ValidationError::LatitudeOutOfRange(91.0))
        );
        assert_eq!(
            validate_coordinates(None, Some(-181.0)),
            Err(ValidationError::LongitudeOutOfRange(-181.0))
        );
    }

    #[test]
    fn years_outside_window_are_rejected() {
        assert!(validate_year("year", 2019).is_ok());
        assert!(validate_year("year", 1799).is_err());
        assert!(validate_year("year", 2101).is_err());
    }
}
