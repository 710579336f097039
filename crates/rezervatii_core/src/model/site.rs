//! Protected site model (Emerald/Natura-style site with species counts).
//!
//! # Invariants
//! - `code` is non-empty and unique case-insensitively.
//! - `name` is unique case-insensitively and has at least 2 characters.
//! - Counts are non-negative by type; `area_ha` is non-negative.

use super::{
    require_min_len, validate_coordinates, validate_non_negative, RecordId, ValidationError,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Site {
    pub id: Option<RecordId>,
    pub code: String,
    pub name: String,
    pub area_ha: f64,
    pub bird_species_count: u32,
    pub other_species_count: u32,
    pub habitats_count: u32,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub ste: bool,
    pub conj: bool,
    pub other_species: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

impl Site {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into().trim().to_string(),
            name: name.into().trim().to_string(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.code.trim().is_empty() {
            return Err(ValidationError::Required("code"));
        }
        require_min_len("name", &self.name, 2)?;
        validate_non_negative("area_ha", Some(self.area_ha))?;
        validate_coordinates(self.latitude, self.longitude)
    }
}
