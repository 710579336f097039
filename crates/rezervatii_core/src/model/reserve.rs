//! Reserve domain model.
//!
//! # Invariants
//! - `name` is unique case-insensitively and has at least 2 characters.
//! - `latitude`/`longitude` stay within WGS84 ranges when set.
//! - `coords_raw` keeps the original coordinate text from imports.

use super::{
    require_min_len, validate_coordinates, validate_non_negative, RecordId, ValidationError,
};
use serde::{Deserialize, Serialize};

/// Protected natural area where species and associations are recorded.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Reserve {
    pub id: Option<RecordId>,
    pub name: String,
    /// Administrative district.
    pub raion: Option<String>,
    pub location: Option<String>,
    pub owner: Option<String>,
    pub area_ha: Option<f64>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub description: Option<String>,
    pub phytocenotic_diversity: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub coords_raw: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

impl Reserve {
    /// Creates an unsaved reserve with only its name set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_min_len("name", &self.name, 2)?;
        validate_non_negative("area_ha", self.area_ha)?;
        validate_coordinates(self.latitude, self.longitude)
    }
}
