//! Time-indexed link records between catalog entities.
//!
//! # Invariants
//! - Each link is unique per `(left, right, year)` pair.
//! - `year` is within `MIN_YEAR..=MAX_YEAR`.

use super::{validate_coordinates, validate_non_negative, validate_year, RecordId, ValidationError};
use serde::{Deserialize, Serialize};

/// Observation of a species in a reserve during one year.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Occurrence {
    pub id: Option<RecordId>,
    pub species_id: RecordId,
    pub reserve_id: RecordId,
    pub year: i32,
    /// Rarity at observation time.
    pub is_rare: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// E.g. `teren`, `literatura`, `raport`.
    pub source: Option<String>,
    pub observer: Option<String>,
    pub created_by: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<i64>,
}

impl Occurrence {
    pub fn new(species_id: RecordId, reserve_id: RecordId, year: i32) -> Self {
        Self {
            species_id,
            reserve_id,
            year,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_year("year", self.year)?;
        validate_coordinates(self.latitude, self.longitude)
    }
}

/// Association recorded in a reserve during one year.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReserveAssociationYear {
    pub id: Option<RecordId>,
    pub association_id: RecordId,
    pub reserve_id: RecordId,
    pub year: i32,
    pub notes: Option<String>,
    pub created_at: Option<i64>,
}

impl ReserveAssociationYear {
    pub fn new(association_id: RecordId, reserve_id: RecordId, year: i32) -> Self {
        Self {
            association_id,
            reserve_id,
            year,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_year("year", self.year)
    }
}

/// Habitat present on a site during one year.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SiteHabitat {
    pub id: Option<RecordId>,
    pub site_id: RecordId,
    pub habitat_id: RecordId,
    pub year: i32,
    /// Surface covered by the habitat, in hectares.
    pub surface: Option<f64>,
    pub notes: Option<String>,
    pub created_at: Option<i64>,
}

impl SiteHabitat {
    pub fn new(site_id: RecordId, habitat_id: RecordId, year: i32) -> Self {
        Self {
            site_id,
            habitat_id,
            year,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_year("year", self.year)?;
        validate_non_negative("surface", self.surface)
    }
}

#[cfg(test)]
mod tests {
    use super::{Occurrence, SiteHabitat};

    #[test]
    fn occurrence_rejects_bad_year_and_coordinates() {
        assert!(Occurrence::new(1, 1, 1700).validate().is_err());
        let mut occurrence = Occurrence::new(1, 1, 2019);
        occurrence.latitude = Some(120.0);
        assert!(occurrence.validate().is_err());
        occurrence.latitude = Some(47.1);
        assert!(occurrence.validate().is_ok());
    }

    #[test]
    fn site_habitat_rejects_negative_surface() {
        let mut link = SiteHabitat::new(1, 2, 2020);
        link.surface = Some(-0.5);
        assert!(link.validate().is_err());
    }
}
