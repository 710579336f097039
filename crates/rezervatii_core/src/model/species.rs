//! Species domain model.
//!
//! # Responsibility
//! - Define the canonical species record and its conservation metadata.
//! - Normalize scientific names before persistence.
//!
//! # Invariants
//! - `scientific_name` is whitespace-collapsed, genus capitalized, 3..=200 chars.
//! - A Red Book category without an edition year implies the 2015 edition.
//! - `red_book_category` is one of the IUCN-style codes in [`RED_BOOK_CATEGORIES`].

use super::{validate_year, RecordId, ValidationError};
use serde::{Deserialize, Serialize};

/// Edition assumed when only a Red Book category is known.
pub const DEFAULT_RED_BOOK_YEAR: i32 = 2015;

/// Accepted Red Book category codes.
pub const RED_BOOK_CATEGORIES: &[&str] = &["CR", "EN", "VU", "NT", "LC", "DD", "EX", "EW"];

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Species {
    pub id: Option<RecordId>,
    pub scientific_name: String,
    pub popular_name: Option<String>,
    pub class_name: Option<String>,
    pub family: Option<String>,
    pub habitat: Option<String>,
    pub locality: Option<String>,
    pub is_forest: bool,
    pub is_grassland: bool,
    pub is_rocky: bool,
    pub is_wetland: bool,
    pub is_rare: bool,
    pub bern_convention: bool,
    pub habitats_directive: bool,
    pub red_book_year: Option<i32>,
    pub red_book_category: Option<String>,
    pub frequency: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

impl Species {
    /// Creates an unsaved species with a normalized scientific name.
    pub fn new(scientific_name: &str) -> Self {
        Self {
            scientific_name: normalize_scientific_name(scientific_name),
            ..Self::default()
        }
    }

    /// Applies write-time normalization rules in place.
    pub fn normalize(&mut self) {
        self.scientific_name = normalize_scientific_name(&self.scientific_name);
        self.red_book_category = self
            .red_book_category
            .as_deref()
            .map(|value| value.trim().to_ascii_uppercase())
            .filter(|value| !value.is_empty());
        if self.red_book_category.is_some() && self.red_book_year.is_none() {
            self.red_book_year = Some(DEFAULT_RED_BOOK_YEAR);
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let len = self.scientific_name.chars().count();
        if !(3..=200).contains(&len) {
            return Err(ValidationError::LengthOutOfRange {
                field: "scientific_name",
                min: 3,
                max: 200,
            });
        }
        if let Some(year) = self.red_book_year {
            validate_year("red_book_year", year)?;
        }
        if let Some(category) = self.red_book_category.as_deref() {
            if !RED_BOOK_CATEGORIES.contains(&category) {
                return Err(ValidationError::UnknownRedBookCategory(category.to_string()));
            }
        }
        Ok(())
    }
}

/// Collapses whitespace and capitalizes the genus (`"rosa  CANINA"` -> `"Rosa CANINA"`).
pub fn normalize_scientific_name(raw: &str) -> String {
    let mut parts = raw.split_whitespace();
    let Some(genus) = parts.next() else {
        return String::new();
    };

    let mut chars = genus.chars();
    let mut normalized: String = chars.next().map(char::to_uppercase).into_iter().flatten().collect();
    normalized.push_str(&chars.as_str().to_lowercase());
    for part in parts {
        normalized.push(' ');
        normalized.push_str(part);
    }
    normalized
}
