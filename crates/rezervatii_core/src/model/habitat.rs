//! Habitat model with bilingual names and an optional classification code.
//!
//! # Invariants
//! - `name_romanian` and `name_english` are each unique case-insensitively.
//! - Both names have at least 2 characters.

use super::{require_min_len, RecordId, ValidationError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Habitat {
    pub id: Option<RecordId>,
    pub name_romanian: String,
    pub name_english: String,
    pub code: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

impl Habitat {
    pub fn new(name_romanian: impl Into<String>, name_english: impl Into<String>) -> Self {
        Self {
            name_romanian: name_romanian.into().trim().to_string(),
            name_english: name_english.into().trim().to_string(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_min_len("name_romanian", &self.name_romanian, 2)?;
        require_min_len("name_english", &self.name_english, 2)
    }
}
