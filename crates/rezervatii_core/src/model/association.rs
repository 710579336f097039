//! Plant association (phytocoenosis) model.

use super::{require_min_len, RecordId, ValidationError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Association {
    pub id: Option<RecordId>,
    /// Unique case-insensitively, at least 2 characters.
    pub name: String,
    pub notes: Option<String>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

impl Association {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_min_len("name", &self.name, 2)
    }
}
