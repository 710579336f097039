//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define per-entity data access contracts.
//! - Isolate SQLite query details from services, importers and reports.
//!
//! # Invariants
//! - Write paths call the record's `validate()` before SQL mutations.
//! - Unique-key violations surface as [`RepoError::Duplicate`], not raw
//!   SQLite errors.
//! - Read paths reject invalid persisted state instead of masking it.

pub mod association_repo;
pub mod habitat_repo;
pub mod link_repo;
pub mod occurrence_repo;
pub mod reserve_repo;
pub mod site_repo;
pub mod species_repo;

use crate::db::DbError;
use crate::model::{RecordId, ValidationError};
use rusqlite::ffi;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by every entity.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    NotFound { entity: &'static str, id: RecordId },
    /// A case-insensitive unique key (name, code or per-year link) already exists.
    Duplicate { entity: &'static str, key: String },
    /// Write targets a record that has not been persisted yet.
    MissingId(&'static str),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Duplicate { entity, key } => write!(f, "{entity} `{key}` already exists"),
            Self::MissingId(entity) => write!(f, "{entity} has no id; create it first"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. }
            | Self::Duplicate { .. }
            | Self::MissingId(_)
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Pagination options for `list_*` calls. Lists are alphabetical.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub limit: Option<u32>,
    pub offset: u32,
}

impl ListQuery {
    pub fn page(limit: u32, offset: u32) -> Self {
        Self {
            limit: Some(limit),
            offset,
        }
    }

    pub(crate) fn sql_suffix(&self) -> String {
        match (self.limit, self.offset) {
            (Some(limit), 0) => format!(" LIMIT {limit}"),
            (Some(limit), offset) => format!(" LIMIT {limit} OFFSET {offset}"),
            (None, 0) => String::new(),
            (None, offset) => format!(" LIMIT -1 OFFSET {offset}"),
        }
    }
}

/// Maps unique-constraint failures to [`RepoError::Duplicate`].
pub(crate) fn map_write_error(err: rusqlite::Error, entity: &'static str, key: &str) -> RepoError {
    if is_unique_violation(&err) {
        return RepoError::Duplicate {
            entity,
            key: key.to_string(),
        };
    }
    err.into()
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

pub(crate) fn require_id(id: Option<RecordId>, entity: &'static str) -> RepoResult<RecordId> {
    id.ok_or(RepoError::MissingId(entity))
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::ListQuery;

    #[test]
    fn list_query_renders_limit_and_offset() {
        assert_eq!(ListQuery::default().sql_suffix(), "");
        assert_eq!(ListQuery::page(10, 0).sql_suffix(), " LIMIT 10");
        assert_eq!(ListQuery::page(10, 20).sql_suffix(), " LIMIT 10 OFFSET 20");
        let offset_only = ListQuery {
            limit: None,
            offset: 5,
        };
        assert_eq!(offset_only.sql_suffix(), " LIMIT -1 OFFSET 5");
    }
}
