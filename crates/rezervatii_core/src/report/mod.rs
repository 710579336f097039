//! Filter reports over the year-indexed link tables.
//!
//! # Responsibility
//! - Run the association, occurrence and site-habitat filters.
//! - Resolve user-typed reserve references and list lookup values.
//! - Compare one species across reserves and years.
//!
//! # Invariants
//! - Missing or malformed filter inputs produce a [`Report`] carrying a
//!   user-facing message and no rows; they never produce an error.
//! - Name filters are exact and case-insensitive.

pub mod associations;
pub mod compare;
pub mod occurrences;
pub mod site_habitats;

use crate::db::DbError;
use crate::model::reserve::Reserve;
use crate::model::{name_key, RecordId};
use crate::repo::reserve_repo::{parse_reserve_row, ReserveRepository, SqliteReserveRepository};
use crate::repo::RepoError;
use rusqlite::{Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use associations::{filter_associations, AssociationFilter, AssociationMode, AssociationRow};
pub use compare::{compare_species, PresenceRow, SpeciesComparison};
pub use occurrences::{filter_occurrences, OccurrenceFilter, OccurrenceMode, OccurrenceRow};
pub use site_habitats::{
    filter_site_habitats, SiteHabitatFilter, SiteHabitatMode, SiteHabitatRow,
};

pub type ReportResult<T> = Result<T, ReportError>;

#[derive(Debug)]
pub enum ReportError {
    Db(DbError),
    Repo(RepoError),
    /// Required lookup input is blank.
    MissingParameter(&'static str),
    /// Lookup input does not match any record.
    NotFound { entity: &'static str, query: String },
}

impl Display for ReportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::MissingParameter(name) => write!(f, "missing parameter `{name}`"),
            Self::NotFound { entity, query } => write!(f, "no {entity} matches `{query}`"),
        }
    }
}

impl Error for ReportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::MissingParameter(_) | Self::NotFound { .. } => None,
        }
    }
}

impl From<DbError> for ReportError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for ReportError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<RepoError> for ReportError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Filter output: rows, or a message explaining which input is missing.
#[derive(Debug, Clone, PartialEq)]
pub struct Report<R> {
    pub rows: Vec<R>,
    pub message: Option<String>,
    /// Set when rows were cut at the configured cap.
    pub truncated: bool,
}

impl<R> Report<R> {
    pub fn rows(rows: Vec<R>) -> Self {
        Self {
            rows,
            message: None,
            truncated: false,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            rows: Vec::new(),
            message: Some(message.into()),
            truncated: false,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.message.is_none()
    }
}

/// Parses a year typed by a user; only plain digits count.
pub(crate) fn parse_year_param(value: &str) -> Option<i32> {
    let value = value.trim();
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// Resolves a reserve from an id, an exact name, or a name fragment.
///
/// Numeric input is an id. Otherwise an exact case-insensitive name wins,
/// then the alphabetically first reserve whose name contains the input.
pub fn resolve_reserve(conn: &Connection, input: &str) -> ReportResult<Reserve> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ReportError::MissingParameter("reserve"));
    }
    let not_found = || ReportError::NotFound {
        entity: "reserve",
        query: input.to_string(),
    };

    let repo = SqliteReserveRepository::new(conn);
    if input.chars().all(|c| c.is_ascii_digit()) {
        let id: RecordId = input.parse().map_err(|_| not_found())?;
        return repo.get_reserve(id)?.ok_or_else(not_found);
    }

    if let Some(reserve) = repo.find_reserve_by_name(input)? {
        return Ok(reserve);
    }

    let partial = conn
        .query_row(
            "SELECT
                id, name, raion, location, owner, area_ha, category, subcategory,
                description, phytocenotic_diversity, latitude, longitude, coords_raw,
                notes, created_at, updated_at
             FROM reserves
             WHERE instr(name_key, ?1) > 0
             ORDER BY name_key ASC, id ASC
             LIMIT 1;",
            [name_key(input)],
            |row| Ok(parse_reserve_row(row)),
        )
        .optional()?;
    match partial {
        Some(reserve) => Ok(reserve?),
        None => Err(not_found()),
    }
}

/// Every reserve name, alphabetical.
pub fn reserve_names(conn: &Connection) -> ReportResult<Vec<String>> {
    collect_strings(conn, "SELECT name FROM reserves ORDER BY name_key ASC, id ASC;")
}

/// Distinct non-blank districts, alphabetical.
pub fn raions(conn: &Connection) -> ReportResult<Vec<String>> {
    collect_strings(
        conn,
        "SELECT DISTINCT trim(raion) AS raion
         FROM reserves
         WHERE raion IS NOT NULL AND trim(raion) <> ''
         ORDER BY raion ASC;",
    )
}

pub fn site_names(conn: &Connection) -> ReportResult<Vec<String>> {
    collect_strings(conn, "SELECT name FROM sites ORDER BY name_key ASC, id ASC;")
}

pub fn habitat_names(conn: &Connection) -> ReportResult<Vec<String>> {
    collect_strings(
        conn,
        "SELECT name_romanian FROM habitats ORDER BY name_romanian_key ASC, name_english_key ASC;",
    )
}

fn collect_strings(conn: &Connection, sql: &str) -> ReportResult<Vec<String>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    let mut values = Vec::new();
    for value in rows {
        values.push(value?);
    }
    Ok(values)
}
