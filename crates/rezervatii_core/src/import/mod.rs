//! Bulk CSV import for the catalog sheets.
//!
//! # Responsibility
//! - Read the field-survey CSV sheets (Romanian headers) into catalog records.
//! - Report created/updated/unchanged/skipped counts per run.
//!
//! # Invariants
//! - One import run is one immediate transaction; a storage failure rolls
//!   back the whole file.
//! - Rows failing validation or colliding with a unique key are skipped and
//!   logged with their line number; they never abort the run.
//! - A leading UTF-8 BOM is ignored.

pub mod coerce;
pub mod coords;

mod associations;
mod habitats;
mod reserves;
mod sites;
mod species;

pub use associations::{clean_association_name, import_associations};
pub use coords::parse_coordinates;
pub use habitats::import_habitats;
pub use reserves::import_reserves;
pub use sites::import_sites;
pub use species::import_species;

use crate::db::DbError;
use crate::repo::RepoError;
use csv::StringRecord;
use log::{error, info, warn};
use rusqlite::Connection;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::str::FromStr;
use std::time::Instant;

pub type ImportResult<T> = Result<T, ImportError>;

#[derive(Debug)]
pub enum ImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    /// Required header columns are absent, listed in sorted order.
    MissingColumns(Vec<String>),
    Repo(RepoError),
    Db(DbError),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "cannot read import file: {err}"),
            Self::Csv(err) => write!(f, "malformed csv: {err}"),
            Self::MissingColumns(columns) => {
                write!(f, "missing csv columns: {}", columns.join(", "))
            }
            Self::Repo(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Csv(err) => Some(err),
            Self::MissingColumns(_) => None,
            Self::Repo(err) => Some(err),
            Self::Db(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ImportError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for ImportError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<RepoError> for ImportError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for ImportError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Counters reported after an import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub created: usize,
    pub updated: usize,
    /// Rows matching an existing record with nothing new to write.
    pub unchanged: usize,
    pub skipped: usize,
    /// Rows repeating a name seen earlier in the same file.
    pub duplicates_in_file: usize,
}

impl Display for ImportSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "created={} updated={} unchanged={} skipped={} duplicates_in_file={}",
            self.created, self.updated, self.unchanged, self.skipped, self.duplicates_in_file
        )
    }
}

/// Outcome of one accepted row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Written {
    Created,
    Updated,
}

impl ImportSummary {
    fn record(&mut self, written: Written) {
        match written {
            Written::Created => self.created += 1,
            Written::Updated => self.updated += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Species,
    Reserves,
    Associations,
    Sites,
    Habitats,
}

impl ImportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Species => "species",
            Self::Reserves => "reserves",
            Self::Associations => "associations",
            Self::Sites => "sites",
            Self::Habitats => "habitats",
        }
    }
}

impl FromStr for ImportKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "species" => Ok(Self::Species),
            "reserve" | "reserves" => Ok(Self::Reserves),
            "association" | "associations" => Ok(Self::Associations),
            "site" | "sites" => Ok(Self::Sites),
            "habitat" | "habitats" => Ok(Self::Habitats),
            other => Err(format!(
                "unknown import kind `{other}`; expected species|reserves|associations|sites|habitats"
            )),
        }
    }
}

/// Runs the importer for `kind` on the CSV file at `path`.
pub fn import_csv(conn: &mut Connection, kind: ImportKind, path: &Path) -> ImportResult<ImportSummary> {
    let started_at = Instant::now();
    info!(
        "event=import module=import status=start kind={}",
        kind.as_str()
    );

    let result = CsvSheet::from_path(path).and_then(|sheet| match kind {
        ImportKind::Species => import_species(conn, &sheet),
        ImportKind::Reserves => import_reserves(conn, &sheet),
        ImportKind::Associations => import_associations(conn, &sheet),
        ImportKind::Sites => import_sites(conn, &sheet),
        ImportKind::Habitats => import_habitats(conn, &sheet),
    });

    match &result {
        Ok(summary) => info!(
            "event=import module=import status=ok kind={} {} duration_ms={}",
            kind.as_str(),
            summary,
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=import module=import status=error kind={} duration_ms={} error={}",
            kind.as_str(),
            started_at.elapsed().as_millis(),
            err
        ),
    }
    result
}

/// Parsed CSV file with header-name lookup.
#[derive(Debug, Clone)]
pub struct CsvSheet {
    headers: Vec<String>,
    records: Vec<StringRecord>,
}

impl CsvSheet {
    pub fn from_path(path: &Path) -> ImportResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_text(&content)
    }

    pub fn from_text(content: &str) -> ImportResult<Self> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_bytes());
        let headers = reader
            .headers()?
            .iter()
            .map(|header| header.trim().to_string())
            .collect();
        let records = reader.records().collect::<Result<Vec<_>, _>>()?;
        Ok(Self { headers, records })
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|header| header == column)
    }

    /// Errors with the sorted list of `required` columns this sheet lacks.
    pub fn require_columns(&self, required: &[&str]) -> ImportResult<()> {
        let mut missing: Vec<String> = required
            .iter()
            .filter(|column| !self.has_column(column))
            .map(|column| column.to_string())
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort();
        Err(ImportError::MissingColumns(missing))
    }

    /// Data rows paired with their 1-based file line (header is line 1).
    pub fn rows(&self) -> impl Iterator<Item = (usize, &StringRecord)> {
        self.records
            .iter()
            .enumerate()
            .map(|(index, record)| (index + 2, record))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Raw cell under `column`, `None` when the column or cell is absent.
    pub fn cell<'a>(&self, record: &'a StringRecord, column: &str) -> Option<&'a str> {
        let index = self.headers.iter().position(|header| header == column)?;
        record.get(index)
    }

    /// Trimmed non-blank cell text.
    pub fn text(&self, record: &StringRecord, column: &str) -> Option<String> {
        coerce::text(self.cell(record, column))
    }
}

/// Splits a write failure into "skip this row" and "abort the run".
fn skip_or_abort(
    err: RepoError,
    kind: &str,
    line: usize,
    summary: &mut ImportSummary,
) -> ImportResult<()> {
    match err {
        RepoError::Validation(_) | RepoError::Duplicate { .. } => {
            warn!(
                "event=import_row module=import status=skipped kind={kind} line={line} error={err}"
            );
            summary.skipped += 1;
            Ok(())
        }
        other => Err(other.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::{CsvSheet, ImportError, ImportKind};

    #[test]
    fn bom_is_stripped_from_first_header() {
        let sheet = CsvSheet::from_text("\u{feff}Denumirea,Raion\nCodrii,Strășeni\n").expect("sheet with BOM should parse");
        assert!(sheet.has_column("Denumirea"));
        let (line, record) = sheet.rows().next().expect("one data row");
        assert_eq!(line, 2);
        assert_eq!(sheet.text(record, "Raion").as_deref(), Some("Strășeni"));
        assert_eq!(sheet.cell(record, "Absent"), None);
    }

    #[test]
    fn missing_columns_are_sorted() {
        let sheet = CsvSheet::from_text("denumirea\nX\n").expect("sheet should parse");
        match sheet.require_columns(&["longitudine", "codul_sitului", "denumirea"]) {
            Err(ImportError::MissingColumns(columns)) => {
                assert_eq!(columns, vec!["codul_sitului", "longitudine"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn kinds_parse_singular_and_plural() {
        assert_eq!("Site".parse::<ImportKind>(), Ok(ImportKind::Sites));
        assert_eq!("habitats".parse::<ImportKind>(), Ok(ImportKind::Habitats));
        assert!("plants".parse::<ImportKind>().is_err());
    }
}
