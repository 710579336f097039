//! Tabular export of reports and search results.
//!
//! # Responsibility
//! - Turn report rows into a [`Table`] with the user-facing column headers.
//! - Write tables as CSV or XLSX to any writer or file path.
//!
//! # Invariants
//! - Header order is fixed per report kind.
//! - Missing values export as empty cells, never as `None`/`null` text.

mod csv_file;
mod tables;
mod xlsx_file;

pub use csv_file::{write_csv, write_csv_file};
pub use tables::{
    association_table, comparison_table, occurrence_table, search_hit_table, site_habitat_table,
};
pub use xlsx_file::{write_xlsx_file, xlsx_bytes};

use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::str::FromStr;
use std::time::Instant;

pub type ExportResult<T> = Result<T, ExportError>;

#[derive(Debug)]
pub enum ExportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Xlsx(rust_xlsxwriter::XlsxError),
    /// Table exceeds the addressable rows or columns of the target format.
    TooLarge { rows: usize, columns: usize },
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "export i/o failed: {err}"),
            Self::Csv(err) => write!(f, "csv export failed: {err}"),
            Self::Xlsx(err) => write!(f, "xlsx export failed: {err}"),
            Self::TooLarge { rows, columns } => {
                write!(f, "table of {rows} rows x {columns} columns is too large")
            }
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Csv(err) => Some(err),
            Self::Xlsx(err) => Some(err),
            Self::TooLarge { .. } => None,
        }
    }
}

impl From<std::io::Error> for ExportError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for ExportError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<rust_xlsxwriter::XlsxError> for ExportError {
    fn from(value: rust_xlsxwriter::XlsxError) -> Self {
        Self::Xlsx(value)
    }
}

/// One exported value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Int(i64),
    Float(f64),
    Empty,
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn optional_float(value: Option<f64>) -> Self {
        value.map_or(Self::Empty, Self::Float)
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(value) => f.write_str(value),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Empty => Ok(()),
        }
    }
}

/// Headers plus rows, ready for any writer.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Worksheet name for XLSX output.
    pub sheet_name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(sheet_name: impl Into<String>, headers: &[&str]) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            headers: headers.iter().map(|header| header.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" => Ok(Self::Xlsx),
            other => Err(format!("unsupported export format `{other}`; expected csv|xlsx")),
        }
    }
}

/// Writes `table` to `path` in `format`, logging duration and row count.
pub fn export_table(table: &Table, format: ExportFormat, path: &Path) -> ExportResult<()> {
    let started_at = Instant::now();
    let result = match format {
        ExportFormat::Csv => write_csv_file(table, path),
        ExportFormat::Xlsx => write_xlsx_file(table, path),
    };

    match &result {
        Ok(()) => info!(
            "event=export module=export status=ok format={} rows={} duration_ms={}",
            format.extension(),
            table.rows.len(),
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=export module=export status=error format={} rows={} duration_ms={} error={}",
            format.extension(),
            table.rows.len(),
            started_at.elapsed().as_millis(),
            err
        ),
    }
    result
}
