//! Core records logic for the nature-reserve catalog.
//! This crate is the single source of truth for catalog invariants: storage,
//! tolerant search, year-indexed reports, import and export.

pub mod access;
pub mod config;
pub mod db;
pub mod export;
pub mod import;
pub mod logging;
pub mod model;
pub mod report;
pub mod repo;
pub mod search;
pub mod service;

pub use access::{authorize, AccessError, Action, RecordKind, Role, UserAccount};
pub use config::{AppConfig, ConfigError, SearchBackend, SearchConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use export::{export_table, ExportError, ExportFormat, Table};
pub use import::{import_csv, ImportError, ImportKind, ImportSummary};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::{RecordId, ValidationError};
pub use report::{Report, ReportError, ReportResult};
pub use repo::{ListQuery, RepoError, RepoResult};
pub use search::{
    search_catalog, EntityKind, Page, PageRequest, SearchError, SearchHit, SearchResult,
};
pub use service::{NewOccurrence, OccurrenceService, ServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
