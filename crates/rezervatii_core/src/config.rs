//! Layered application configuration.
//!
//! # Responsibility
//! - Merge built-in defaults, an optional TOML file and `REZERVATII_*`
//!   environment variables into one [`AppConfig`].
//! - Reject values that would make search or pagination meaningless.
//!
//! # Invariants
//! - Precedence, highest first: environment, TOML file, defaults.
//! - `__` separates nested sections in environment keys, so
//!   `REZERVATII_SEARCH__TRIGRAM__SPECIES` maps to `search.trigram.species`.

use crate::search::EntityKind;
use crate::search::RankOptions;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "rezervatii.toml";
/// Environment variable prefix.
pub const ENV_PREFIX: &str = "REZERVATII_";

#[derive(Debug)]
pub enum ConfigError {
    Figment(figment::Error),
    Invalid { field: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Figment(err) => write!(f, "configuration error: {err}"),
            Self::Invalid { field, reason } => {
                write!(f, "invalid configuration value for `{field}`: {reason}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Figment(err) => Some(err),
            Self::Invalid { .. } => None,
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(value: figment::Error) -> Self {
        Self::Figment(value)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub reports: ReportsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("rezervatii.sqlite3"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Falls back to [`crate::default_log_level`] when unset.
    pub level: Option<String>,
    /// File logging stays off when unset.
    pub dir: Option<PathBuf>,
}

/// Where similarity scoring runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchBackend {
    /// Trigram SQL functions when the connection has them, in-process otherwise.
    #[default]
    Auto,
    Trigram,
    InProcess,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub ratio_threshold: f64,
    pub containment_bonus: f64,
    /// Upper bound of rows loaded for in-process scoring.
    pub candidate_cap: u32,
    pub default_per_page: u32,
    pub max_per_page: u32,
    pub backend: SearchBackend,
    pub trigram: TrigramThresholds,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            ratio_threshold: 0.55,
            containment_bonus: 0.15,
            candidate_cap: 5000,
            default_per_page: 25,
            max_per_page: 100,
            backend: SearchBackend::Auto,
            trigram: TrigramThresholds::default(),
        }
    }
}

impl SearchConfig {
    pub fn rank_options(&self) -> RankOptions {
        RankOptions {
            ratio_threshold: self.ratio_threshold,
            containment_bonus: self.containment_bonus,
        }
    }

    pub fn trigram_threshold(&self, kind: EntityKind) -> f64 {
        match kind {
            EntityKind::Species => self.trigram.species,
            EntityKind::Reserves => self.trigram.reserves,
            EntityKind::Associations => self.trigram.associations,
            EntityKind::Sites => self.trigram.sites,
            EntityKind::Habitats => self.trigram.habitats,
        }
    }
}

/// Minimum trigram score per entity kind (inclusive).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrigramThresholds {
    pub species: f64,
    pub reserves: f64,
    pub associations: f64,
    pub sites: f64,
    pub habitats: f64,
}

impl Default for TrigramThresholds {
    fn default() -> Self {
        Self {
            species: 0.25,
            reserves: 0.25,
            associations: 0.20,
            sites: 0.16,
            habitats: 0.16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportsConfig {
    /// Maximum rows returned by occurrence filters.
    pub row_cap: u32,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self { row_cap: 2000 }
    }
}

impl AppConfig {
    /// Loads defaults, `rezervatii.toml` from the working directory when it
    /// exists, then the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Like [`AppConfig::load`] but reads `path` instead of the default file.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(path).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Provider chain, public so tests and callers can add layers.
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        match path {
            Some(path) => figment = figment.merge(Toml::file(path)),
            None => {
                let local = PathBuf::from(DEFAULT_CONFIG_FILE);
                if local.exists() {
                    figment = figment.merge(Toml::file(local));
                }
            }
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let search = &self.search;
        let unit_fields = [
            ("search.ratio_threshold", search.ratio_threshold),
            ("search.trigram.species", search.trigram.species),
            ("search.trigram.reserves", search.trigram.reserves),
            ("search.trigram.associations", search.trigram.associations),
            ("search.trigram.sites", search.trigram.sites),
            ("search.trigram.habitats", search.trigram.habitats),
        ];
        for (field, value) in unit_fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("{value} is outside [0, 1]"),
                });
            }
        }
        if search.containment_bonus < 0.0 {
            return Err(ConfigError::Invalid {
                field: "search.containment_bonus",
                reason: "must not be negative".to_string(),
            });
        }

        let positive_fields = [
            ("search.candidate_cap", search.candidate_cap),
            ("search.default_per_page", search.default_per_page),
            ("search.max_per_page", search.max_per_page),
            ("reports.row_cap", self.reports.row_cap),
        ];
        for (field, value) in positive_fields {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        if search.default_per_page > search.max_per_page {
            return Err(ConfigError::Invalid {
                field: "search.default_per_page",
                reason: format!(
                    "{} exceeds search.max_per_page {}",
                    search.default_per_page, search.max_per_page
                ),
            });
        }

        Ok(())
    }
}
