//! Tolerant search over catalog records.
//!
//! # Responsibility
//! - Fold accents and case before any comparison.
//! - Rank candidates in-process, or push scoring into SQLite through the
//!   registered trigram functions.
//! - Keep result shaping and pagination inside core.

pub mod catalog;
pub mod normalize;
pub mod page;
pub mod rank;
pub mod ratio;
pub mod trigram;

pub use catalog::{
    scoring_path, search_catalog, EntityKind, ScoringPath, SearchError, SearchHit, SearchResult,
};
pub use normalize::{normalize, AccentFolding, Normalizer};
pub use page::{paginate, Page, PageRequest};
pub use rank::{rank_candidates, score_record, RankOptions, Ranked, Searchable};
pub use ratio::sequence_ratio;
pub use trigram::{
    register_search_functions, search_functions_available, trigram_similarity, word_similarity,
};
