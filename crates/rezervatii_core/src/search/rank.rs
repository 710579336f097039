//! In-process tolerant ranking.
//!
//! # Responsibility
//! - Score candidates against a query with accent folding, sequence ratio
//!   and a containment bonus.
//! - Filter by an inclusive threshold and order deterministically.
//!
//! # Invariants
//! - Blank queries skip scoring and keep every candidate, alphabetical.
//! - A missing or blank field contributes nothing and never panics.
//! - Ties resolve by folded primary name, then by raw primary name.

use super::normalize::Normalizer;
use super::ratio::sequence_ratio;
use std::cmp::Ordering;

/// Record exposing its searchable text structurally.
pub trait Searchable {
    /// Display name used for default ordering and tie-breaks.
    fn primary_name(&self) -> &str;
    /// Up to a handful of optional fields; `None` is skipped.
    fn search_fields(&self) -> Vec<Option<&str>>;
}

/// Tuning knobs for [`rank_candidates`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankOptions {
    /// Minimum total score kept (inclusive).
    pub ratio_threshold: f64,
    /// Added to a field score when the folded query is a substring of it.
    pub containment_bonus: f64,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            ratio_threshold: 0.55,
            containment_bonus: 0.15,
        }
    }
}

/// Candidate paired with its score; `None` when no scoring happened.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked<T> {
    pub record: T,
    pub score: Option<f64>,
}

/// Scores one record against an already folded query.
///
/// Returns the best field score: sequence ratio plus the containment bonus
/// when the query occurs inside that field.
pub fn score_record<T, N>(folded_query: &str, record: &T, normalizer: &N, bonus: f64) -> f64
where
    T: Searchable,
    N: Normalizer + ?Sized,
{
    record
        .search_fields()
        .into_iter()
        .flatten()
        .map(|field| normalizer.normalize(field))
        .filter(|field| !field.is_empty())
        .map(|field| {
            let mut score = sequence_ratio(folded_query, &field);
            if field.contains(folded_query) {
                score += bonus.max(0.0);
            }
            score
        })
        .fold(0.0, f64::max)
}

/// Ranks `candidates` for `query`, best first.
pub fn rank_candidates<T, N>(
    query: &str,
    candidates: Vec<T>,
    normalizer: &N,
    options: &RankOptions,
) -> Vec<Ranked<T>>
where
    T: Searchable,
    N: Normalizer + ?Sized,
{
    let folded_query = normalizer.normalize(query);

    let mut keyed = candidates
        .into_iter()
        .map(|record| {
            let sort_key = normalizer.normalize(record.primary_name());
            (sort_key, record)
        })
        .collect::<Vec<_>>();

    if folded_query.is_empty() {
        keyed.sort_by(|(left_key, left), (right_key, right)| {
            by_name(left_key, left, right_key, right)
        });
        return keyed
            .into_iter()
            .map(|(_, record)| Ranked {
                record,
                score: None,
            })
            .collect();
    }

    let mut scored = keyed
        .into_iter()
        .filter_map(|(sort_key, record)| {
            let score = score_record(
                &folded_query,
                &record,
                normalizer,
                options.containment_bonus,
            );
            (score >= options.ratio_threshold).then_some((score, sort_key, record))
        })
        .collect::<Vec<_>>();

    scored.sort_by(|(left_score, left_key, left), (right_score, right_key, right)| {
        right_score
            .total_cmp(left_score)
            .then_with(|| by_name(left_key, left, right_key, right))
    });

    scored
        .into_iter()
        .map(|(score, _, record)| Ranked {
            record,
            score: Some(score),
        })
        .collect()
}

fn by_name<T: Searchable>(left_key: &str, left: &T, right_key: &str, right: &T) -> Ordering {
    left_key
        .cmp(right_key)
        .then_with(|| left.primary_name().cmp(right.primary_name()))
}
