//! Trigram similarity and the SQLite functions backing accelerated search.
//!
//! # Responsibility
//! - Compute word-padded trigram similarity and word similarity.
//! - Register `rz_unaccent`, `rz_similarity`, `rz_word_similarity` on a
//!   connection so ranking can run inside the query.
//!
//! # Invariants
//! - Words are runs of alphanumeric chars, padded as `"  word "`.
//! - `NULL` or trigram-less inputs score `0.0`, never an error.
//! - Registered functions are deterministic and side-effect free.

use super::normalize::normalize;
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;
use std::collections::{BTreeSet, HashMap};

/// SQL name of the accent-folding function.
pub const SQL_UNACCENT: &str = "rz_unaccent";
/// SQL name of the trigram similarity function.
pub const SQL_SIMILARITY: &str = "rz_similarity";
/// SQL name of the word similarity function.
pub const SQL_WORD_SIMILARITY: &str = "rz_word_similarity";

/// Ordered trigrams of every word in `text`, duplicates kept.
fn ordered_trigrams(text: &str) -> Vec<String> {
    let mut trigrams = Vec::new();
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
    {
        let padded = format!("  {word} ").chars().collect::<Vec<_>>();
        for window in padded.windows(3) {
            trigrams.push(window.iter().collect::<String>());
        }
    }
    trigrams
}

/// Distinct trigrams of `text`.
pub fn trigrams(text: &str) -> BTreeSet<String> {
    ordered_trigrams(text).into_iter().collect()
}

/// Shared trigrams over the union of both sets, in `[0, 1]`.
pub fn trigram_similarity(a: &str, b: &str) -> f64 {
    let left = trigrams(a);
    let right = trigrams(b);
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let shared = left.intersection(&right).count();
    let union = left.len() + right.len() - shared;
    shared as f64 / union as f64
}

/// Best similarity between the trigrams of `query` and any contiguous extent
/// of the ordered trigrams of `target`.
///
/// Rewards a short query that matches one word or word prefix of a longer
/// target, e.g. `word_similarity("word", "two words") == 0.8`.
pub fn word_similarity(query: &str, target: &str) -> f64 {
    let query_set = trigrams(query);
    let target_list = ordered_trigrams(target);
    if query_set.is_empty() || target_list.is_empty() {
        return 0.0;
    }

    let mut best = 0.0_f64;
    for start in 0..target_list.len() {
        if !query_set.contains(&target_list[start]) {
            continue;
        }
        let mut seen: HashMap<&str, ()> = HashMap::new();
        let mut shared = 0usize;
        let mut extra = 0usize;
        for trigram in &target_list[start..] {
            if seen.insert(trigram.as_str(), ()).is_none() {
                if query_set.contains(trigram) {
                    shared += 1;
                } else {
                    extra += 1;
                }
            }
            if query_set.contains(trigram) {
                let score = shared as f64 / (query_set.len() + extra) as f64;
                best = best.max(score);
            }
        }
    }
    best
}

/// Registers the accent-folding and trigram functions on `conn`.
pub fn register_search_functions(conn: &Connection) -> rusqlite::Result<()> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;

    conn.create_scalar_function(SQL_UNACCENT, 1, flags, |ctx| {
        let value: Option<String> = ctx.get(0)?;
        Ok(value.map(|value| normalize(&value)))
    })?;
    conn.create_scalar_function(SQL_SIMILARITY, 2, flags, |ctx| {
        let left: Option<String> = ctx.get(0)?;
        let right: Option<String> = ctx.get(1)?;
        Ok(match (left, right) {
            (Some(left), Some(right)) => trigram_similarity(&left, &right),
            _ => 0.0,
        })
    })?;
    conn.create_scalar_function(SQL_WORD_SIMILARITY, 2, flags, |ctx| {
        let query: Option<String> = ctx.get(0)?;
        let target: Option<String> = ctx.get(1)?;
        Ok(match (query, target) {
            (Some(query), Some(target)) => word_similarity(&query, &target),
            _ => 0.0,
        })
    })?;

    Ok(())
}

/// Returns whether `conn` exposes the search functions.
pub fn search_functions_available(conn: &Connection) -> bool {
    conn.query_row(
        &format!("SELECT {SQL_SIMILARITY}('ab', {SQL_UNACCENT}('ab'));"),
        [],
        |row| row.get::<_, f64>(0),
    )
    .is_ok()
}

#[cfg(test)]
mod tests {
    use super::{
        register_search_functions, search_functions_available, trigram_similarity, trigrams,
        word_similarity,
    };
    use rusqlite::Connection;

    #[test]
    fn words_are_padded_before_splitting() {
        let set = trigrams("cat");
        let expected = ["  c", " ca", "cat", "at "];
        assert_eq!(set.len(), expected.len());
        for trigram in expected {
            assert!(set.contains(trigram), "missing `{trigram}`");
        }
    }

    #[test]
    fn similarity_is_shared_over_union() {
        assert!((trigram_similarity("word", "two words") - 4.0 / 11.0).abs() < 1e-12);
        assert_eq!(trigram_similarity("rosa", "rosa"), 1.0);
        assert_eq!(trigram_similarity("", "rosa"), 0.0);
    }

    #[test]
    fn word_similarity_prefers_best_extent() {
        assert!((word_similarity("word", "two words") - 0.8).abs() < 1e-12);
        assert_eq!(word_similarity("codrii", "rezervatia codrii"), 1.0);
        assert_eq!(word_similarity("xyz", "codrii"), 0.0);
    }

    #[test]
    fn sql_functions_fold_and_score() {
        let conn = Connection::open_in_memory().expect("in-memory connection");
        assert!(!search_functions_available(&conn));

        register_search_functions(&conn).expect("register search functions");
        assert!(search_functions_available(&conn));

        let folded: String = conn
            .query_row("SELECT rz_unaccent('Pădurea  Seacă');", [], |row| row.get(0))
            .expect("rz_unaccent query");
        assert_eq!(folded, "padurea seaca");

        let null_score: f64 = conn
            .query_row("SELECT rz_similarity('rosa', NULL);", [], |row| row.get(0))
            .expect("rz_similarity query");
        assert_eq!(null_score, 0.0);
    }
}
