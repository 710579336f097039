//! Presence of one species across reserves and years.
//!
//! # Invariants
//! - `years` is ascending and holds only years with at least one occurrence.
//! - Every [`PresenceRow::present`] has the same length as `years`.

use super::{ReportError, ReportResult};
use crate::model::species::Species;
use crate::model::RecordId;
use crate::repo::species_repo::{SpeciesRepository, SqliteSpeciesRepository};
use rusqlite::Connection;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesComparison {
    pub species: Species,
    pub years: Vec<i32>,
    pub rows: Vec<PresenceRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceRow {
    pub reserve: String,
    pub present: Vec<bool>,
}

/// Builds the reserve × year matrix for a species given by id or exact name.
pub fn compare_species(conn: &Connection, species: &str) -> ReportResult<SpeciesComparison> {
    let query = species.trim();
    if query.is_empty() {
        return Err(ReportError::MissingParameter("species"));
    }

    let repo = SqliteSpeciesRepository::new(conn);
    let found = match query.parse::<RecordId>() {
        Ok(id) => repo.get_species(id)?,
        Err(_) => repo.find_species_by_name(query)?,
    };
    let species = found.ok_or_else(|| ReportError::NotFound {
        entity: "species",
        query: query.to_string(),
    })?;
    let Some(species_id) = species.id else {
        return Err(ReportError::NotFound {
            entity: "species",
            query: query.to_string(),
        });
    };

    let mut stmt = conn.prepare(
        "SELECT r.name_key, r.name, o.year
         FROM occurrences o
         JOIN reserves r ON r.id = o.reserve_id
         WHERE o.species_id = ?1;",
    )?;
    let mapped = stmt.query_map([species_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i32>(2)?,
        ))
    })?;

    let mut by_reserve: BTreeMap<String, (String, Vec<i32>)> = BTreeMap::new();
    let mut all_years = Vec::new();
    for entry in mapped {
        let (key, name, year) = entry?;
        by_reserve
            .entry(key)
            .or_insert_with(|| (name, Vec::new()))
            .1
            .push(year);
        all_years.push(year);
    }
    all_years.sort_unstable();
    all_years.dedup();

    let rows = by_reserve
        .into_values()
        .map(|(reserve, years)| PresenceRow {
            present: all_years.iter().map(|year| years.contains(year)).collect(),
            reserve,
        })
        .collect();

    Ok(SpeciesComparison {
        species,
        years: all_years,
        rows,
    })
}
