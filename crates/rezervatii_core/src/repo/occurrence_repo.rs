//! Occurrence repository contracts and SQLite implementation.
//!
//! # Invariants
//! - At most one occurrence per `(species, reserve, year)`.
//! - Unknown species or reserve ids fail on the foreign key, not silently.

use super::{bool_to_int, int_to_bool, map_write_error, require_id, RepoError, RepoResult};
use crate::model::links::Occurrence;
use crate::model::RecordId;
use rusqlite::{params, Connection, OptionalExtension, Row};

const ENTITY: &str = "occurrence";

const OCCURRENCE_SELECT_SQL: &str = "SELECT
    id,
    species_id,
    reserve_id,
    year,
    is_rare,
    latitude,
    longitude,
    source,
    observer,
    created_by,
    notes,
    created_at
FROM occurrences";

pub trait OccurrenceRepository {
    fn create_occurrence(&self, occurrence: &Occurrence) -> RepoResult<RecordId>;
    fn update_occurrence(&self, occurrence: &Occurrence) -> RepoResult<()>;
    fn get_occurrence(&self, id: RecordId) -> RepoResult<Option<Occurrence>>;
    fn delete_occurrence(&self, id: RecordId) -> RepoResult<()>;
    /// Occurrences of one species, newest year first.
    fn list_occurrences_for_species(&self, species_id: RecordId) -> RepoResult<Vec<Occurrence>>;
    fn occurrence_exists(
        &self,
        species_id: RecordId,
        reserve_id: RecordId,
        year: i32,
    ) -> RepoResult<bool>;
}

pub struct SqliteOccurrenceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOccurrenceRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

fn duplicate_key(occurrence: &Occurrence) -> String {
    format!(
        "species={} reserve={} year={}",
        occurrence.species_id, occurrence.reserve_id, occurrence.year
    )
}

impl OccurrenceRepository for SqliteOccurrenceRepository<'_> {
    fn create_occurrence(&self, occurrence: &Occurrence) -> RepoResult<RecordId> {
        occurrence.validate()?;

        self.conn
            .execute(
                "INSERT INTO occurrences (
                    species_id,
                    reserve_id,
                    year,
                    is_rare,
                    latitude,
                    longitude,
                    source,
                    observer,
                    created_by,
                    notes
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
                params![
                    occurrence.species_id,
                    occurrence.reserve_id,
                    occurrence.year,
                    bool_to_int(occurrence.is_rare),
                    occurrence.latitude,
                    occurrence.longitude,
                    occurrence.source.as_deref(),
                    occurrence.observer.as_deref(),
                    occurrence.created_by.as_deref(),
                    occurrence.notes.as_deref(),
                ],
            )
            .map_err(|err| map_write_error(err, ENTITY, &duplicate_key(occurrence)))?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update_occurrence(&self, occurrence: &Occurrence) -> RepoResult<()> {
        let id = require_id(occurrence.id, ENTITY)?;
        occurrence.validate()?;

        let changed = self
            .conn
            .execute(
                "UPDATE occurrences
                 SET
                    species_id = ?1,
                    reserve_id = ?2,
                    year = ?3,
                    is_rare = ?4,
                    latitude = ?5,
                    longitude = ?6,
                    source = ?7,
                    observer = ?8,
                    notes = ?9
                 WHERE id = ?10;",
                params![
                    occurrence.species_id,
                    occurrence.reserve_id,
                    occurrence.year,
                    bool_to_int(occurrence.is_rare),
                    occurrence.latitude,
                    occurrence.longitude,
                    occurrence.source.as_deref(),
                    occurrence.observer.as_deref(),
                    occurrence.notes.as_deref(),
                    id,
                ],
            )
            .map_err(|err| map_write_error(err, ENTITY, &duplicate_key(occurrence)))?;

        if changed == 0 {
            return Err(RepoError::NotFound { entity: ENTITY, id });
        }
        Ok(())
    }

    fn get_occurrence(&self, id: RecordId) -> RepoResult<Option<Occurrence>> {
        let occurrence = self
            .conn
            .query_row(
                &format!("{OCCURRENCE_SELECT_SQL} WHERE id = ?1;"),
                [id],
                |row| Ok(parse_occurrence_row(row)),
            )
            .optional()?;
        occurrence.transpose()
    }

    fn delete_occurrence(&self, id: RecordId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM occurrences WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: ENTITY, id });
        }
        Ok(())
    }

    fn list_occurrences_for_species(&self, species_id: RecordId) -> RepoResult<Vec<Occurrence>> {
        let mut stmt = self.conn.prepare(&format!(
            "{OCCURRENCE_SELECT_SQL} WHERE species_id = ?1 ORDER BY year DESC, reserve_id ASC;"
        ))?;
        let mut rows = stmt.query([species_id])?;
        let mut occurrences = Vec::new();
        while let Some(row) = rows.next()? {
            occurrences.push(parse_occurrence_row(row)?);
        }
        Ok(occurrences)
    }

    fn occurrence_exists(
        &self,
        species_id: RecordId,
        reserve_id: RecordId,
        year: i32,
    ) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM occurrences
                WHERE species_id = ?1 AND reserve_id = ?2 AND year = ?3
            );",
            params![species_id, reserve_id, year],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

fn parse_occurrence_row(row: &Row<'_>) -> RepoResult<Occurrence> {
    Ok(Occurrence {
        id: Some(row.get("id")?),
        species_id: row.get("species_id")?,
        reserve_id: row.get("reserve_id")?,
        year: row.get("year")?,
        is_rare: int_to_bool(row.get("is_rare")?, "occurrences.is_rare")?,
        latitude: row.get("latitude")?,
        longitude: row.get("longitude")?,
        source: row.get("source")?,
        observer: row.get("observer")?,
        created_by: row.get("created_by")?,
        notes: row.get("notes")?,
        created_at: row.get("created_at")?,
    })
}
