//! Habitat repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Romanian and English names are each unique case-insensitively.
//! - Codes are optional and not unique; lookups by code return the first
//!   match by id.

use super::{map_write_error, require_id, ListQuery, RepoError, RepoResult};
use crate::model::habitat::Habitat;
use crate::model::{clean_optional, name_key, RecordId};
use rusqlite::{params, Connection, OptionalExtension, Row};

const ENTITY: &str = "habitat";

const HABITAT_SELECT_SQL: &str = "SELECT
    id,
    name_romanian,
    name_english,
    code,
    notes,
    created_at,
    updated_at
FROM habitats";

pub trait HabitatRepository {
    fn create_habitat(&self, habitat: &Habitat) -> RepoResult<RecordId>;
    fn update_habitat(&self, habitat: &Habitat) -> RepoResult<()>;
    fn get_habitat(&self, id: RecordId) -> RepoResult<Option<Habitat>>;
    fn list_habitats(&self, query: &ListQuery) -> RepoResult<Vec<Habitat>>;
    fn delete_habitat(&self, id: RecordId) -> RepoResult<()>;
    /// Exact, case-insensitive lookup by Romanian or English name.
    fn find_habitat_by_name(&self, name: &str) -> RepoResult<Option<Habitat>>;
    fn find_habitat_by_code(&self, code: &str) -> RepoResult<Option<Habitat>>;
}

pub struct SqliteHabitatRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteHabitatRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn find_one(&self, filter: &str, key: String) -> RepoResult<Option<Habitat>> {
        let habitat = self
            .conn
            .query_row(
                &format!("{HABITAT_SELECT_SQL} WHERE {filter} ORDER BY id ASC LIMIT 1;"),
                [key],
                |row| Ok(parse_habitat_row(row)),
            )
            .optional()?;
        habitat.transpose()
    }
}

impl HabitatRepository for SqliteHabitatRepository<'_> {
    fn create_habitat(&self, habitat: &Habitat) -> RepoResult<RecordId> {
        habitat.validate()?;

        self.conn
            .execute(
                "INSERT INTO habitats (
                    name_romanian,
                    name_romanian_key,
                    name_english,
                    name_english_key,
                    code,
                    notes
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    habitat.name_romanian.trim(),
                    name_key(&habitat.name_romanian),
                    habitat.name_english.trim(),
                    name_key(&habitat.name_english),
                    clean_optional(habitat.code.as_deref()),
                    habitat.notes.as_deref(),
                ],
            )
            .map_err(|err| map_write_error(err, ENTITY, &habitat.name_romanian))?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update_habitat(&self, habitat: &Habitat) -> RepoResult<()> {
        let id = require_id(habitat.id, ENTITY)?;
        habitat.validate()?;

        let changed = self
            .conn
            .execute(
                "UPDATE habitats
                 SET
                    name_romanian = ?1,
                    name_romanian_key = ?2,
                    name_english = ?3,
                    name_english_key = ?4,
                    code = ?5,
                    notes = ?6,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?7;",
                params![
                    habitat.name_romanian.trim(),
                    name_key(&habitat.name_romanian),
                    habitat.name_english.trim(),
                    name_key(&habitat.name_english),
                    clean_optional(habitat.code.as_deref()),
                    habitat.notes.as_deref(),
                    id,
                ],
            )
            .map_err(|err| map_write_error(err, ENTITY, &habitat.name_romanian))?;

        if changed == 0 {
            return Err(RepoError::NotFound { entity: ENTITY, id });
        }
        Ok(())
    }

    fn get_habitat(&self, id: RecordId) -> RepoResult<Option<Habitat>> {
        let habitat = self
            .conn
            .query_row(
                &format!("{HABITAT_SELECT_SQL} WHERE id = ?1;"),
                [id],
                |row| Ok(parse_habitat_row(row)),
            )
            .optional()?;
        habitat.transpose()
    }

    fn list_habitats(&self, query: &ListQuery) -> RepoResult<Vec<Habitat>> {
        let sql = format!(
            "{HABITAT_SELECT_SQL} ORDER BY name_romanian_key ASC, id ASC{};",
            query.sql_suffix()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut habitats = Vec::new();
        while let Some(row) = rows.next()? {
            habitats.push(parse_habitat_row(row)?);
        }
        Ok(habitats)
    }

    fn delete_habitat(&self, id: RecordId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM habitats WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: ENTITY, id });
        }
        Ok(())
    }

    fn find_habitat_by_name(&self, name: &str) -> RepoResult<Option<Habitat>> {
        self.find_one(
            "name_romanian_key = ?1 OR name_english_key = ?1",
            name_key(name),
        )
    }

    fn find_habitat_by_code(&self, code: &str) -> RepoResult<Option<Habitat>> {
        self.find_one("lower(code) = ?1", name_key(code))
    }
}

fn parse_habitat_row(row: &Row<'_>) -> RepoResult<Habitat> {
    let habitat = Habitat {
        id: Some(row.get("id")?),
        name_romanian: row.get("name_romanian")?,
        name_english: row.get("name_english")?,
        code: row.get("code")?,
        notes: row.get("notes")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    habitat.validate().map_err(|err| {
        RepoError::InvalidData(format!("habitat {:?} fails validation: {err}", habitat.id))
    })?;
    Ok(habitat)
}
