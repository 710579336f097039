//! Reserve repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `reserves.name_key` mirrors `name_key(name)` on every write.
//! - Deleting a reserve cascades to its occurrences and association years.

use super::{map_write_error, require_id, ListQuery, RepoError, RepoResult};
use crate::model::reserve::Reserve;
use crate::model::{name_key, RecordId};
use rusqlite::{params, Connection, OptionalExtension, Row};

const ENTITY: &str = "reserve";

const RESERVE_SELECT_SQL: &str = "SELECT
    id,
    name,
    raion,
    location,
    owner,
    area_ha,
    category,
    subcategory,
    description,
    phytocenotic_diversity,
    latitude,
    longitude,
    coords_raw,
    notes,
    created_at,
    updated_at
FROM reserves";

pub trait ReserveRepository {
    fn create_reserve(&self, reserve: &Reserve) -> RepoResult<RecordId>;
    fn update_reserve(&self, reserve: &Reserve) -> RepoResult<()>;
    fn get_reserve(&self, id: RecordId) -> RepoResult<Option<Reserve>>;
    fn list_reserves(&self, query: &ListQuery) -> RepoResult<Vec<Reserve>>;
    fn delete_reserve(&self, id: RecordId) -> RepoResult<()>;
    /// Exact, case-insensitive lookup by name.
    fn find_reserve_by_name(&self, name: &str) -> RepoResult<Option<Reserve>>;
}

pub struct SqliteReserveRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReserveRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ReserveRepository for SqliteReserveRepository<'_> {
    fn create_reserve(&self, reserve: &Reserve) -> RepoResult<RecordId> {
        reserve.validate()?;

        self.conn
            .execute(
                "INSERT INTO reserves (
                    name,
                    name_key,
                    raion,
                    location,
                    owner,
                    area_ha,
                    category,
                    subcategory,
                    description,
                    phytocenotic_diversity,
                    latitude,
                    longitude,
                    coords_raw,
                    notes
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14);",
                params![
                    reserve.name.trim(),
                    name_key(&reserve.name),
                    reserve.raion.as_deref(),
                    reserve.location.as_deref(),
                    reserve.owner.as_deref(),
                    reserve.area_ha,
                    reserve.category.as_deref(),
                    reserve.subcategory.as_deref(),
                    reserve.description.as_deref(),
                    reserve.phytocenotic_diversity.as_deref(),
                    reserve.latitude,
                    reserve.longitude,
                    reserve.coords_raw.as_deref(),
                    reserve.notes.as_deref(),
                ],
            )
            .map_err(|err| map_write_error(err, ENTITY, &reserve.name))?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update_reserve(&self, reserve: &Reserve) -> RepoResult<()> {
        let id = require_id(reserve.id, ENTITY)?;
        reserve.validate()?;

        let changed = self
            .conn
            .execute(
                "UPDATE reserves
                 SET
                    name = ?1,
                    name_key = ?2,
                    raion = ?3,
                    location = ?4,
                    owner = ?5,
                    area_ha = ?6,
                    category = ?7,
                    subcategory = ?8,
                    description = ?9,
                    phytocenotic_diversity = ?10,
                    latitude = ?11,
                    longitude = ?12,
                    coords_raw = ?13,
                    notes = ?14,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?15;",
                params![
                    reserve.name.trim(),
                    name_key(&reserve.name),
                    reserve.raion.as_deref(),
                    reserve.location.as_deref(),
                    reserve.owner.as_deref(),
                    reserve.area_ha,
                    reserve.category.as_deref(),
                    reserve.subcategory.as_deref(),
                    reserve.description.as_deref(),
                    reserve.phytocenotic_diversity.as_deref(),
                    reserve.latitude,
                    reserve.longitude,
                    reserve.coords_raw.as_deref(),
                    reserve.notes.as_deref(),
                    id,
                ],
            )
            .map_err(|err| map_write_error(err, ENTITY, &reserve.name))?;

        if changed == 0 {
            return Err(RepoError::NotFound { entity: ENTITY, id });
        }
        Ok(())
    }

    fn get_reserve(&self, id: RecordId) -> RepoResult<Option<Reserve>> {
        let reserve = self
            .conn
            .query_row(
                &format!("{RESERVE_SELECT_SQL} WHERE id = ?1;"),
                [id],
                |row| Ok(parse_reserve_row(row)),
            )
            .optional()?;
        reserve.transpose()
    }

    fn list_reserves(&self, query: &ListQuery) -> RepoResult<Vec<Reserve>> {
        let sql = format!(
            "{RESERVE_SELECT_SQL} ORDER BY name_key ASC, id ASC{};",
            query.sql_suffix()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut reserves = Vec::new();
        while let Some(row) = rows.next()? {
            reserves.push(parse_reserve_row(row)?);
        }
        Ok(reserves)
    }

    fn delete_reserve(&self, id: RecordId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM reserves WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: ENTITY, id });
        }
        Ok(())
    }

    fn find_reserve_by_name(&self, name: &str) -> RepoResult<Option<Reserve>> {
        let reserve = self
            .conn
            .query_row(
                &format!("{RESERVE_SELECT_SQL} WHERE name_key = ?1;"),
                [name_key(name)],
                |row| Ok(parse_reserve_row(row)),
            )
            .optional()?;
        reserve.transpose()
    }
}

pub(crate) fn parse_reserve_row(row: &Row<'_>) -> RepoResult<Reserve> {
    let reserve = Reserve {
        id: Some(row.get("id")?),
        name: row.get("name")?,
        raion: row.get("raion")?,
        location: row.get("location")?,
        owner: row.get("owner")?,
        area_ha: row.get("area_ha")?,
        category: row.get("category")?,
        subcategory: row.get("subcategory")?,
        description: row.get("description")?,
        phytocenotic_diversity: row.get("phytocenotic_diversity")?,
        latitude: row.get("latitude")?,
        longitude: row.get("longitude")?,
        coords_raw: row.get("coords_raw")?,
        notes: row.get("notes")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    reserve.validate().map_err(|err| {
        RepoError::InvalidData(format!("reserve {:?} fails validation: {err}", reserve.id))
    })?;
    Ok(reserve)
}
