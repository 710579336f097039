//! Site repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `code_key` and `name_key` are both unique; either collision maps to
//!   [`RepoError::Duplicate`] keyed by the site code.

use super::{bool_to_int, int_to_bool, map_write_error, require_id, ListQuery, RepoError, RepoResult};
use crate::model::site::Site;
use crate::model::{name_key, RecordId};
use rusqlite::{params, Connection, OptionalExtension, Row};

const ENTITY: &str = "site";

const SITE_SELECT_SQL: &str = "SELECT
    id,
    code,
    name,
    area_ha,
    bird_species_count,
    other_species_count,
    habitats_count,
    latitude,
    longitude,
    ste,
    conj,
    other_species,
    notes,
    created_at,
    updated_at
FROM sites";

pub trait SiteRepository {
    fn create_site(&self, site: &Site) -> RepoResult<RecordId>;
    fn update_site(&self, site: &Site) -> RepoResult<()>;
    fn get_site(&self, id: RecordId) -> RepoResult<Option<Site>>;
    fn list_sites(&self, query: &ListQuery) -> RepoResult<Vec<Site>>;
    fn delete_site(&self, id: RecordId) -> RepoResult<()>;
    fn find_site_by_name(&self, name: &str) -> RepoResult<Option<Site>>;
    fn find_site_by_code(&self, code: &str) -> RepoResult<Option<Site>>;
}

pub struct SqliteSiteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSiteRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn find_by_key(&self, column: &str, key: String) -> RepoResult<Option<Site>> {
        let site = self
            .conn
            .query_row(
                &format!("{SITE_SELECT_SQL} WHERE {column} = ?1;"),
                [key],
                |row| Ok(parse_site_row(row)),
            )
            .optional()?;
        site.transpose()
    }
}

impl SiteRepository for SqliteSiteRepository<'_> {
    fn create_site(&self, site: &Site) -> RepoResult<RecordId> {
        site.validate()?;

        self.conn
            .execute(
                "INSERT INTO sites (
                    code,
                    code_key,
                    name,
                    name_key,
                    area_ha,
                    bird_species_count,
                    other_species_count,
                    habitats_count,
                    latitude,
                    longitude,
                    ste,
                    conj,
                    other_species,
                    notes
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14);",
                params![
                    site.code.trim(),
                    name_key(&site.code),
                    site.name.trim(),
                    name_key(&site.name),
                    site.area_ha,
                    site.bird_species_count,
                    site.other_species_count,
                    site.habitats_count,
                    site.latitude,
                    site.longitude,
                    bool_to_int(site.ste),
                    bool_to_int(site.conj),
                    site.other_species.as_deref(),
                    site.notes.as_deref(),
                ],
            )
            .map_err(|err| map_write_error(err, ENTITY, &site.code))?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update_site(&self, site: &Site) -> RepoResult<()> {
        let id = require_id(site.id, ENTITY)?;
        site.validate()?;

        let changed = self
            .conn
            .execute(
                "UPDATE sites
                 SET
                    code = ?1,
                    code_key = ?2,
                    name = ?3,
                    name_key = ?4,
                    area_ha = ?5,
                    bird_species_count = ?6,
                    other_species_count = ?7,
                    habitats_count = ?8,
                    latitude = ?9,
                    longitude = ?10,
                    ste = ?11,
                    conj = ?12,
                    other_species = ?13,
                    notes = ?14,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?15;",
                params![
                    site.code.trim(),
                    name_key(&site.code),
                    site.name.trim(),
                    name_key(&site.name),
                    site.area_ha,
                    site.bird_species_count,
                    site.other_species_count,
                    site.habitats_count,
                    site.latitude,
                    site.longitude,
                    bool_to_int(site.ste),
                    bool_to_int(site.conj),
                    site.other_species.as_deref(),
                    site.notes.as_deref(),
                    id,
                ],
            )
            .map_err(|err| map_write_error(err, ENTITY, &site.code))?;

        if changed == 0 {
            return Err(RepoError::NotFound { entity: ENTITY, id });
        }
        Ok(())
    }

    fn get_site(&self, id: RecordId) -> RepoResult<Option<Site>> {
        let site = self
            .conn
            .query_row(
                &format!("{SITE_SELECT_SQL} WHERE id = ?1;"),
                [id],
                |row| Ok(parse_site_row(row)),
            )
            .optional()?;
        site.transpose()
    }

    fn list_sites(&self, query: &ListQuery) -> RepoResult<Vec<Site>> {
        let sql = format!(
            "{SITE_SELECT_SQL} ORDER BY name_key ASC, id ASC{};",
            query.sql_suffix()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut sites = Vec::new();
        while let Some(row) = rows.next()? {
            sites.push(parse_site_row(row)?);
        }
        Ok(sites)
    }

    fn delete_site(&self, id: RecordId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM sites WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: ENTITY, id });
        }
        Ok(())
    }

    fn find_site_by_name(&self, name: &str) -> RepoResult<Option<Site>> {
        self.find_by_key("name_key", name_key(name))
    }

    fn find_site_by_code(&self, code: &str) -> RepoResult<Option<Site>> {
        self.find_by_key("code_key", name_key(code))
    }
}

fn parse_site_row(row: &Row<'_>) -> RepoResult<Site> {
    let site = Site {
        id: Some(row.get("id")?),
        code: row.get("code")?,
        name: row.get("name")?,
        area_ha: row.get("area_ha")?,
        bird_species_count: row.get("bird_species_count")?,
        other_species_count: row.get("other_species_count")?,
        habitats_count: row.get("habitats_count")?,
        latitude: row.get("latitude")?,
        longitude: row.get("longitude")?,
        ste: int_to_bool(row.get("ste")?, "sites.ste")?,
        conj: int_to_bool(row.get("conj")?, "sites.conj")?,
        other_species: row.get("other_species")?,
        notes: row.get("notes")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    site.validate().map_err(|err| {
        RepoError::InvalidData(format!("site {:?} fails validation: {err}", site.id))
    })?;
    Ok(site)
}
