//! Year-indexed association and habitat links.
//!
//! # Invariants
//! - `(association, reserve, year)` and `(site, habitat, year)` are unique.
//! - Link rows disappear with either parent (`ON DELETE CASCADE`).

use super::{map_write_error, RepoError, RepoResult};
use crate::model::links::{ReserveAssociationYear, SiteHabitat};
use crate::model::RecordId;
use rusqlite::{params, Connection, Row};

pub trait ReserveAssociationRepository {
    fn create_reserve_association(&self, link: &ReserveAssociationYear) -> RepoResult<RecordId>;
    fn delete_reserve_association(&self, id: RecordId) -> RepoResult<()>;
    /// Links of one reserve, newest year first.
    fn list_reserve_associations(
        &self,
        reserve_id: RecordId,
    ) -> RepoResult<Vec<ReserveAssociationYear>>;
}

pub trait SiteHabitatRepository {
    fn create_site_habitat(&self, link: &SiteHabitat) -> RepoResult<RecordId>;
    fn delete_site_habitat(&self, id: RecordId) -> RepoResult<()>;
    /// Links of one site, oldest year first.
    fn list_site_habitats(&self, site_id: RecordId) -> RepoResult<Vec<SiteHabitat>>;
}

pub struct SqliteLinkRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLinkRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn delete_from(&self, table: &str, entity: &'static str, id: RecordId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute(&format!("DELETE FROM {table} WHERE id = ?1;"), [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity, id });
        }
        Ok(())
    }
}

impl ReserveAssociationRepository for SqliteLinkRepository<'_> {
    fn create_reserve_association(&self, link: &ReserveAssociationYear) -> RepoResult<RecordId> {
        link.validate()?;

        self.conn
            .execute(
                "INSERT INTO reserve_association_years (association_id, reserve_id, year, notes)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    link.association_id,
                    link.reserve_id,
                    link.year,
                    link.notes.as_deref()
                ],
            )
            .map_err(|err| {
                map_write_error(
                    err,
                    "reserve association",
                    &format!(
                        "association={} reserve={} year={}",
                        link.association_id, link.reserve_id, link.year
                    ),
                )
            })?;

        Ok(self.conn.last_insert_rowid())
    }

    fn delete_reserve_association(&self, id: RecordId) -> RepoResult<()> {
        self.delete_from("reserve_association_years", "reserve association", id)
    }

    fn list_reserve_associations(
        &self,
        reserve_id: RecordId,
    ) -> RepoResult<Vec<ReserveAssociationYear>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, association_id, reserve_id, year, notes, created_at
             FROM reserve_association_years
             WHERE reserve_id = ?1
             ORDER BY year DESC, association_id ASC;",
        )?;
        let rows = stmt.query_map([reserve_id], parse_reserve_association_row)?;
        let mut links = Vec::new();
        for link in rows {
            links.push(link?);
        }
        Ok(links)
    }
}

impl SiteHabitatRepository for SqliteLinkRepository<'_> {
    fn create_site_habitat(&self, link: &SiteHabitat) -> RepoResult<RecordId> {
        link.validate()?;

        self.conn
            .execute(
                "INSERT INTO site_habitats (site_id, habitat_id, year, surface, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    link.site_id,
                    link.habitat_id,
                    link.year,
                    link.surface,
                    link.notes.as_deref()
                ],
            )
            .map_err(|err| {
                map_write_error(
                    err,
                    "site habitat",
                    &format!(
                        "site={} habitat={} year={}",
                        link.site_id, link.habitat_id, link.year
                    ),
                )
            })?;

        Ok(self.conn.last_insert_rowid())
    }

    fn delete_site_habitat(&self, id: RecordId) -> RepoResult<()> {
        self.delete_from("site_habitats", "site habitat", id)
    }

    fn list_site_habitats(&self, site_id: RecordId) -> RepoResult<Vec<SiteHabitat>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, site_id, habitat_id, year, surface, notes, created_at
             FROM site_habitats
             WHERE site_id = ?1
             ORDER BY year ASC, habitat_id ASC;",
        )?;
        let rows = stmt.query_map([site_id], parse_site_habitat_row)?;
        let mut links = Vec::new();
        for link in rows {
            links.push(link?);
        }
        Ok(links)
    }
}

fn parse_reserve_association_row(row: &Row<'_>) -> rusqlite::Result<ReserveAssociationYear> {
    Ok(ReserveAssociationYear {
        id: Some(row.get("id")?),
        association_id: row.get("association_id")?,
        reserve_id: row.get("reserve_id")?,
        year: row.get("year")?,
        notes: row.get("notes")?,
        created_at: row.get("created_at")?,
    })
}

fn parse_site_habitat_row(row: &Row<'_>) -> rusqlite::Result<SiteHabitat> {
    Ok(SiteHabitat {
        id: Some(row.get("id")?),
        site_id: row.get("site_id")?,
        habitat_id: row.get("habitat_id")?,
        year: row.get("year")?,
        surface: row.get("surface")?,
        notes: row.get("notes")?,
        created_at: row.get("created_at")?,
    })
}
