//! Association repository contracts and SQLite implementation.

use super::{map_write_error, require_id, ListQuery, RepoError, RepoResult};
use crate::model::association::Association;
use crate::model::{name_key, RecordId};
use rusqlite::{params, Connection, OptionalExtension, Row};

const ENTITY: &str = "association";

const ASSOCIATION_SELECT_SQL: &str =
    "SELECT id, name, notes, created_at, updated_at FROM associations";

pub trait AssociationRepository {
    fn create_association(&self, association: &Association) -> RepoResult<RecordId>;
    fn update_association(&self, association: &Association) -> RepoResult<()>;
    fn get_association(&self, id: RecordId) -> RepoResult<Option<Association>>;
    fn list_associations(&self, query: &ListQuery) -> RepoResult<Vec<Association>>;
    fn delete_association(&self, id: RecordId) -> RepoResult<()>;
    fn find_association_by_name(&self, name: &str) -> RepoResult<Option<Association>>;
}

pub struct SqliteAssociationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAssociationRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AssociationRepository for SqliteAssociationRepository<'_> {
    fn create_association(&self, association: &Association) -> RepoResult<RecordId> {
        association.validate()?;

        self.conn
            .execute(
                "INSERT INTO associations (name, name_key, notes) VALUES (?1, ?2, ?3);",
                params![
                    association.name.trim(),
                    name_key(&association.name),
                    association.notes.as_deref(),
                ],
            )
            .map_err(|err| map_write_error(err, ENTITY, &association.name))?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update_association(&self, association: &Association) -> RepoResult<()> {
        let id = require_id(association.id, ENTITY)?;
        association.validate()?;

        let changed = self
            .conn
            .execute(
                "UPDATE associations
                 SET
                    name = ?1,
                    name_key = ?2,
                    notes = ?3,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?4;",
                params![
                    association.name.trim(),
                    name_key(&association.name),
                    association.notes.as_deref(),
                    id,
                ],
            )
            .map_err(|err| map_write_error(err, ENTITY, &association.name))?;

        if changed == 0 {
            return Err(RepoError::NotFound { entity: ENTITY, id });
        }
        Ok(())
    }

    fn get_association(&self, id: RecordId) -> RepoResult<Option<Association>> {
        let association = self
            .conn
            .query_row(
                &format!("{ASSOCIATION_SELECT_SQL} WHERE id = ?1;"),
                [id],
                |row| Ok(parse_association_row(row)),
            )
            .optional()?;
        association.transpose()
    }

    fn list_associations(&self, query: &ListQuery) -> RepoResult<Vec<Association>> {
        let sql = format!(
            "{ASSOCIATION_SELECT_SQL} ORDER BY name_key ASC, id ASC{};",
            query.sql_suffix()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut associations = Vec::new();
        while let Some(row) = rows.next()? {
            associations.push(parse_association_row(row)?);
        }
        Ok(associations)
    }

    fn delete_association(&self, id: RecordId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM associations WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: ENTITY, id });
        }
        Ok(())
    }

    fn find_association_by_name(&self, name: &str) -> RepoResult<Option<Association>> {
        let association = self
            .conn
            .query_row(
                &format!("{ASSOCIATION_SELECT_SQL} WHERE name_key = ?1;"),
                [name_key(name)],
                |row| Ok(parse_association_row(row)),
            )
            .optional()?;
        association.transpose()
    }
}

fn parse_association_row(row: &Row<'_>) -> RepoResult<Association> {
    let association = Association {
        id: Some(row.get("id")?),
        name: row.get("name")?,
        notes: row.get("notes")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    association.validate().map_err(|err| {
        RepoError::InvalidData(format!(
            "association {:?} fails validation: {err}",
            association.id
        ))
    })?;
    Ok(association)
}
