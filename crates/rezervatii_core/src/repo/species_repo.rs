//! Species repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Records are normalized with [`Species::normalize`] before validation
//!   and persistence, so the stored scientific name is canonical.
//! - `species.name_key` mirrors `name_key(scientific_name)`.

use super::{bool_to_int, int_to_bool, map_write_error, require_id, ListQuery, RepoError, RepoResult};
use crate::model::species::{normalize_scientific_name, Species};
use crate::model::{name_key, RecordId};
use rusqlite::{params, Connection, OptionalExtension, Row};

const ENTITY: &str = "species";

const SPECIES_SELECT_SQL: &str = "SELECT
    id,
    scientific_name,
    popular_name,
    class_name,
    family,
    habitat,
    locality,
    is_forest,
    is_grassland,
    is_rocky,
    is_wetland,
    is_rare,
    bern_convention,
    habitats_directive,
    red_book_year,
    red_book_category,
    frequency,
    description,
    notes,
    created_at,
    updated_at
FROM species";

pub trait SpeciesRepository {
    fn create_species(&self, species: &Species) -> RepoResult<RecordId>;
    fn update_species(&self, species: &Species) -> RepoResult<()>;
    fn get_species(&self, id: RecordId) -> RepoResult<Option<Species>>;
    fn list_species(&self, query: &ListQuery) -> RepoResult<Vec<Species>>;
    fn delete_species(&self, id: RecordId) -> RepoResult<()>;
    /// Exact, case-insensitive lookup by scientific name.
    fn find_species_by_name(&self, scientific_name: &str) -> RepoResult<Option<Species>>;
}

pub struct SqliteSpeciesRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSpeciesRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SpeciesRepository for SqliteSpeciesRepository<'_> {
    fn create_species(&self, species: &Species) -> RepoResult<RecordId> {
        let mut species = species.clone();
        species.normalize();
        species.validate()?;

        self.conn
            .execute(
                "INSERT INTO species (
                    scientific_name,
                    name_key,
                    popular_name,
                    class_name,
                    family,
                    habitat,
                    locality,
                    is_forest,
                    is_grassland,
                    is_rocky,
                    is_wetland,
                    is_rare,
                    bern_convention,
                    habitats_directive,
                    red_book_year,
                    red_book_category,
                    frequency,
                    description,
                    notes
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19);",
                params![
                    species.scientific_name.as_str(),
                    name_key(&species.scientific_name),
                    species.popular_name.as_deref(),
                    species.class_name.as_deref(),
                    species.family.as_deref(),
                    species.habitat.as_deref(),
                    species.locality.as_deref(),
                    bool_to_int(species.is_forest),
                    bool_to_int(species.is_grassland),
                    bool_to_int(species.is_rocky),
                    bool_to_int(species.is_wetland),
                    bool_to_int(species.is_rare),
                    bool_to_int(species.bern_convention),
                    bool_to_int(species.habitats_directive),
                    species.red_book_year,
                    species.red_book_category.as_deref(),
                    species.frequency.as_deref(),
                    species.description.as_deref(),
                    species.notes.as_deref(),
                ],
            )
            .map_err(|err| map_write_error(err, ENTITY, &species.scientific_name))?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update_species(&self, species: &Species) -> RepoResult<()> {
        let id = require_id(species.id, ENTITY)?;
        let mut species = species.clone();
        species.normalize();
        species.validate()?;

        let changed = self
            .conn
            .execute(
                "UPDATE species
                 SET
                    scientific_name = ?1,
                    name_key = ?2,
                    popular_name = ?3,
                    class_name = ?4,
                    family = ?5,
                    habitat = ?6,
                    locality = ?7,
                    is_forest = ?8,
                    is_grassland = ?9,
                    is_rocky = ?10,
                    is_wetland = ?11,
                    is_rare = ?12,
                    bern_convention = ?13,
                    habitats_directive = ?14,
                    red_book_year = ?15,
                    red_book_category = ?16,
                    frequency = ?17,
                    description = ?18,
                    notes = ?19,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?20;",
                params![
                    species.scientific_name.as_str(),
                    name_key(&species.scientific_name),
                    species.popular_name.as_deref(),
                    species.class_name.as_deref(),
                    species.family.as_deref(),
                    species.habitat.as_deref(),
                    species.locality.as_deref(),
                    bool_to_int(species.is_forest),
                    bool_to_int(species.is_grassland),
                    bool_to_int(species.is_rocky),
                    bool_to_int(species.is_wetland),
                    bool_to_int(species.is_rare),
                    bool_to_int(species.bern_convention),
                    bool_to_int(species.habitats_directive),
                    species.red_book_year,
                    species.red_book_category.as_deref(),
                    species.frequency.as_deref(),
                    species.description.as_deref(),
                    species.notes.as_deref(),
                    id,
                ],
            )
            .map_err(|err| map_write_error(err, ENTITY, &species.scientific_name))?;

        if changed == 0 {
            return Err(RepoError::NotFound { entity: ENTITY, id });
        }
        Ok(())
    }

    fn get_species(&self, id: RecordId) -> RepoResult<Option<Species>> {
        let species = self
            .conn
            .query_row(
                &format!("{SPECIES_SELECT_SQL} WHERE id = ?1;"),
                [id],
                |row| Ok(parse_species_row(row)),
            )
            .optional()?;
        species.transpose()
    }

    fn list_species(&self, query: &ListQuery) -> RepoResult<Vec<Species>> {
        let sql = format!(
            "{SPECIES_SELECT_SQL} ORDER BY name_key ASC, id ASC{};",
            query.sql_suffix()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut species = Vec::new();
        while let Some(row) = rows.next()? {
            species.push(parse_species_row(row)?);
        }
        Ok(species)
    }

    fn delete_species(&self, id: RecordId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM species WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: ENTITY, id });
        }
        Ok(())
    }

    fn find_species_by_name(&self, scientific_name: &str) -> RepoResult<Option<Species>> {
        let key = name_key(&normalize_scientific_name(scientific_name));
        let species = self
            .conn
            .query_row(
                &format!("{SPECIES_SELECT_SQL} WHERE name_key = ?1;"),
                [key],
                |row| Ok(parse_species_row(row)),
            )
            .optional()?;
        species.transpose()
    }
}

pub(crate) fn parse_species_row(row: &Row<'_>) -> RepoResult<Species> {
    let species = Species {
        id: Some(row.get("id")?),
        scientific_name: row.get("scientific_name")?,
        popular_name: row.get("popular_name")?,
        class_name: row.get("class_name")?,
        family: row.get("family")?,
        habitat: row.get("habitat")?,
        locality: row.get("locality")?,
        is_forest: int_to_bool(row.get("is_forest")?, "species.is_forest")?,
        is_grassland: int_to_bool(row.get("is_grassland")?, "species.is_grassland")?,
        is_rocky: int_to_bool(row.get("is_rocky")?, "species.is_rocky")?,
        is_wetland: int_to_bool(row.get("is_wetland")?, "species.is_wetland")?,
        is_rare: int_to_bool(row.get("is_rare")?, "species.is_rare")?,
        bern_convention: int_to_bool(row.get("bern_convention")?, "species.bern_convention")?,
        habitats_directive: int_to_bool(
            row.get("habitats_directive")?,
            "species.habitats_directive",
        )?,
        red_book_year: row.get("red_book_year")?,
        red_book_category: row.get("red_book_category")?,
        frequency: row.get("frequency")?,
        description: row.get("description")?,
        notes: row.get("notes")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    species.validate().map_err(|err| {
        RepoError::InvalidData(format!("species {:?} fails validation: {err}", species.id))
    })?;
    Ok(species)
}
