use super::coerce::{is_rare_frequency, species_flag, text};
use super::{skip_or_abort, CsvSheet, ImportResult, ImportSummary};
use crate::model::species::{Species, DEFAULT_RED_BOOK_YEAR};
use crate::repo::species_repo::{SpeciesRepository, SqliteSpeciesRepository};
use csv::StringRecord;
use rusqlite::{Connection, TransactionBehavior};

const SCIENTIFIC_NAME: &str = "Denumirea_stiintifică";

/// Creates species missing from the catalog; existing names are left as they are.
pub fn import_species(conn: &mut Connection, sheet: &CsvSheet) -> ImportResult<ImportSummary> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let repo = SqliteSpeciesRepository::new(&tx);
    let mut summary = ImportSummary::default();

    for (line, record) in sheet.rows() {
        let Some(species) = species_from_row(sheet, record) else {
            summary.skipped += 1;
            continue;
        };
        if repo
            .find_species_by_name(&species.scientific_name)?
            .is_some()
        {
            summary.unchanged += 1;
            continue;
        }
        match repo.create_species(&species) {
            Ok(_) => summary.created += 1,
            Err(err) => skip_or_abort(err, "species", line, &mut summary)?,
        }
    }

    tx.commit()?;
    Ok(summary)
}

fn species_from_row(sheet: &CsvSheet, record: &StringRecord) -> Option<Species> {
    let name = sheet.text(record, SCIENTIFIC_NAME)?;
    let flag = |column: &str| species_flag(sheet.cell(record, column));

    let mut species = Species::new(&name);
    species.popular_name = sheet.text(record, "Denumirea_populară");
    species.class_name = sheet.text(record, "Clasa");
    species.family = sheet.text(record, "Familia");
    species.habitat = sheet.text(record, "Habitat");
    species.locality = sheet.text(record, "Localitatea");
    species.is_forest = flag("Silvice");
    species.is_grassland = flag("Pajisti_sau_stepice");
    species.is_rocky = flag("Stancarii");
    species.is_wetland = flag("Palustre_si_acvatice");
    species.frequency = text(sheet.cell(record, "P_rară"));
    species.is_rare = species.frequency.as_deref().is_some_and(is_rare_frequency);
    species.bern_convention = flag("Conventia_Berna");
    species.habitats_directive = flag("Directiva_Habitate");
    if flag("RM_Cartea_R_2015") {
        species.red_book_year = Some(DEFAULT_RED_BOOK_YEAR);
    }
    Some(species)
}
