use super::coerce::{decimal, integer, text, yes_no};
use super::{skip_or_abort, CsvSheet, ImportResult, ImportSummary, Written};
use crate::model::site::Site;
use crate::repo::site_repo::{SiteRepository, SqliteSiteRepository};
use csv::StringRecord;
use rusqlite::{Connection, TransactionBehavior};

const REQUIRED_COLUMNS: &[&str] = &[
    "codul_sitului",
    "denumirea",
    "suprafata",
    "numar_specii_pasari",
    "alte_specii",
    "habitate",
    "latitudine",
    "longitudine",
    "STE",
    "CONJ",
];

/// Upserts sites keyed by site code.
pub fn import_sites(conn: &mut Connection, sheet: &CsvSheet) -> ImportResult<ImportSummary> {
    sheet.require_columns(REQUIRED_COLUMNS)?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let repo = SqliteSiteRepository::new(&tx);
    let mut summary = ImportSummary::default();

    for (line, record) in sheet.rows() {
        let Some(incoming) = site_from_row(sheet, record) else {
            summary.skipped += 1;
            continue;
        };

        let written = match repo.find_site_by_code(&incoming.code)? {
            None => repo.create_site(&incoming).map(|_| Written::Created),
            Some(existing) => {
                let site = Site {
                    id: existing.id,
                    other_species: existing.other_species.clone(),
                    notes: existing.notes.clone(),
                    created_at: existing.created_at,
                    updated_at: existing.updated_at,
                    ..incoming
                };
                if site == existing {
                    summary.unchanged += 1;
                    continue;
                }
                repo.update_site(&site).map(|()| Written::Updated)
            }
        };
        match written {
            Ok(written) => summary.record(written),
            Err(err) => skip_or_abort(err, "sites", line, &mut summary)?,
        }
    }

    tx.commit()?;
    Ok(summary)
}

fn site_from_row(sheet: &CsvSheet, record: &StringRecord) -> Option<Site> {
    let code = text(sheet.cell(record, "codul_sitului"))?;
    let name = text(sheet.cell(record, "denumirea"))?;
    let count = |column: &str| {
        integer(sheet.cell(record, column))
            .and_then(|value| u32::try_from(value).ok())
            .unwrap_or(0)
    };

    let mut site = Site::new(code, name);
    site.area_ha = decimal(sheet.cell(record, "suprafata")).unwrap_or(0.0);
    site.bird_species_count = count("numar_specii_pasari");
    site.other_species_count = count("alte_specii");
    site.habitats_count = count("habitate");
    site.latitude = decimal(sheet.cell(record, "latitudine"));
    site.longitude = decimal(sheet.cell(record, "longitudine"));
    site.ste = yes_no(sheet.cell(record, "STE"), false);
    site.conj = yes_no(sheet.cell(record, "CONJ"), false);
    Some(site)
}
