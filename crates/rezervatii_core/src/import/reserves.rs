use super::coerce::decimal;
use super::coords::parse_coordinates;
use super::{skip_or_abort, CsvSheet, ImportResult, ImportSummary, Written};
use crate::model::reserve::Reserve;
use crate::repo::reserve_repo::{ReserveRepository, SqliteReserveRepository};
use csv::StringRecord;
use rusqlite::{Connection, TransactionBehavior};

const NAME_COLUMNS: &[&str] = &["Denumirea", "name", "Nume"];

/// Creates new reserves and fills in changed, non-empty values on existing ones.
pub fn import_reserves(conn: &mut Connection, sheet: &CsvSheet) -> ImportResult<ImportSummary> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let repo = SqliteReserveRepository::new(&tx);
    let mut summary = ImportSummary::default();

    for (line, record) in sheet.rows() {
        let Some(incoming) = reserve_from_row(sheet, record) else {
            summary.skipped += 1;
            continue;
        };

        let written = match repo.find_reserve_by_name(&incoming.name)? {
            None => repo.create_reserve(&incoming).map(|_| Written::Created),
            Some(mut existing) => {
                if !merge_reserve(&mut existing, &incoming) {
                    summary.unchanged += 1;
                    continue;
                }
                repo.update_reserve(&existing).map(|()| Written::Updated)
            }
        };
        match written {
            Ok(written) => summary.record(written),
            Err(err) => skip_or_abort(err, "reserves", line, &mut summary)?,
        }
    }

    tx.commit()?;
    Ok(summary)
}

fn reserve_from_row(sheet: &CsvSheet, record: &StringRecord) -> Option<Reserve> {
    let name = NAME_COLUMNS
        .iter()
        .find_map(|column| sheet.text(record, column))?;

    let mut reserve = Reserve::new(name);
    reserve.raion = sheet.text(record, "Raion");
    reserve.location = sheet.text(record, "Amplasare");
    reserve.owner = sheet.text(record, "Proprietar");
    reserve.area_ha = decimal(sheet.cell(record, "Suprafata"));
    reserve.category = sheet.text(record, "Categorie");
    reserve.subcategory = sheet.text(record, "Subcategorie");
    reserve.phytocenotic_diversity = sheet.text(record, "Diversitatea_fitocenotica");
    reserve.coords_raw = sheet.text(record, "Coordonate");
    if let Some(raw) = reserve.coords_raw.as_deref() {
        (reserve.latitude, reserve.longitude) = parse_coordinates(raw);
    }
    Some(reserve)
}

/// Copies every `Some` field of `incoming` that differs; returns whether anything changed.
fn merge_reserve(existing: &mut Reserve, incoming: &Reserve) -> bool {
    let mut changed = false;
    changed |= merge(&mut existing.raion, &incoming.raion);
    changed |= merge(&mut existing.location, &incoming.location);
    changed |= merge(&mut existing.owner, &incoming.owner);
    changed |= merge(&mut existing.area_ha, &incoming.area_ha);
    changed |= merge(&mut existing.category, &incoming.category);
    changed |= merge(&mut existing.subcategory, &incoming.subcategory);
    changed |= merge(
        &mut existing.phytocenotic_diversity,
        &incoming.phytocenotic_diversity,
    );
    changed |= merge(&mut existing.latitude, &incoming.latitude);
    changed |= merge(&mut existing.longitude, &incoming.longitude);
    changed |= merge(&mut existing.coords_raw, &incoming.coords_raw);
    changed
}

fn merge<T: PartialEq + Clone>(target: &mut Option<T>, value: &Option<T>) -> bool {
    match value {
        Some(value) if target.as_ref() != Some(value) => {
            *target = Some(value.clone());
            true
        }
        _ => false,
    }
}
