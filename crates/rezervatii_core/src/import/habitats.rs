use super::{skip_or_abort, CsvSheet, ImportResult, ImportSummary, Written};
use crate::model::habitat::Habitat;
use crate::model::name_key;
use crate::repo::habitat_repo::{HabitatRepository, SqliteHabitatRepository};
use rusqlite::{Connection, TransactionBehavior};

/// Upserts habitats keyed by their (Romanian, English) name pair; `codul` is optional.
pub fn import_habitats(conn: &mut Connection, sheet: &CsvSheet) -> ImportResult<ImportSummary> {
    sheet.require_columns(&["denumirea_engleza", "denumirea_romana"])?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let repo = SqliteHabitatRepository::new(&tx);
    let mut summary = ImportSummary::default();

    for (line, record) in sheet.rows() {
        let (Some(name_english), Some(name_romanian)) = (
            sheet.text(record, "denumirea_engleza"),
            sheet.text(record, "denumirea_romana"),
        ) else {
            summary.skipped += 1;
            continue;
        };
        let code = sheet.text(record, "codul");

        let existing = repo
            .find_habitat_by_name(&name_romanian)?
            .filter(|found| name_key(&found.name_english) == name_key(&name_english));

        let written = match existing {
            Some(found) if found.code == code => {
                summary.unchanged += 1;
                continue;
            }
            Some(mut found) => {
                found.code = code;
                repo.update_habitat(&found).map(|()| Written::Updated)
            }
            None => {
                let mut habitat = Habitat::new(name_romanian, name_english);
                habitat.code = code;
                repo.create_habitat(&habitat).map(|_| Written::Created)
            }
        };
        match written {
            Ok(written) => summary.record(written),
            Err(err) => skip_or_abort(err, "habitats", line, &mut summary)?,
        }
    }

    tx.commit()?;
    Ok(summary)
}
