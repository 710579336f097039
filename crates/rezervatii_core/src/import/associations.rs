use super::{skip_or_abort, CsvSheet, ImportError, ImportResult, ImportSummary};
use crate::model::association::Association;
use crate::repo::association_repo::{AssociationRepository, SqliteAssociationRepository};
use rusqlite::{Connection, TransactionBehavior};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

const NAME_COLUMNS: &[&str] = &["Denumirea", "name"];

/// Creates associations missing from the catalog, ignoring repeats within the file.
pub fn import_associations(
    conn: &mut Connection,
    sheet: &CsvSheet,
) -> ImportResult<ImportSummary> {
    if !NAME_COLUMNS.iter().any(|column| sheet.has_column(column)) {
        return Err(ImportError::MissingColumns(vec![NAME_COLUMNS.join(" or ")]));
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let repo = SqliteAssociationRepository::new(&tx);
    let mut summary = ImportSummary::default();
    let mut seen = HashSet::new();

    for (line, record) in sheet.rows() {
        let name = NAME_COLUMNS
            .iter()
            .find_map(|column| sheet.text(record, column))
            .map(|raw| clean_association_name(&raw))
            .unwrap_or_default();
        if name.is_empty() {
            summary.skipped += 1;
            continue;
        }
        if !seen.insert(name.to_lowercase()) {
            summary.duplicates_in_file += 1;
            continue;
        }

        if repo.find_association_by_name(&name)?.is_some() {
            summary.unchanged += 1;
            continue;
        }
        match repo.create_association(&Association::new(name)) {
            Ok(_) => summary.created += 1,
            Err(err) => skip_or_abort(err, "associations", line, &mut summary)?,
        }
    }

    tx.commit()?;
    Ok(summary)
}

/// NFKC-normalizes, drops trailing `,`/`;` and collapses whitespace.
///
/// `"Quercetum  roboris Borza 1937, "` becomes `"Quercetum roboris Borza 1937"`.
pub fn clean_association_name(raw: &str) -> String {
    let normalized: String = raw.nfkc().collect();
    let trimmed = normalized
        .trim()
        .trim_end_matches(|c: char| c == ',' || c == ';' || c.is_whitespace());
    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}
