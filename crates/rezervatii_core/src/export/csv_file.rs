use super::{ExportResult, Table};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the header row followed by every data row.
pub fn write_csv<W: Write>(table: &Table, writer: W) -> ExportResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(&table.headers)?;
    for row in &table.rows {
        csv_writer.write_record(row.iter().map(ToString::to_string))?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_csv_file(table: &Table, path: &Path) -> ExportResult<()> {
    let file = File::create(path)?;
    write_csv(table, file)
}
