use super::{Cell, ExportError, ExportResult, Table};
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;

const MAX_ROWS: usize = 1_048_576;
const MAX_COLUMNS: usize = 16_384;

fn build_workbook(table: &Table) -> ExportResult<Workbook> {
    let too_large = || ExportError::TooLarge {
        rows: table.rows.len(),
        columns: table.headers.len(),
    };
    if table.rows.len() + 1 > MAX_ROWS || table.headers.len() > MAX_COLUMNS {
        return Err(too_large());
    }

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(table.sheet_name.as_str())?;

    for (col, header) in table.headers.iter().enumerate() {
        let col = u16::try_from(col).map_err(|_| too_large())?;
        sheet.write_string_with_format(0, col, header.as_str(), &header_format)?;
    }

    for (index, row) in table.rows.iter().enumerate() {
        let row_num = u32::try_from(index + 1).map_err(|_| too_large())?;
        for (col, cell) in row.iter().enumerate() {
            let col = u16::try_from(col).map_err(|_| too_large())?;
            match cell {
                Cell::Text(value) => {
                    sheet.write_string(row_num, col, value.as_str())?;
                }
                Cell::Int(value) => {
                    sheet.write_number(row_num, col, *value as f64)?;
                }
                Cell::Float(value) => {
                    sheet.write_number(row_num, col, *value)?;
                }
                Cell::Empty => {}
            }
        }
    }

    Ok(workbook)
}

pub fn write_xlsx_file(table: &Table, path: &Path) -> ExportResult<()> {
    let mut workbook = build_workbook(table)?;
    workbook.save(path)?;
    Ok(())
}

/// Serialized workbook, for callers that stream the file themselves.
pub fn xlsx_bytes(table: &Table) -> ExportResult<Vec<u8>> {
    let mut workbook = build_workbook(table)?;
    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::xlsx_bytes;
    use crate::export::{Cell, Table};

    #[test]
    fn produces_a_zip_container() {
        let mut table = Table::new("Asociatii", &["Rezervație", "An"]);
        table.push_row(vec![Cell::text("Codrii"), Cell::Int(2019)]);
        let bytes = xlsx_bytes(&table).expect("xlsx serialization");
        assert!(bytes.starts_with(b"PK"));
    }
}
