//! Report rows to [`Table`] conversions with Romanian column headers.

use super::{Cell, Table};
use crate::report::{AssociationRow, OccurrenceRow, SiteHabitatRow, SpeciesComparison};
use crate::search::SearchHit;

pub fn association_table(rows: &[AssociationRow]) -> Table {
    let mut table = Table::new("Asociatii", &["Rezervație", "Asociație", "An", "Note"]);
    for row in rows {
        table.push_row(vec![
            Cell::text(row.reserve.as_str()),
            Cell::text(row.association.as_str()),
            Cell::Int(i64::from(row.year)),
            Cell::text(row.notes.as_str()),
        ]);
    }
    table
}

pub fn occurrence_table(rows: &[OccurrenceRow]) -> Table {
    let mut table = Table::new(
        "Plante",
        &[
            "Rezervație",
            "Raion",
            "Denumire științifică",
            "Denumire populară",
            "An",
            "Rară",
            "Latitudine",
            "Longitudine",
        ],
    );
    for row in rows {
        table.push_row(vec![
            Cell::text(row.reserve.as_str()),
            Cell::text(row.raion.as_str()),
            Cell::text(row.species_scientific.as_str()),
            Cell::text(row.species_popular.as_str()),
            Cell::Int(i64::from(row.year)),
            Cell::text(if row.rare { "Da" } else { "Nu" }),
            Cell::optional_float(row.latitude),
            Cell::optional_float(row.longitude),
        ]);
    }
    table
}

pub fn site_habitat_table(rows: &[SiteHabitatRow]) -> Table {
    let mut table = Table::new(
        "SiteHabitats",
        &[
            "Site",
            "Habitat (RO)",
            "Habitat (EN)",
            "Cod habitat",
            "An",
            "Suprafață (ha)",
            "Notițe",
        ],
    );
    for row in rows {
        table.push_row(vec![
            Cell::text(row.site.as_str()),
            Cell::text(row.habitat_romanian.as_str()),
            Cell::text(row.habitat_english.as_str()),
            Cell::text(row.habitat_code.as_str()),
            Cell::Int(i64::from(row.year)),
            Cell::optional_float(row.surface),
            Cell::text(row.notes.as_str()),
        ]);
    }
    table
}

/// One row per reserve, one column per recorded year.
pub fn comparison_table(comparison: &SpeciesComparison) -> Table {
    let mut headers = vec!["Rezervație".to_string()];
    headers.extend(comparison.years.iter().map(ToString::to_string));
    let mut table = Table {
        sheet_name: "Comparatie".to_string(),
        headers,
        rows: Vec::new(),
    };
    for row in &comparison.rows {
        let mut cells = vec![Cell::text(row.reserve.as_str())];
        cells.extend(row.present.iter().map(|present| {
            if *present {
                Cell::text("Da")
            } else {
                Cell::Empty
            }
        }));
        table.push_row(cells);
    }
    table
}

pub fn search_hit_table(hits: &[SearchHit]) -> Table {
    let mut table = Table::new("Cautare", &["ID", "Denumire", "Detalii", "Scor"]);
    for hit in hits {
        table.push_row(vec![
            Cell::Int(hit.id),
            Cell::text(hit.label.as_str()),
            hit.detail.as_deref().map_or(Cell::Empty, Cell::text),
            Cell::optional_float(hit.score),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::{comparison_table, site_habitat_table};
    use crate::export::Cell;
    use crate::model::species::Species;
    use crate::report::{PresenceRow, SiteHabitatRow, SpeciesComparison};

    #[test]
    fn site_habitat_headers_and_missing_surface() {
        let table = site_habitat_table(&[SiteHabitatRow {
            site: "Prutul de Jos".to_string(),
            habitat_romanian: "Păduri aluviale".to_string(),
            habitat_english: "Alluvial forests".to_string(),
            habitat_code: "91E0".to_string(),
            year: 2020,
            surface: None,
            notes: String::new(),
        }]);
        assert_eq!(table.headers[5], "Suprafață (ha)");
        assert_eq!(table.rows[0][5], Cell::Empty);
        assert_eq!(table.rows[0][4], Cell::Int(2020));
    }

    #[test]
    fn comparison_columns_follow_years() {
        let comparison = SpeciesComparison {
            species: Species::new("Stipa capillata"),
            years: vec![2018, 2020],
            rows: vec![PresenceRow {
                reserve: "Codrii".to_string(),
                present: vec![false, true],
            }],
        };
        let table = comparison_table(&comparison);
        assert_eq!(table.headers, vec!["Rezervație", "2018", "2020"]);
        assert_eq!(
            table.rows[0],
            vec![Cell::text("Codrii"), Cell::Empty, Cell::text("Da")]
        );
    }
}
