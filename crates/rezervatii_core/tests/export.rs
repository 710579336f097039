use rezervatii_core::db::open_db_in_memory;
use rezervatii_core::export::{association_table, export_table, occurrence_table, ExportFormat};
use rezervatii_core::model::links::Occurrence;
use rezervatii_core::model::reserve::Reserve;
use rezervatii_core::model::species::Species;
use rezervatii_core::repo::occurrence_repo::{OccurrenceRepository, SqliteOccurrenceRepository};
use rezervatii_core::repo::reserve_repo::{ReserveRepository, SqliteReserveRepository};
use rezervatii_core::repo::species_repo::{SpeciesRepository, SqliteSpeciesRepository};
use rezervatii_core::report::{filter_occurrences, AssociationRow, OccurrenceFilter};

#[test]
fn occurrence_report_exports_to_csv() {
    let conn = open_db_in_memory().unwrap();
    let mut reserve = Reserve::new("Codrii");
    reserve.raion = Some("Strășeni".to_string());
    let reserve_id = SqliteReserveRepository::new(&conn)
        .create_reserve(&reserve)
        .unwrap();
    let mut species = Species::new("Stipa capillata");
    species.popular_name = Some("Colilie".to_string());
    let species_id = SqliteSpeciesRepository::new(&conn)
        .create_species(&species)
        .unwrap();
    let mut occurrence = Occurrence::new(species_id, reserve_id, 2020);
    occurrence.is_rare = true;
    occurrence.latitude = Some(47.05);
    occurrence.longitude = Some(28.5);
    SqliteOccurrenceRepository::new(&conn)
        .create_occurrence(&occurrence)
        .unwrap();

    let filter = OccurrenceFilter {
        reserve_name: "Codrii".to_string(),
        ..OccurrenceFilter::default()
    };
    let report = filter_occurrences(&conn, &filter, 500).unwrap();
    let table = occurrence_table(&report.rows);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plante.csv");
    export_table(&table, ExportFormat::Csv, &path).unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    let mut lines = written.lines();
    assert_eq!(
        lines.next(),
        Some("Rezervație,Raion,Denumire științifică,Denumire populară,An,Rară,Latitudine,Longitudine")
    );
    assert_eq!(
        lines.next(),
        Some("Codrii,Strășeni,Stipa capillata,Colilie,2020,Da,47.05,28.5")
    );
    assert_eq!(lines.next(), None);
}

#[test]
fn association_table_exports_to_xlsx() {
    let table = association_table(&[AssociationRow {
        reserve: "Codrii".to_string(),
        association: "Quercetum roboris".to_string(),
        year: 2019,
        notes: String::new(),
    }]);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("asociatii.xlsx");
    export_table(&table, ExportFormat::Xlsx, &path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.len() > 100);
    assert_eq!(&bytes[..2], b"PK");
}

#[test]
fn export_into_missing_directory_fails() {
    let table = association_table(&[]);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent").join("asociatii.csv");

    assert!(export_table(&table, ExportFormat::Csv, &path).is_err());
}

#[test]
fn export_format_parses_names() {
    assert_eq!("XLSX".parse::<ExportFormat>(), Ok(ExportFormat::Xlsx));
    assert_eq!(" csv ".parse::<ExportFormat>(), Ok(ExportFormat::Csv));
    assert!("pdf".parse::<ExportFormat>().is_err());
}
