use rezervatii_core::db::open_db_in_memory;
use rezervatii_core::import::{import_csv, ImportError, ImportKind, ImportSummary};
use rezervatii_core::repo::association_repo::{AssociationRepository, SqliteAssociationRepository};
use rezervatii_core::repo::habitat_repo::{HabitatRepository, SqliteHabitatRepository};
use rezervatii_core::repo::reserve_repo::{ReserveRepository, SqliteReserveRepository};
use rezervatii_core::repo::site_repo::{SiteRepository, SqliteSiteRepository};
use rezervatii_core::repo::species_repo::{SpeciesRepository, SqliteSpeciesRepository};
use rezervatii_core::repo::{ListQuery, RepoError};
use rusqlite::Connection;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_csv(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn import(conn: &mut Connection, dir: &TempDir, kind: ImportKind, content: &str) -> ImportSummary {
    let path = write_csv(dir, &format!("{}.csv", kind.as_str()), content);
    import_csv(conn, kind, &path).unwrap()
}

#[test]
fn species_import_reads_flags_and_rarity() {
    let dir = tempfile::tempdir().unwrap();
    let mut conn = open_db_in_memory().unwrap();

    let summary = import(
        &mut conn,
        &dir,
        ImportKind::Species,
        "\u{feff}Denumirea_stiintifică,Denumirea_populară,Familia,Silvice,P_rară,RM_Cartea_R_2015\n\
         Stipa capillata,Colilie,Poaceae,,rară,+\n\
         Adonis vernalis,Ruscuță de primăvară,Ranunculaceae,x,,\n\
         ,fără nume,,,,\n\
         stipa capillata,Colilie,Poaceae,,,\n",
    );
    assert_eq!(
        summary,
        ImportSummary {
            created: 2,
            unchanged: 1,
            skipped: 1,
            ..ImportSummary::default()
        }
    );

    let repo = SqliteSpeciesRepository::new(&conn);
    let stipa = repo.find_species_by_name("Stipa capillata").unwrap().unwrap();
    assert!(stipa.is_rare);
    assert!(!stipa.is_forest);
    assert_eq!(stipa.popular_name.as_deref(), Some("Colilie"));
    assert_eq!(stipa.red_book_year, Some(2015));

    let adonis = repo.find_species_by_name("adonis vernalis").unwrap().unwrap();
    assert!(adonis.is_forest);
    assert!(!adonis.is_rare);
    assert_eq!(adonis.family.as_deref(), Some("Ranunculaceae"));
}

#[test]
fn reserve_import_fills_changes_without_erasing_values() {
    let dir = tempfile::tempdir().unwrap();
    let mut conn = open_db_in_memory().unwrap();

    let first = import(
        &mut conn,
        &dir,
        ImportKind::Reserves,
        "Denumirea,Raion,Proprietar,Suprafata,Coordonate\n\
         Codrii,Strășeni,Agenția Moldsilva,\"5177,0\",47°04′N 28°30′E\n\
         Plaiul Fagului,Ungheni,,5642,\n",
    );
    assert_eq!(first.created, 2);

    let second = import(
        &mut conn,
        &dir,
        ImportKind::Reserves,
        "Denumirea,Raion,Proprietar\n\
         codrii,Strășeni,Ministerul Mediului\n\
         Plaiul Fagului,Ungheni,\n",
    );
    assert_eq!(
        second,
        ImportSummary {
            updated: 1,
            unchanged: 1,
            ..ImportSummary::default()
        }
    );

    let codrii = SqliteReserveRepository::new(&conn)
        .find_reserve_by_name("Codrii")
        .unwrap()
        .unwrap();
    assert_eq!(codrii.name, "Codrii");
    assert_eq!(codrii.owner.as_deref(), Some("Ministerul Mediului"));
    assert_eq!(codrii.area_ha, Some(5177.0));
    assert_eq!(codrii.coords_raw.as_deref(), Some("47°04′N 28°30′E"));
    let latitude = codrii.latitude.unwrap();
    assert!((latitude - (47.0 + 4.0 / 60.0)).abs() < 1e-9);
    assert_eq!(codrii.longitude, Some(28.5));
}

#[test]
fn reserve_import_accepts_a_blank_district() {
    let dir = tempfile::tempdir().unwrap();
    let mut conn = open_db_in_memory().unwrap();

    let summary = import(
        &mut conn,
        &dir,
        ImportKind::Reserves,
        "Denumirea,Raion\nSaharna,\n",
    );
    assert_eq!(summary.created, 1);

    let saharna = SqliteReserveRepository::new(&conn)
        .find_reserve_by_name("Saharna")
        .unwrap()
        .unwrap();
    assert_eq!(saharna.raion, None);
}

#[test]
fn storage_failure_rolls_back_the_whole_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TRIGGER reserves_refuse_row BEFORE INSERT ON reserves
         WHEN NEW.name = 'Orhei'
         BEGIN
             SELECT RAISE(ABORT, 'storage refused row');
         END;",
    )
    .unwrap();
    let path = write_csv(
        &dir,
        "reserves.csv",
        "Denumirea,Raion\n\
         Codrii,Strășeni\n\
         Orhei,Orhei\n\
         Saharna,Rezina\n",
    );

    let result = import_csv(&mut conn, ImportKind::Reserves, &path);
    assert!(
        matches!(result, Err(ImportError::Repo(RepoError::Db(_)))),
        "unexpected result: {result:?}"
    );
    let stored = SqliteReserveRepository::new(&conn)
        .list_reserves(&ListQuery::default())
        .unwrap();
    assert!(stored.is_empty());
}

#[test]
fn association_import_cleans_names_and_counts_repeats() {
    let dir = tempfile::tempdir().unwrap();
    let mut conn = open_db_in_memory().unwrap();

    let summary = import(
        &mut conn,
        &dir,
        ImportKind::Associations,
        "Denumirea\n\
         \"Quercetum roboris Borza 1937, \"\n\
         quercetum  roboris borza 1937\n\
         Stipetum capillatae\n\
         \"\"\n",
    );
    assert_eq!(
        summary,
        ImportSummary {
            created: 2,
            skipped: 1,
            duplicates_in_file: 1,
            ..ImportSummary::default()
        }
    );

    let names: Vec<String> = SqliteAssociationRepository::new(&conn)
        .list_associations(&ListQuery::default())
        .unwrap()
        .into_iter()
        .map(|association| association.name)
        .collect();
    assert_eq!(names, vec!["Quercetum roboris Borza 1937", "Stipetum capillatae"]);

    let again = import(
        &mut conn,
        &dir,
        ImportKind::Associations,
        "name\nStipetum capillatae\n",
    );
    assert_eq!(again.unchanged, 1);
    assert_eq!(again.created, 0);
}

#[test]
fn association_import_requires_a_name_column() {
    let dir = tempfile::tempdir().unwrap();
    let mut conn = open_db_in_memory().unwrap();
    let path = write_csv(&dir, "associations.csv", "Nume\nQuercetum roboris\n");

    match import_csv(&mut conn, ImportKind::Associations, &path) {
        Err(ImportError::MissingColumns(missing)) => {
            assert_eq!(missing, vec!["Denumirea or name".to_string()]);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

const SITE_HEADER: &str =
    "codul_sitului,denumirea,suprafata,numar_specii_pasari,alte_specii,habitate,latitudine,longitudine,STE,CONJ\n";

#[test]
fn site_import_upserts_by_code_and_skips_invalid_rows() {
    let dir = tempfile::tempdir().unwrap();
    let mut conn = open_db_in_memory().unwrap();

    let first = import(
        &mut conn,
        &dir,
        ImportKind::Sites,
        &format!(
            "{SITE_HEADER}\
             MD0000001,Lunca Prutului de Jos,\"1691,5\",120,,5,45.9,28.2,da,nu\n\
             MD0000002,Orhei,\"33 792\",n/a,14,7,123,28.8,,\n\
             ,Fără cod,10,1,1,1,47,28,da,da\n"
        ),
    );
    assert_eq!(
        first,
        ImportSummary {
            created: 1,
            skipped: 2,
            ..ImportSummary::default()
        }
    );

    let second = import(
        &mut conn,
        &dir,
        ImportKind::Sites,
        &format!("{SITE_HEADER}md0000001,Lunca Prutului,1700,130,3,6,45.9,28.2,nu,da\n"),
    );
    assert_eq!(second.updated, 1);

    let repo = SqliteSiteRepository::new(&conn);
    let site = repo.find_site_by_code("MD0000001").unwrap().unwrap();
    assert_eq!(site.name, "Lunca Prutului");
    assert_eq!(site.area_ha, 1700.0);
    assert_eq!(site.bird_species_count, 130);
    assert_eq!(site.habitats_count, 6);
    assert!(!site.ste);
    assert!(site.conj);
    assert!(repo.find_site_by_code("MD0000002").unwrap().is_none());
}

#[test]
fn reimporting_identical_sites_counts_them_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let mut conn = open_db_in_memory().unwrap();
    let content = format!(
        "{SITE_HEADER}\
         MD0000001,Lunca Prutului de Jos,\"1691,5\",120,14,5,45.9,28.2,da,nu\n"
    );

    let first = import(&mut conn, &dir, ImportKind::Sites, &content);
    assert_eq!(first.created, 1);

    let second = import(&mut conn, &dir, ImportKind::Sites, &content);
    assert_eq!(
        second,
        ImportSummary {
            unchanged: 1,
            ..ImportSummary::default()
        }
    );
}

#[test]
fn site_import_lists_missing_columns() {
    let dir = tempfile::tempdir().unwrap();
    let mut conn = open_db_in_memory().unwrap();
    let path = write_csv(
        &dir,
        "sites.csv",
        "codul_sitului,denumirea,suprafata,numar_specii_pasari,alte_specii,habitate,latitudine,longitudine\n",
    );

    match import_csv(&mut conn, ImportKind::Sites, &path) {
        Err(ImportError::MissingColumns(missing)) => {
            assert_eq!(missing, vec!["CONJ".to_string(), "STE".to_string()]);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn habitat_import_updates_codes_for_known_name_pairs() {
    let dir = tempfile::tempdir().unwrap();
    let mut conn = open_db_in_memory().unwrap();

    let first = import(
        &mut conn,
        &dir,
        ImportKind::Habitats,
        "denumirea_romana,denumirea_engleza,codul\n\
         Stepe ponto-sarmatice,Ponto-Sarmatic steppes,\n\
         Păduri aluviale,Alluvial forests,91E0\n\
         Fără traducere,,\n",
    );
    assert_eq!(
        first,
        ImportSummary {
            created: 2,
            skipped: 1,
            ..ImportSummary::default()
        }
    );

    let second = import(
        &mut conn,
        &dir,
        ImportKind::Habitats,
        "denumirea_romana,denumirea_engleza,codul\n\
         stepe ponto-sarmatice,PONTO-SARMATIC STEPPES,62C0\n\
         Păduri aluviale,Alluvial forests,91E0\n",
    );
    assert_eq!(
        second,
        ImportSummary {
            updated: 1,
            unchanged: 1,
            ..ImportSummary::default()
        }
    );

    let steppe = SqliteHabitatRepository::new(&conn)
        .find_habitat_by_code("62C0")
        .unwrap()
        .unwrap();
    assert_eq!(steppe.name_romanian, "Stepe ponto-sarmatice");
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut conn = open_db_in_memory().unwrap();
    let path = dir.path().join("absent.csv");

    assert!(matches!(
        import_csv(&mut conn, ImportKind::Species, &path),
        Err(ImportError::Io(_))
    ));
}
