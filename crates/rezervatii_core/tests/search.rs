use rezervatii_core::config::{SearchBackend, SearchConfig};
use rezervatii_core::db::migrations::apply_migrations;
use rezervatii_core::db::open_db_in_memory;
use rezervatii_core::model::association::Association;
use rezervatii_core::model::reserve::Reserve;
use rezervatii_core::model::species::Species;
use rezervatii_core::repo::association_repo::{AssociationRepository, SqliteAssociationRepository};
use rezervatii_core::repo::reserve_repo::{ReserveRepository, SqliteReserveRepository};
use rezervatii_core::repo::species_repo::{SpeciesRepository, SqliteSpeciesRepository};
use rezervatii_core::search::{scoring_path, search_catalog, EntityKind, PageRequest, ScoringPath};
use rusqlite::Connection;

fn seed_species(conn: &Connection) {
    let repo = SqliteSpeciesRepository::new(conn);
    for name in ["Stipa pennata", "Adonis vernalis", "Stipa capillata"] {
        repo.create_species(&Species::new(name))
            .expect("create species");
    }
}

fn in_process() -> SearchConfig {
    SearchConfig {
        backend: SearchBackend::InProcess,
        ..SearchConfig::default()
    }
}

fn labels(conn: &Connection, kind: EntityKind, query: &str, config: &SearchConfig) -> Vec<String> {
    search_catalog(conn, kind, query, config, PageRequest::default())
        .expect("search should succeed")
        .items
        .into_iter()
        .map(|hit| hit.label)
        .collect()
}

#[test]
fn in_process_search_tolerates_typos() {
    let conn = open_db_in_memory().expect("in-memory database");
    seed_species(&conn);

    let found = labels(&conn, EntityKind::Species, "stipa capilata", &in_process());
    assert_eq!(found.first().map(String::as_str), Some("Stipa capillata"));
    assert!(!found.iter().any(|label| label == "Adonis vernalis"));
}

#[test]
fn in_process_search_ignores_accents_and_case() {
    let conn = open_db_in_memory().expect("in-memory database");
    let repo = SqliteReserveRepository::new(&conn);
    let mut reserve = Reserve::new("Pădurea Domnească");
    reserve.raion = Some("Glodeni".to_string());
    repo.create_reserve(&reserve).expect("create reserve");
    repo.create_reserve(&Reserve::new("Codrii"))
        .expect("create reserve");

    let page = search_catalog(
        &conn,
        EntityKind::Reserves,
        "PADUREA domneasca",
        &in_process(),
        PageRequest::default(),
    )
    .expect("search should succeed");

    let best = &page.items[0];
    assert_eq!(best.label, "Pădurea Domnească");
    assert_eq!(best.detail.as_deref(), Some("Glodeni"));
    assert!(best.score.expect("scored hit") > 1.0);
}

#[test]
fn blank_query_lists_everything_alphabetically_without_scores() {
    let conn = open_db_in_memory().expect("in-memory database");
    seed_species(&conn);

    let page = search_catalog(
        &conn,
        EntityKind::Species,
        "   ",
        &SearchConfig::default(),
        PageRequest::default(),
    )
    .expect("search should succeed");

    assert_eq!(page.total, 3);
    let names: Vec<&str> = page.items.iter().map(|hit| hit.label.as_str()).collect();
    assert_eq!(names, vec!["Adonis vernalis", "Stipa capillata", "Stipa pennata"]);
    assert!(page.items.iter().all(|hit| hit.score.is_none()));
}

#[test]
fn blank_query_is_not_limited_by_the_candidate_cap() {
    let config = SearchConfig {
        candidate_cap: 2,
        ..SearchConfig::default()
    };
    let mut plain = Connection::open_in_memory().expect("in-memory connection");
    apply_migrations(&mut plain).expect("migrations should apply");
    let with_functions = open_db_in_memory().expect("in-memory database");

    for conn in [&plain, &with_functions] {
        let repo = SqliteSpeciesRepository::new(conn);
        for name in ["Zelkova carpinifolia", "Yucca filamentosa", "Acer campestre"] {
            repo.create_species(&Species::new(name))
                .expect("create species");
        }

        let page = search_catalog(conn, EntityKind::Species, "", &config, PageRequest::default())
            .expect("search should succeed");
        assert_eq!(page.total, 3);
        let names: Vec<&str> = page.items.iter().map(|hit| hit.label.as_str()).collect();
        assert_eq!(
            names,
            vec!["Acer campestre", "Yucca filamentosa", "Zelkova carpinifolia"]
        );
    }
}

#[test]
fn registered_functions_select_the_trigram_path() {
    let conn = open_db_in_memory().expect("in-memory database");
    seed_species(&conn);
    assert_eq!(scoring_path(&conn, SearchBackend::Auto), ScoringPath::Trigram);

    let found = labels(&conn, EntityKind::Species, "stipa", &SearchConfig::default());
    assert_eq!(found, vec!["Stipa capillata", "Stipa pennata"]);
}

#[test]
fn trigram_threshold_is_inclusive() {
    let conn = open_db_in_memory().expect("in-memory database");
    let repo = SqliteAssociationRepository::new(&conn);
    repo.create_association(&Association::new("Two words"))
        .expect("create association");
    repo.create_association(&Association::new("Sword"))
        .expect("create association");

    let mut config = SearchConfig::default();
    config.trigram.associations = 0.8;

    let page = search_catalog(
        &conn,
        EntityKind::Associations,
        "word",
        &config,
        PageRequest::default(),
    )
    .expect("search should succeed");
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].label, "Two words");
    assert_eq!(page.items[0].score, Some(0.8));
}

#[test]
fn trigram_prefix_matches_rank_above_better_scores() {
    let conn = open_db_in_memory().expect("in-memory database");
    let repo = SqliteAssociationRepository::new(&conn);
    repo.create_association(&Association::new("Festuca stipa"))
        .expect("create association");
    repo.create_association(&Association::new("Stipagrostis plumosa"))
        .expect("create association");

    let page = search_catalog(
        &conn,
        EntityKind::Associations,
        "stipa",
        &SearchConfig::default(),
        PageRequest::default(),
    )
    .expect("search should succeed");

    let names: Vec<&str> = page.items.iter().map(|hit| hit.label.as_str()).collect();
    assert_eq!(names, vec!["Stipagrostis plumosa", "Festuca stipa"]);
    let prefix_score = page.items[0].score.expect("scored hit");
    let inner_score = page.items[1].score.expect("scored hit");
    assert!(prefix_score < inner_score);
}

#[test]
fn connection_without_functions_falls_back_to_in_process_ranking() {
    let mut conn = Connection::open_in_memory().expect("in-memory connection");
    apply_migrations(&mut conn).expect("migrations should apply");
    seed_species(&conn);

    let mut config = SearchConfig::default();
    config.backend = SearchBackend::Trigram;
    assert_eq!(scoring_path(&conn, config.backend), ScoringPath::InProcess);

    let found = labels(&conn, EntityKind::Species, "Stipa capillata", &config);
    assert_eq!(found.first().map(String::as_str), Some("Stipa capillata"));
}

#[test]
fn pages_report_the_full_total() {
    let conn = open_db_in_memory().expect("in-memory database");
    seed_species(&conn);

    let page = search_catalog(
        &conn,
        EntityKind::Species,
        "",
        &SearchConfig::default(),
        PageRequest::new(2, 2),
    )
    .expect("search should succeed");
    assert_eq!(page.total, 3);
    assert_eq!(page.total_pages(), 2);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].label, "Stipa pennata");

    let trigram = search_catalog(
        &conn,
        EntityKind::Species,
        "stipa",
        &SearchConfig::default(),
        PageRequest::new(2, 1),
    )
    .expect("search should succeed");
    assert_eq!(trigram.total, 2);
    assert_eq!(trigram.items[0].label, "Stipa pennata");
}

#[test]
fn hits_serialize_with_snake_case_kind() {
    let conn = open_db_in_memory().expect("in-memory database");
    seed_species(&conn);

    let page = search_catalog(
        &conn,
        EntityKind::Species,
        "adonis",
        &SearchConfig::default(),
        PageRequest::default(),
    )
    .expect("search should succeed");
    let json = serde_json::to_value(&page).expect("page should serialize");

    assert_eq!(json["total"], 1);
    assert_eq!(json["items"][0]["kind"], "species");
    assert_eq!(json["items"][0]["label"], "Adonis vernalis");
    assert!(json["items"][0]["detail"].is_null());
}
