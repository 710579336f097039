//! Catalog search over species, reserves, associations, sites and habitats.
//!
//! # Responsibility
//! - Pick a scoring path per connection: trigram SQL functions or the
//!   in-process ranker.
//! - Return ordered, paginated hits with id, label, detail and score.
//!
//! # Invariants
//! - Query text never causes an error; only storage failures surface.
//! - Blank queries list every record alphabetically without scores; the
//!   candidate cap does not apply to them.
//! - In-process scoring loads `id` plus searchable columns only, capped by
//!   `candidate_cap`.
//! - Logs carry query length, never query text.

use super::normalize::{normalize, AccentFolding};
use super::page::{page_offset, paginate, Page, PageRequest};
use super::rank::{rank_candidates, Searchable};
use super::trigram::{search_functions_available, SQL_SIMILARITY, SQL_UNACCENT, SQL_WORD_SIMILARITY};
use crate::config::{SearchBackend, SearchConfig};
use crate::db::DbError;
use crate::model::RecordId;
use log::{error, info, warn};
use rusqlite::{params, Connection, Row};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Instant;

pub type SearchResult<T> = Result<T, SearchError>;

#[derive(Debug)]
pub enum SearchError {
    Db(DbError),
    InvalidData(String),
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid search row: {message}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for SearchError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SearchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Searchable record kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Species,
    Reserves,
    Associations,
    Sites,
    Habitats,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        Self::Species,
        Self::Reserves,
        Self::Associations,
        Self::Sites,
        Self::Habitats,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Species => "species",
            Self::Reserves => "reserves",
            Self::Associations => "associations",
            Self::Sites => "sites",
            Self::Habitats => "habitats",
        }
    }

    fn table(self) -> &'static str {
        match self {
            Self::Species => "species",
            Self::Reserves => "reserves",
            Self::Associations => "associations",
            Self::Sites => "sites",
            Self::Habitats => "habitats",
        }
    }

    /// Searchable columns; the first one is the label, the second the detail.
    fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Species => &["scientific_name", "popular_name"],
            Self::Reserves => &["name", "raion"],
            Self::Associations => &["name"],
            Self::Sites => &["name", "code"],
            Self::Habitats => &["name_romanian", "name_english", "code"],
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "species" => Ok(Self::Species),
            "reserves" | "reserve" => Ok(Self::Reserves),
            "associations" | "association" => Ok(Self::Associations),
            "sites" | "site" => Ok(Self::Sites),
            "habitats" | "habitat" => Ok(Self::Habitats),
            other => Err(format!(
                "unknown entity kind `{other}`; expected species|reserves|associations|sites|habitats"
            )),
        }
    }
}

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub kind: EntityKind,
    pub id: RecordId,
    pub label: String,
    pub detail: Option<String>,
    /// `None` when the query was blank.
    pub score: Option<f64>,
}

/// Scoring path chosen for one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringPath {
    Trigram,
    InProcess,
}

impl ScoringPath {
    fn as_str(self) -> &'static str {
        match self {
            Self::Trigram => "trigram",
            Self::InProcess => "in_process",
        }
    }
}

/// Resolves the configured backend against what `conn` actually exposes.
pub fn scoring_path(conn: &Connection, backend: SearchBackend) -> ScoringPath {
    match backend {
        SearchBackend::InProcess => ScoringPath::InProcess,
        SearchBackend::Auto | SearchBackend::Trigram => {
            if search_functions_available(conn) {
                return ScoringPath::Trigram;
            }
            if backend == SearchBackend::Trigram {
                warn!(
                    "event=search_backend module=search status=fallback requested=trigram used=in_process"
                );
            }
            ScoringPath::InProcess
        }
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    id: RecordId,
    fields: Vec<Option<String>>,
}

impl Candidate {
    fn into_hit(self, kind: EntityKind, score: Option<f64>) -> SearchHit {
        let mut fields = self.fields.into_iter();
        let label = fields.next().flatten().unwrap_or_default();
        let detail = fields.next().flatten().filter(|value| !value.trim().is_empty());
        SearchHit {
            kind,
            id: self.id,
            label,
            detail,
            score,
        }
    }
}

impl Searchable for Candidate {
    fn primary_name(&self) -> &str {
        self.fields
            .first()
            .and_then(|field| field.as_deref())
            .unwrap_or_default()
    }

    fn search_fields(&self) -> Vec<Option<&str>> {
        self.fields.iter().map(Option::as_deref).collect()
    }
}

/// Searches one entity kind and returns the requested page.
pub fn search_catalog(
    conn: &Connection,
    kind: EntityKind,
    query: &str,
    config: &SearchConfig,
    request: PageRequest,
) -> SearchResult<Page<SearchHit>> {
    let started_at = Instant::now();
    let (page, per_page) = request.resolve(config.default_per_page, config.max_per_page);
    let folded_query = normalize(query);

    let (path, result) = if folded_query.is_empty() {
        ("unscored", list_alphabetical(conn, kind, config, page, per_page))
    } else {
        let path = scoring_path(conn, config.backend);
        let result = match path {
            ScoringPath::Trigram => search_trigram(
                conn,
                kind,
                &folded_query,
                config.trigram_threshold(kind),
                page,
                per_page,
            ),
            ScoringPath::InProcess => {
                search_in_process(conn, kind, query, config, page, per_page)
            }
        };
        (path.as_str(), result)
    };

    match &result {
        Ok(found) => info!(
            "event=search module=search status=ok kind={} path={} query_len={} total={} page={} duration_ms={}",
            kind,
            path,
            folded_query.chars().count(),
            found.total,
            page,
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=search module=search status=error kind={} path={} query_len={} duration_ms={} error={}",
            kind,
            path,
            folded_query.chars().count(),
            started_at.elapsed().as_millis(),
            err
        ),
    }

    result
}

fn search_in_process(
    conn: &Connection,
    kind: EntityKind,
    query: &str,
    config: &SearchConfig,
    page: u32,
    per_page: u32,
) -> SearchResult<Page<SearchHit>> {
    let candidates = load_candidates(conn, kind, Some(config.candidate_cap))?;
    let ranked = rank_candidates(query, candidates, &AccentFolding, &config.rank_options());
    Ok(paginate(ranked, page, per_page).map(|ranked| ranked.record.into_hit(kind, ranked.score)))
}

/// Every record of `kind` ordered by folded label, without scores.
///
/// Pages in SQL when the fold function is registered; otherwise loads the
/// whole projection and sorts it in-process.
fn list_alphabetical(
    conn: &Connection,
    kind: EntityKind,
    config: &SearchConfig,
    page: u32,
    per_page: u32,
) -> SearchResult<Page<SearchHit>> {
    if !search_functions_available(conn) {
        let candidates = load_candidates(conn, kind, None)?;
        let ordered = rank_candidates("", candidates, &AccentFolding, &config.rank_options());
        return Ok(paginate(ordered, page, per_page).map(|ranked| ranked.record.into_hit(kind, None)));
    }

    let columns = kind.columns();
    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {};", kind.table()),
        [],
        |row| row.get(0),
    )?;
    let offset = i64::try_from(page_offset(page, per_page))
        .map_err(|_| SearchError::InvalidData(format!("page {page} is out of range")))?;

    let sql = format!(
        "SELECT id, {columns} FROM {table}
         ORDER BY {SQL_UNACCENT}({label}) ASC, {label} ASC, id ASC
         LIMIT ?1 OFFSET ?2;",
        columns = columns.join(", "),
        table = kind.table(),
        label = columns[0],
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![i64::from(per_page), offset])?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse_candidate(row, columns.len())?.into_hit(kind, None));
    }

    let total = u64::try_from(total)
        .map_err(|_| SearchError::InvalidData(format!("negative row count {total}")))?;
    Ok(Page {
        items,
        page,
        per_page,
        total,
    })
}

/// Loads `id` plus the searchable columns, at most `cap` rows when set.
fn load_candidates(
    conn: &Connection,
    kind: EntityKind,
    cap: Option<u32>,
) -> SearchResult<Vec<Candidate>> {
    let columns = kind.columns();
    let limit = if cap.is_some() { " LIMIT ?1" } else { "" };
    let sql = format!(
        "SELECT id, {} FROM {} ORDER BY id ASC{limit};",
        columns.join(", "),
        kind.table()
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = match cap {
        Some(cap) => stmt.query([i64::from(cap)])?,
        None => stmt.query([])?,
    };
    let mut candidates = Vec::new();
    while let Some(row) = rows.next()? {
        candidates.push(parse_candidate(row, columns.len())?);
    }
    Ok(candidates)
}

fn search_trigram(
    conn: &Connection,
    kind: EntityKind,
    folded_query: &str,
    threshold: f64,
    page: u32,
    per_page: u32,
) -> SearchResult<Page<SearchHit>> {
    let columns = kind.columns();
    let scored = scored_projection_sql(kind);

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM ({scored}) WHERE score >= ?2;"),
        params![folded_query, threshold],
        |row| row.get(0),
    )?;

    let sql = format!(
        "SELECT id, {columns}, score
         FROM ({scored})
         WHERE score >= ?2
         ORDER BY starts DESC, score DESC, {SQL_UNACCENT}({label}) ASC, id ASC
         LIMIT ?3 OFFSET ?4;",
        columns = columns.join(", "),
        label = columns[0],
    );
    let offset = i64::try_from(page_offset(page, per_page))
        .map_err(|_| SearchError::InvalidData(format!("page {page} is out of range")))?;

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![folded_query, threshold, i64::from(per_page), offset])?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        let candidate = parse_candidate(row, columns.len())?;
        let score: f64 = row.get(columns.len() + 1)?;
        items.push(candidate.into_hit(kind, Some(score)));
    }

    let total = u64::try_from(total)
        .map_err(|_| SearchError::InvalidData(format!("negative hit count {total}")))?;
    Ok(Page {
        items,
        page,
        per_page,
        total,
    })
}

/// Per-row `score` (best trigram or word similarity over every column) and
/// `starts` (any folded column begins with the query). `?1` is the folded query.
fn scored_projection_sql(kind: EntityKind) -> String {
    let columns = kind.columns();
    let score_terms = columns
        .iter()
        .flat_map(|column| {
            [
                format!("{SQL_SIMILARITY}({SQL_UNACCENT}({column}), ?1)"),
                format!("{SQL_WORD_SIMILARITY}(?1, {SQL_UNACCENT}({column}))"),
            ]
        })
        .collect::<Vec<_>>()
        .join(", ");
    let starts_terms = columns
        .iter()
        .map(|column| {
            format!("COALESCE(substr({SQL_UNACCENT}({column}), 1, length(?1)) = ?1, 0)")
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "SELECT id, {columns}, MAX({score_terms}, 0.0) AS score, MAX({starts_terms}, 0) AS starts FROM {table}",
        columns = columns.join(", "),
        table = kind.table(),
    )
}

fn parse_candidate(row: &Row<'_>, field_count: usize) -> SearchResult<Candidate> {
    let id: RecordId = row.get(0)?;
    let mut fields = Vec::with_capacity(field_count);
    for index in 1..=field_count {
        fields.push(row.get::<_, Option<String>>(index)?);
    }
    if fields.first().map_or(true, Option::is_none) {
        return Err(SearchError::InvalidData(format!(
            "record {id} has no display name"
        )));
    }
    Ok(Candidate { id, fields })
}

#[cfg(test)]
mod tests {
    use super::{scored_projection_sql, EntityKind};

    #[test]
    fn entity_kind_parses_singular_and_plural() {
        assert_eq!("Species".parse::<EntityKind>(), Ok(EntityKind::Species));
        assert_eq!("site".parse::<EntityKind>(), Ok(EntityKind::Sites));
        assert!("plants".parse::<EntityKind>().is_err());
    }

    #[test]
    fn projection_scores_every_column() {
        let sql = scored_projection_sql(EntityKind::Habitats);
        for column in ["name_romanian", "name_english", "code"] {
            assert!(sql.contains(&format!("rz_similarity(rz_unaccent({column}), ?1)")));
            assert!(sql.contains(&format!("rz_word_similarity(?1, rz_unaccent({column}))")));
        }
        assert!(sql.ends_with("FROM habitats"));
    }
}
