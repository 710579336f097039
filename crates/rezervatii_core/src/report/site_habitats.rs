//! Site-habitat filters by site, habitat or year.

use super::{parse_year_param, Report, ReportResult};
use crate::model::name_key;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SiteHabitatMode {
    #[default]
    BySite,
    /// Matches the habitat's Romanian name, English name or code.
    ByHabitat,
    ByYear,
}

impl SiteHabitatMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BySite => "by_site",
            Self::ByHabitat => "by_habitat",
            Self::ByYear => "by_year",
        }
    }
}

impl FromStr for SiteHabitatMode {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "" | "by_site" => Ok(Self::BySite),
            "by_habitat" => Ok(Self::ByHabitat),
            "by_year" => Ok(Self::ByYear),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteHabitatFilter {
    pub mode: String,
    pub site_name: String,
    pub habitat_name: String,
    pub year: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SiteHabitatRow {
    pub site: String,
    pub habitat_romanian: String,
    pub habitat_english: String,
    pub habitat_code: String,
    pub year: i32,
    pub surface: Option<f64>,
    pub notes: String,
}

const SELECT_SQL: &str = "SELECT
    s.name,
    h.name_romanian,
    h.name_english,
    h.code,
    l.year,
    l.surface,
    l.notes
FROM site_habitats l
JOIN sites s ON s.id = l.site_id
JOIN habitats h ON h.id = l.habitat_id";

pub fn filter_site_habitats(
    conn: &Connection,
    filter: &SiteHabitatFilter,
) -> ReportResult<Report<SiteHabitatRow>> {
    const PICK_FILTER: &str = "Selectează un filtru.";

    let Ok(mode) = filter.mode.parse::<SiteHabitatMode>() else {
        return Ok(Report::message(PICK_FILTER));
    };

    let (condition, order, bind) = match mode {
        SiteHabitatMode::BySite => {
            let site = filter.site_name.trim();
            if site.is_empty() {
                return Ok(Report::message(PICK_FILTER));
            }
            (
                "s.name_key = ?1",
                "l.year ASC, h.name_romanian_key ASC, h.name_english_key ASC",
                vec![Value::Text(name_key(site))],
            )
        }
        SiteHabitatMode::ByHabitat => {
            let habitat = filter.habitat_name.trim();
            if habitat.is_empty() {
                return Ok(Report::message(PICK_FILTER));
            }
            (
                "(h.name_romanian_key = ?1 OR h.name_english_key = ?1 OR lower(h.code) = ?1)",
                "l.year ASC, s.name_key ASC",
                vec![Value::Text(name_key(habitat))],
            )
        }
        SiteHabitatMode::ByYear => {
            let Some(year) = parse_year_param(&filter.year) else {
                return Ok(Report::message(PICK_FILTER));
            };
            (
                "l.year = ?1",
                "s.name_key ASC, h.name_romanian_key ASC, h.name_english_key ASC",
                vec![Value::Integer(i64::from(year))],
            )
        }
    };

    let sql = format!("{SELECT_SQL} WHERE {condition} ORDER BY {order}, l.id ASC;");
    let mut stmt = conn.prepare(&sql)?;
    let mapped = stmt.query_map(params_from_iter(bind), |row| {
        Ok(SiteHabitatRow {
            site: row.get(0)?,
            habitat_romanian: row.get(1)?,
            habitat_english: row.get(2)?,
            habitat_code: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            year: row.get(4)?,
            surface: row.get(5)?,
            notes: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        })
    })?;
    let mut rows = Vec::new();
    for row in mapped {
        rows.push(row?);
    }
    Ok(Report::rows(rows))
}
