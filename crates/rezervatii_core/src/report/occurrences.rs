//! Species occurrence filters by reserve or district.
//!
//! # Invariants
//! - "Rare" means the occurrence or its species is flagged rare.
//! - Rows are ordered by reserve, species, then year descending, and cut at
//!   the configured row cap.

use super::{Report, ReportResult};
use crate::model::name_key;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OccurrenceMode {
    #[default]
    ByReserveAll,
    ByReserveRare,
    ByRaionAll,
    ByRaionRare,
}

impl OccurrenceMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ByReserveAll => "by_reserve_all",
            Self::ByReserveRare => "by_reserve_rare",
            Self::ByRaionAll => "by_raion_all",
            Self::ByRaionRare => "by_raion_rare",
        }
    }

    fn rare_only(self) -> bool {
        matches!(self, Self::ByReserveRare | Self::ByRaionRare)
    }
}

impl FromStr for OccurrenceMode {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "" | "by_reserve_all" => Ok(Self::ByReserveAll),
            "by_reserve_rare" => Ok(Self::ByReserveRare),
            "by_raion_all" => Ok(Self::ByRaionAll),
            "by_raion_rare" => Ok(Self::ByRaionRare),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccurrenceFilter {
    pub mode: String,
    pub reserve_name: String,
    pub raion: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OccurrenceRow {
    pub reserve: String,
    pub raion: String,
    pub species_scientific: String,
    pub species_popular: String,
    pub year: i32,
    pub rare: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

pub fn filter_occurrences(
    conn: &Connection,
    filter: &OccurrenceFilter,
    row_cap: u32,
) -> ReportResult<Report<OccurrenceRow>> {
    let Ok(mode) = filter.mode.parse::<OccurrenceMode>() else {
        return Ok(Report::message("Mod invalid."));
    };

    // Districts are compared with Unicode lowercasing on the Rust side.
    let (condition, bind, raion_key) = match mode {
        OccurrenceMode::ByReserveAll | OccurrenceMode::ByReserveRare => {
            let reserve = filter.reserve_name.trim();
            if reserve.is_empty() {
                return Ok(Report::message("Alege o rezervație."));
            }
            ("r.name_key = ?1", vec![Value::Text(name_key(reserve))], None)
        }
        OccurrenceMode::ByRaionAll | OccurrenceMode::ByRaionRare => {
            let raion = filter.raion.trim();
            if raion.is_empty() {
                return Ok(Report::message("Alege un raion."));
            }
            ("r.raion IS NOT NULL", Vec::new(), Some(name_key(raion)))
        }
    };
    let rare_clause = if mode.rare_only() {
        " AND (o.is_rare = 1 OR s.is_rare = 1)"
    } else {
        ""
    };

    let sql = format!(
        "SELECT
            r.name,
            r.raion,
            s.scientific_name,
            s.popular_name,
            o.year,
            (o.is_rare = 1 OR s.is_rare = 1) AS rare,
            o.latitude,
            o.longitude
         FROM occurrences o
         JOIN reserves r ON r.id = o.reserve_id
         JOIN species s ON s.id = o.species_id
         WHERE {condition}{rare_clause}
         ORDER BY r.name_key ASC, s.name_key ASC, o.year DESC, o.id ASC;"
    );

    let cap = row_cap as usize;
    let mut stmt = conn.prepare(&sql)?;
    let mut result = stmt.query(params_from_iter(bind))?;
    let mut rows = Vec::new();
    let mut truncated = false;
    while let Some(row) = result.next()? {
        let raion: Option<String> = row.get(1)?;
        if let Some(wanted) = raion_key.as_deref() {
            if raion.as_deref().map(name_key).as_deref() != Some(wanted) {
                continue;
            }
        }
        if rows.len() == cap {
            truncated = true;
            break;
        }
        rows.push(OccurrenceRow {
            reserve: row.get(0)?,
            raion: raion.unwrap_or_default(),
            species_scientific: row.get(2)?,
            species_popular: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            year: row.get(4)?,
            rare: row.get::<_, i64>(5)? == 1,
            latitude: row.get(6)?,
            longitude: row.get(7)?,
        });
    }

    let mut report = Report::rows(rows);
    report.truncated = truncated;
    Ok(report)
}
