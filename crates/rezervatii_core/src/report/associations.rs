//! Association-by-reserve-and-year filters.

use super::{parse_year_param, Report, ReportResult};
use crate::model::name_key;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssociationMode {
    /// Associations of one reserve in one year.
    #[default]
    ByReserveYear,
    /// Every year of one reserve.
    ByReserveAllYears,
    /// Every reserve in one year.
    ByYearAllReserves,
}

impl AssociationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ByReserveYear => "by_reserve_year",
            Self::ByReserveAllYears => "by_reserve_all_years",
            Self::ByYearAllReserves => "by_year_all_reserves",
        }
    }
}

impl FromStr for AssociationMode {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "" | "by_reserve_year" => Ok(Self::ByReserveYear),
            "by_reserve_all_years" => Ok(Self::ByReserveAllYears),
            "by_year_all_reserves" => Ok(Self::ByYearAllReserves),
            _ => Err(()),
        }
    }
}

/// Raw filter inputs; blank means "not provided".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssociationFilter {
    pub mode: String,
    pub reserve_name: String,
    pub year: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationRow {
    pub reserve: String,
    pub association: String,
    pub year: i32,
    pub notes: String,
}

const SELECT_SQL: &str = "SELECT r.name, a.name, l.year, l.notes
FROM reserve_association_years l
JOIN reserves r ON r.id = l.reserve_id
JOIN associations a ON a.id = l.association_id";

pub fn filter_associations(
    conn: &Connection,
    filter: &AssociationFilter,
) -> ReportResult<Report<AssociationRow>> {
    let Ok(mode) = filter.mode.parse::<AssociationMode>() else {
        return Ok(Report::message("Mod invalid."));
    };
    let reserve = filter.reserve_name.trim();
    let year = parse_year_param(&filter.year);

    let (condition, order, bind) = match mode {
        AssociationMode::ByReserveYear => {
            let Some(year) = year.filter(|_| !reserve.is_empty()) else {
                return Ok(Report::message("Alege o rezervație și un an."));
            };
            (
                "r.name_key = ?1 AND l.year = ?2",
                "a.name_key ASC",
                vec![Value::Text(name_key(reserve)), Value::Integer(i64::from(year))],
            )
        }
        AssociationMode::ByReserveAllYears => {
            if reserve.is_empty() {
                return Ok(Report::message("Alege o rezervație."));
            }
            (
                "r.name_key = ?1",
                "l.year DESC, a.name_key ASC",
                vec![Value::Text(name_key(reserve))],
            )
        }
        AssociationMode::ByYearAllReserves => {
            let Some(year) = year else {
                return Ok(Report::message("Alege un an."));
            };
            (
                "l.year = ?1",
                "r.name_key ASC, a.name_key ASC",
                vec![Value::Integer(i64::from(year))],
            )
        }
    };

    let sql = format!("{SELECT_SQL} WHERE {condition} ORDER BY {order}, l.id ASC;");
    let mut stmt = conn.prepare(&sql)?;
    let mapped = stmt.query_map(params_from_iter(bind), |row| {
        Ok(AssociationRow {
            reserve: row.get(0)?,
            association: row.get(1)?,
            year: row.get(2)?,
            notes: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        })
    })?;
    let mut rows = Vec::new();
    for row in mapped {
        rows.push(row?);
    }
    Ok(Report::rows(rows))
}
