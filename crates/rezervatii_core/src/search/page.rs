//! Page request normalization and slicing.
//!
//! # Invariants
//! - Pages are 1-based; page `0` or garbage input means page `1`.
//! - `per_page` is never zero and never above the configured maximum.

use serde::Serialize;

/// Requested page as received from a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageRequest {
    pub page: u32,
    /// `0` selects the configured default.
    pub per_page: u32,
}

impl PageRequest {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self { page, per_page }
    }

    /// Parses raw query parameters, treating anything unparsable as missing.
    pub fn from_params(page: Option<&str>, per_page: Option<&str>) -> Self {
        let parse = |value: Option<&str>| {
            value
                .and_then(|value| value.trim().parse::<u32>().ok())
                .unwrap_or(0)
        };
        Self {
            page: parse(page),
            per_page: parse(per_page),
        }
    }

    /// Applies defaults and bounds; returns `(page, per_page)`.
    pub fn resolve(self, default_per_page: u32, max_per_page: u32) -> (u32, u32) {
        let max_per_page = max_per_page.max(1);
        let per_page = match self.per_page {
            0 => default_per_page.max(1),
            value => value,
        }
        .min(max_per_page);
        (self.page.max(1), per_page)
    }
}

/// One page of results plus the size of the full filtered set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        if self.per_page == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.per_page))
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
        }
    }
}

/// Offset of the first row on `page`.
pub(crate) fn page_offset(page: u32, per_page: u32) -> u64 {
    u64::from(page.saturating_sub(1)) * u64::from(per_page)
}

/// Cuts an already ordered list down to one page.
pub fn paginate<T>(items: Vec<T>, page: u32, per_page: u32) -> Page<T> {
    let total = items.len() as u64;
    let offset = usize::try_from(page_offset(page, per_page)).unwrap_or(usize::MAX);
    let items = items
        .into_iter()
        .skip(offset)
        .take(per_page as usize)
        .collect();
    Page {
        items,
        page,
        per_page,
        total,
    }
}
