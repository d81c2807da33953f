//! Legislative calendar helpers.
//!
//! A biennium opens in an odd year: 2025 and 2026 both belong to "2025-26".

use chrono::{Datelike, Local, NaiveDate};

/// Biennium containing `date`.
pub fn biennium_for(date: NaiveDate) -> String {
    let year = date.year();
    let start = if year % 2 == 1 { year } else { year - 1 };
    format!("{start}-{:02}", (start + 1) % 100)
}

pub fn current_biennium() -> String {
    biennium_for(Local::now().date_naive())
}

pub fn current_year() -> String {
    Local::now().year().to_string()
}

/// First year of a `YYYY-YY` biennium.
pub(crate) fn first_year(biennium: &str) -> &str {
    biennium.split('-').next().unwrap_or(biennium)
}
