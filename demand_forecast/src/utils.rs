//! Calendar helpers shared by the aggregation and horizon code
//!
//! Months are keyed as `year * 100 + month`, e.g. `202403` for March 2024.

use chrono::{Datelike, NaiveDate, NaiveDateTime};

/// Day-first formats seen in kardex exports, then ISO fallbacks
const DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S%.f",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%Y-%m-%d", "%Y/%m/%d"];

/// Build a month key from a year and a 1-based month
pub fn month_key(year: i32, month: u32) -> u32 {
    (year as u32) * 100 + month
}

/// Split a month key into `(year, month)`
pub fn split_month_key(key: u32) -> (i32, u32) {
    ((key / 100) as i32, key % 100)
}

/// Move `offset` calendar months forward from `(year, month)`
pub fn add_months(year: i32, month: u32, offset: u32) -> (i32, u32) {
    let zero_based = month as i64 - 1 + offset as i64;
    (year + (zero_based / 12) as i32, (zero_based % 12) as u32 + 1)
}

/// Quarter (1-4) of a 1-based month
pub fn quarter_of(month: u32) -> u32 {
    (month - 1) / 3 + 1
}

/// Parse a transaction timestamp, day-first
///
/// Returns `None` for blank or unrecognised values; callers fall back to
/// synthetic months.
pub fn parse_transaction_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        })
}

/// Month key of a parsed date
pub fn month_key_of(date: NaiveDate) -> u32 {
    month_key(date.year(), date.month())
}

/// Format `(year, month)` as `YYYY-MM`
pub fn month_label(year: i32, month: u32) -> String {
    format!("{:04}-{:02}", year, month)
}
