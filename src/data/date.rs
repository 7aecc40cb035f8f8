// Date normalization and date-column heuristics
// Author: Gabriel Demetrios Lafis

use std::sync::OnceLock;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::Value as JsonValue;

use super::{ApiConfig, Row};

/// Column-name fragments that mark a column as date-like
pub const DATE_KEYWORDS: &[&str] = &[
    "date",
    "time",
    "day",
    "month",
    "year",
    "created",
    "updated",
    "block_date",
    "partition_0",
];

const DATE_FORMATS: &[&str] = &["%Y/%m/%d", "%m/%d/%Y", "%d %b %Y", "%b %d, %Y", "%B %d, %Y", "%d %B %Y"];

const DATETIME_FORMATS: &[&str] = &["%Y/%m/%d %H:%M:%S", "%m/%d/%Y %H:%M:%S"];

struct DatePatterns {
    day: Regex,
    month: Regex,
    year: Regex,
    date_like: Regex,
}

fn patterns() -> &'static DatePatterns {
    static PATTERNS: OnceLock<DatePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| DatePatterns {
        day: Regex::new(r"^([0-9]{4}-[0-9]{2}-[0-9]{2})").expect("valid day pattern"),
        month: Regex::new(r"^([0-9]{4}-[0-9]{2})\b").expect("valid month pattern"),
        year: Regex::new(r"^([0-9]{4})\b").expect("valid year pattern"),
        date_like: Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}|^[0-9]{4}-[0-9]{2}|[0-9]{4}$")
            .expect("valid date-like pattern"),
    })
}

/// Reduce a date-ish string to a sortable key.
///
/// `YYYY-MM-DD`, `YYYY-MM` and `YYYY` prefixes are kept as-is; anything else
/// that parses as a date becomes `YYYY-MM-DD`; unparseable input is returned
/// trimmed. Applying the function twice gives the same result as once.
pub fn normalize_date(raw: &str) -> String {
    let trimmed = raw.trim();
    let patterns = patterns();

    for pattern in [&patterns.day, &patterns.month, &patterns.year] {
        if let Some(captures) = pattern.captures(trimmed) {
            return captures[1].to_string();
        }
    }

    match parse_loose_date(trimmed) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => trimmed.to_string(),
    }
}

/// Whether a normalized date falls on or before `end`. A `YYYY` or `YYYY-MM`
/// end bound covers its whole year or month.
pub fn on_or_before(date: &str, end: &str) -> bool {
    date.get(..end.len()).unwrap_or(date) <= end
}

/// Normalize a JSON cell used as a join key
pub fn normalize_date_value(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) if !s.trim().is_empty() => Some(normalize_date(s)),
        JsonValue::Number(n) => Some(normalize_date(&n.to_string())),
        _ => None,
    }
}

fn parse_loose_date(input: &str) -> Option<NaiveDate> {
    let date = DateTime::parse_from_rfc3339(input)
        .or_else(|_| DateTime::parse_from_rfc2822(input))
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
        })?;

    // Keys must stay four-digit years to remain stable under re-normalization
    (1000..=9999).contains(&date.year()).then_some(date)
}

/// Whether a value looks like a date (`YYYY-MM-DD`, `YYYY-MM`, or ending in a year)
pub fn looks_like_date(value: &str) -> bool {
    patterns().date_like.is_match(value)
}

/// Whether a column name contains one of the date keywords
pub fn is_date_column_name(column: &str) -> bool {
    let lower = column.to_lowercase();
    DATE_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

/// Guess which columns of an API hold dates.
///
/// Name-based matches over the declared columns come first, followed by any
/// column whose value in the first sample row looks like a date.
pub fn detect_date_columns(api: &ApiConfig, sample_rows: &[Row]) -> Vec<String> {
    let mut detected: Vec<String> = api
        .columns
        .iter()
        .filter(|column| is_date_column_name(column))
        .cloned()
        .collect();

    if let Some(first) = sample_rows.first() {
        for (column, value) in first {
            let is_date_value = value.as_str().map_or(false, looks_like_date);
            if is_date_value && !detected.contains(column) {
                detected.push(column.clone());
            }
        }
    }

    detected
}
