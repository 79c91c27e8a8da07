//! Internal helpers for input normalization and parsing.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation so every write path enforces the same record invariants.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::{EngineError, ResultEngine};

const DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Trim a required text field, rejecting missing or blank values.
pub(crate) fn normalize_required_text(value: Option<&str>, label: &str) -> ResultEngine<String> {
    let trimmed = value.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidField(format!("{label} is required")));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Parse a signed amount in minor units.
pub(crate) fn parse_amount(value: Option<&str>) -> ResultEngine<i64> {
    let raw = normalize_required_text(value, "amount")?;
    raw.parse::<i64>()
        .map_err(|_| EngineError::InvalidField(format!("amount '{raw}' is not an integer")))
}

/// Parse a calendar date or timestamp into UTC.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM[:SS]` (space or `T` separated)
/// and RFC 3339. Values without an offset are read as UTC.
pub(crate) fn parse_date(value: Option<&str>) -> ResultEngine<DateTime<Utc>> {
    let raw = normalize_required_text(value, "date")?;

    if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&raw, format) {
            return Ok(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| EngineError::InvalidField(format!("date '{raw}' is not a valid date")))
}
