//! Formatting and parsing of instants as local date-time strings.
//!
//! Patterns use `chrono` strftime syntax. The default pattern keeps
//! millisecond precision, so a format then parse round trip is exact to the
//! millisecond.

use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

/// Default pattern: `2024-06-15 14:03:07.250`.
pub const DEFAULT_DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Errors raised while formatting or parsing dates.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    /// The pattern contains an unknown or malformed specifier.
    #[error("Invalid date pattern: {0}")]
    InvalidPattern(String),

    /// The text does not match the pattern.
    #[error("Cannot parse date: {0}")]
    Parse(#[from] chrono::ParseError),

    /// The parsed wall-clock time does not exist in the local time zone,
    /// for example inside a daylight-saving gap.
    #[error("Local time does not exist: {0}")]
    NonexistentLocalTime(String),
}

/// Formats `date` in the local time zone with [`DEFAULT_DATE_TIME_FORMAT`].
pub fn date_to_string(date: &DateTime<Utc>) -> String {
    date.with_timezone(&Local)
        .format(DEFAULT_DATE_TIME_FORMAT)
        .to_string()
}

/// Formats `date` in the local time zone with `pattern`.
///
/// # Errors
/// [`DateError::InvalidPattern`] if `pattern` is not a valid strftime pattern.
pub fn date_to_string_with(date: &DateTime<Utc>, pattern: &str) -> Result<String, DateError> {
    let items = parse_pattern(pattern)?;
    let mut formatted = String::new();
    write!(
        formatted,
        "{}",
        date.with_timezone(&Local).format_with_items(items.into_iter())
    )
    .map_err(|_| DateError::InvalidPattern(pattern.to_string()))?;
    Ok(formatted)
}

/// Parses a local date-time written with [`DEFAULT_DATE_TIME_FORMAT`].
pub fn date_from_string(text: &str) -> Result<DateTime<Utc>, DateError> {
    date_from_string_with(text, DEFAULT_DATE_TIME_FORMAT)
}

/// Parses a local date-time written with `pattern`.
///
/// The pattern must carry both a date and a time. When the local time is
/// ambiguous (a daylight-saving overlap) the earlier instant is returned.
pub fn date_from_string_with(text: &str, pattern: &str) -> Result<DateTime<Utc>, DateError> {
    parse_pattern(pattern)?;
    let naive = NaiveDateTime::parse_from_str(text, pattern)?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| DateError::NonexistentLocalTime(text.to_string()))
}

fn parse_pattern(pattern: &str) -> Result<Vec<Item<'_>>, DateError> {
    let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(DateError::InvalidPattern(pattern.to_string()));
    }
    Ok(items)
}
