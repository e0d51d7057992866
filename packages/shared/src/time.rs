//! Time helpers for wire timestamps.
//!
//! The backend emits ISO-8601 strings, sometimes without an offset
//! (`2024-01-01T00:00:00.123456`). Offset-less values are interpreted as UTC.

use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, Utc};

/// Current time as an RFC 3339 string in UTC (e.g. `2024-01-01T00:00:00.000Z`).
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an ISO-8601 timestamp into UTC.
///
/// Returns `None` when the value is neither RFC 3339 nor a naive
/// `YYYY-MM-DDTHH:MM:SS[.fff]` / `YYYY-MM-DD HH:MM:SS[.fff]` timestamp.
pub fn parse_iso8601(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

/// Format a UTC instant as local wall-clock time (`HH:MM:SS`).
pub fn format_local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M:%S").to_string()
}

/// Format a wire timestamp for display, falling back to the raw value.
pub fn display_timestamp(value: &str) -> String {
    parse_iso8601(value)
        .map(format_local_time)
        .unwrap_or_else(|| value.to_string())
}
