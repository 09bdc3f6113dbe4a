//! Lenient timestamp parsing for inbound payloads.
//!
//! Import files and API clients send timestamps in several shapes. All of
//! them are normalized to [`DateTime<Utc>`]; naive values are taken as UTC.
//!
//! Accepted forms:
//!
//! | Example | Shape |
//! |---------|-------|
//! | `2024-03-01T10:15:00+02:00` | RFC 3339 |
//! | `2024-03-01T10:15:00` | naive, `T` separator |
//! | `2024-03-01 10:15:00` | naive, space separator |
//! | `2024-03-01` | date only (midnight) |

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Returned when text matches none of the accepted timestamp shapes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized timestamp: {0:?}")]
pub struct TimestampError(pub String);

/// Parse a timestamp in any of the accepted shapes.
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, TimestampError> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| TimestampError(text.to_owned()))
}

/// Serde helper for `Option<DateTime<Utc>>` draft fields.
///
/// Missing, `null`, and blank values all become `None`.
pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        Some(text) if !text.trim().is_empty() => parse_timestamp(&text)
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}
