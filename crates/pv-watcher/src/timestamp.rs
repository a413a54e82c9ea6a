//! Timestamp decoding for preview status payloads.
//!
//! Preview servers are not consistent about how they encode times, so the
//! watcher accepts:
//! - RFC 3339 strings (`2024-05-01T10:00:00Z`)
//! - naive ISO date-times, taken as UTC (`2024-05-01T10:00:00.250`)
//! - ISO dates, taken as midnight UTC (`2024-05-01`)
//! - integers, taken as Unix epoch milliseconds
//!
//! Empty strings, `null` and `0` carry no signal and decode to `None`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

/// Naive date-time layouts tried after RFC 3339.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Timestamp that could not be decoded.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid timestamp: {0:?}")]
pub struct TimestampError(String);

/// Timestamp as it appears on the wire.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Text(String),
}

/// Parse a textual timestamp.
///
/// Returns `Ok(None)` for blank input.
pub fn parse_timestamp(value: &str) -> Result<Option<DateTime<Utc>>, TimestampError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Some(naive.and_utc()));
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Some(naive.and_utc()))
        .ok_or_else(|| TimestampError(value.to_owned()))
}

/// Convert epoch milliseconds, treating `0` as "no signal".
pub fn from_epoch_millis(millis: i64) -> Result<Option<DateTime<Utc>>, TimestampError> {
    if millis == 0 {
        return Ok(None);
    }
    DateTime::from_timestamp_millis(millis)
        .map(Some)
        .ok_or_else(|| TimestampError(millis.to_string()))
}

/// Serde adapter for optional timestamp fields.
pub(crate) fn deserialize_optional<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawTimestamp>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawTimestamp::Millis(millis)) => from_epoch_millis(millis).map_err(D::Error::custom),
        Some(RawTimestamp::Text(text)) => parse_timestamp(&text).map_err(D::Error::custom),
    }
}
