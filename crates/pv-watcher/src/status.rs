//! Preview status wire payload.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::PollError;
use crate::timestamp;

/// Status reported by a preview server on each poll.
///
/// Both status endpoints are understood: `/check-preview-updates` sends
/// `date`, `/preview-state-info` sends `last_update_timestamp` together with
/// the optional `last_seen_timestamp` and `scrape_interval`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct PreviewStatus {
    /// When the preview was last rebuilt.
    #[serde(
        default,
        alias = "date",
        deserialize_with = "timestamp::deserialize_optional"
    )]
    pub last_update_timestamp: Option<DateTime<Utc>>,
    /// When the server last answered a status request.
    #[serde(default, deserialize_with = "timestamp::deserialize_optional")]
    pub last_seen_timestamp: Option<DateTime<Utc>>,
    /// Poll interval requested by the server, in milliseconds.
    ///
    /// Anything other than a positive whole number is dropped rather than
    /// failing the whole payload.
    #[serde(default, deserialize_with = "deserialize_interval")]
    pub scrape_interval: Option<u64>,
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn deserialize_interval<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let interval = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|ms| ms.fract() == 0.0 && *ms >= 1.0 && *ms <= u64::MAX as f64)
                .map(|ms| ms as u64)
        }),
        _ => None,
    };
    Ok(interval.filter(|ms| *ms > 0))
}

impl PreviewStatus {
    /// Decode a status payload from a JSON body.
    pub fn from_json(body: &str) -> Result<Self, PollError> {
        Ok(serde_json::from_str(body)?)
    }

    /// Requested poll interval, if the server sent a positive one.
    #[must_use]
    pub fn requested_interval(&self) -> Option<Duration> {
        self.scrape_interval
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}
