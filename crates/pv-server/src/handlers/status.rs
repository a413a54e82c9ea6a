//! Preview status endpoints.
//!
//! Clients poll these to find out whether the preview was rebuilt.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::AppState;

/// Response for GET /preview-state-info.
#[derive(Debug, Serialize)]
pub(crate) struct StateInfoResponse {
    /// Latest build time.
    last_update_timestamp: Option<DateTime<Utc>>,
    /// Previous state request time (before this one).
    last_seen_timestamp: Option<DateTime<Utc>>,
    /// Poll interval clients should use, in milliseconds.
    scrape_interval: u64,
}

/// Response for GET /check-preview-updates.
#[derive(Debug, Serialize)]
pub(crate) struct UpdateCheckResponse {
    /// Latest build time.
    date: Option<DateTime<Utc>>,
}

/// Handle GET /preview-state-info.
///
/// Replies with the state as it was before this request, then records the
/// request as the new last-seen time.
pub(crate) async fn get_state_info(State(state): State<Arc<AppState>>) -> Json<StateInfoResponse> {
    let response = StateInfoResponse {
        last_update_timestamp: state.preview.last_update(),
        last_seen_timestamp: state.preview.last_seen(),
        scrape_interval: state.preview.scrape_interval_ms(),
    };

    let now = state.preview.mark_seen();
    tracing::debug!(last_seen = %now, "Preview seen");

    Json(response)
}

/// Handle GET /check-preview-updates.
pub(crate) async fn get_update_check(
    State(state): State<Arc<AppState>>,
) -> Json<UpdateCheckResponse> {
    Json(UpdateCheckResponse {
        date: state.preview.last_update(),
    })
}
