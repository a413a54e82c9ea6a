//! Router construction.
//!
//! Builds the axum router with all routes and middleware.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::cache;
use crate::state::AppState;

/// Route answering with the full preview state.
pub(crate) const PREVIEW_STATE_INFO_ROUTE: &str = "/preview-state-info";

/// Route answering with the last update date only.
pub(crate) const CHECK_PREVIEW_UPDATES_ROUTE: &str = "/check-preview-updates";

/// Create the application router.
///
/// # Arguments
///
/// * `state` - Shared application state
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::preview::get_preview))
        .route("/preview", get(handlers::preview::get_preview))
        .route(
            PREVIEW_STATE_INFO_ROUTE,
            get(handlers::status::get_state_info),
        )
        .route(
            CHECK_PREVIEW_UPDATES_ROUTE,
            get(handlers::status::get_update_check),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cache::no_store_layer()),
        )
        .with_state(state)
}
