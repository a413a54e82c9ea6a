//! Cache-control middleware.
//!
//! Every response describes a build that can change at any moment, so
//! browsers and proxies must not reuse it.

use axum::http::HeaderValue;
use axum::http::header;
use tower_http::set_header::SetResponseHeaderLayer;

/// Cache-Control header value.
const NO_STORE: &str = "no-store, must-revalidate";

/// Create layer that disables response caching.
pub(crate) fn no_store_layer() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(header::CACHE_CONTROL, HeaderValue::from_static(NO_STORE))
}
