//! HTTP middleware.

pub(crate) mod cache;
