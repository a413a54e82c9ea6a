//! HTTP request handlers.

pub(crate) mod preview;
pub(crate) mod status;
