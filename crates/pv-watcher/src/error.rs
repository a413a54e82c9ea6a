//! Error types for preview polling.

/// A failed poll.
///
/// Every variant is transient from the watcher's point of view: it is
/// logged and the next tick tries again.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("Unexpected HTTP status: {status}")]
    Http { status: u16 },

    /// The body was not a valid status payload.
    #[error("Invalid status payload: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<ureq::Error> for PollError {
    fn from(e: ureq::Error) -> Self {
        PollError::Network(e.to_string())
    }
}

/// A reload that could not be carried out.
#[derive(Debug, thiserror::Error)]
pub enum ReloadError {
    /// Reload command could not be started.
    #[error("Failed to start reload command: {0}")]
    Spawn(#[from] std::io::Error),
}
