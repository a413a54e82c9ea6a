//! Status sources.
//!
//! A [`StatusSource`] performs the request half of a poll tick. The watcher
//! only sees its result, which keeps the tick logic independent of the
//! transport.

use std::future::Future;
use std::time::Duration;

use ureq::Agent;

use crate::error::PollError;
use crate::status::PreviewStatus;

/// Status endpoint of a preview server running with default settings.
pub const DEFAULT_STATUS_URL: &str = "http://127.0.0.1:1234/preview-state-info";

/// Default HTTP timeout in seconds.
const DEFAULT_TIMEOUT: u64 = 10;

/// Fetches the current preview status.
pub trait StatusSource: Send + Sync + 'static {
    /// Fetch and decode one status payload.
    fn fetch(&self) -> impl Future<Output = Result<PreviewStatus, PollError>> + Send;
}

/// Status source backed by an HTTP GET.
///
/// Requests run on Tokio's blocking pool since `ureq` is synchronous.
#[derive(Clone)]
pub struct HttpStatusSource {
    agent: Agent,
    url: String,
}

impl HttpStatusSource {
    /// Create a source polling `url`.
    pub fn new(url: impl Into<String>) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT)))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            url: url.into(),
        }
    }

    /// Polled URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn fetch_blocking(agent: &Agent, url: &str) -> Result<PreviewStatus, PollError> {
        let response = agent
            .get(url)
            .header("Accept", "application/json")
            .call()?;

        if !response.status().is_success() {
            return Err(PollError::Http {
                status: response.status().as_u16(),
            });
        }

        let mut body_reader = response.into_body();
        let body = body_reader.read_to_string()?;
        PreviewStatus::from_json(&body)
    }
}

impl Default for HttpStatusSource {
    fn default() -> Self {
        Self::new(DEFAULT_STATUS_URL)
    }
}

impl StatusSource for HttpStatusSource {
    async fn fetch(&self) -> Result<PreviewStatus, PollError> {
        let agent = self.agent.clone();
        let url = self.url.clone();

        tokio::task::spawn_blocking(move || Self::fetch_blocking(&agent, &url))
            .await
            .map_err(|e| PollError::Network(e.to_string()))?
    }
}
