//! Application state.
//!
//! Shared state for all request handlers.

use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};

/// Update bookkeeping for one preview.
///
/// `last_update` moves when a new build lands; `last_seen` moves whenever a
/// client asks for the preview state.
#[derive(Debug)]
pub struct PreviewState {
    last_update: RwLock<Option<DateTime<Utc>>>,
    last_seen: RwLock<Option<DateTime<Utc>>>,
    scrape_interval_ms: u64,
}

impl PreviewState {
    /// Create state advertising `scrape_interval_ms` to clients.
    #[must_use]
    pub fn new(scrape_interval_ms: u64) -> Self {
        Self {
            last_update: RwLock::new(None),
            last_seen: RwLock::new(None),
            scrape_interval_ms,
        }
    }

    /// Record a new build now and return its timestamp.
    pub fn mark_updated(&self) -> DateTime<Utc> {
        let now = Utc::now();
        self.mark_updated_at(now);
        now
    }

    /// Record a new build at `at`.
    pub fn mark_updated_at(&self, at: DateTime<Utc>) {
        *self.last_update.write().unwrap_or_else(PoisonError::into_inner) = Some(at);
    }

    /// Record that a client looked at the preview state now.
    pub fn mark_seen(&self) -> DateTime<Utc> {
        let now = Utc::now();
        *self.last_seen.write().unwrap_or_else(PoisonError::into_inner) = Some(now);
        now
    }

    /// Time of the latest build, if any.
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        *self.last_update.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Time of the latest state request, if any.
    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        *self.last_seen.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Poll interval advertised to clients, in milliseconds.
    pub fn scrape_interval_ms(&self) -> u64 {
        self.scrape_interval_ms
    }
}

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Rendered preview file.
    pub(crate) preview_file: PathBuf,
    /// Update bookkeeping.
    pub(crate) preview: Arc<PreviewState>,
    /// Serve the preview with the reload script.
    pub(crate) inject_reload_script: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_state_is_empty() {
        let state = PreviewState::new(2000);
        assert_eq!(state.last_update(), None);
        assert_eq!(state.last_seen(), None);
        assert_eq!(state.scrape_interval_ms(), 2000);
    }

    #[test]
    fn test_mark_updated_at() {
        let state = PreviewState::new(2000);
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();

        state.mark_updated_at(at);

        assert_eq!(state.last_update(), Some(at));
        assert_eq!(state.last_seen(), None);
    }

    #[test]
    fn test_mark_seen_moves_forward() {
        let state = PreviewState::new(2000);

        let first = state.mark_seen();
        let second = state.mark_seen();

        assert!(second >= first);
        assert_eq!(state.last_seen(), Some(second));
    }
}
