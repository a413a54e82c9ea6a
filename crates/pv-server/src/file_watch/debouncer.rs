//! Change debouncing for the preview file.
//!
//! Editors and build tools often emit a burst of events for one save
//! (truncate, write, rename). The debouncer folds a burst into a single
//! change that becomes ready once the file has been quiet for the debounce
//! duration.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Kind of change to the preview file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ChangeKind {
    Created,
    Modified,
    Removed,
}

/// Change waiting for its quiet period to end.
struct PendingChange {
    kind: ChangeKind,
    deadline: Instant,
}

/// Thread-safe single-file change debouncer.
pub(crate) struct ChangeDebouncer {
    pending: Mutex<Option<PendingChange>>,
    debounce_duration: Duration,
}

impl ChangeDebouncer {
    /// Create a new debouncer with the specified quiet period.
    pub(crate) fn new(debounce_duration: Duration) -> Self {
        Self {
            pending: Mutex::new(None),
            debounce_duration,
        }
    }

    fn pending(&self) -> MutexGuard<'_, Option<PendingChange>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a change. Safe to call from the notify callback thread.
    pub(crate) fn record(&self, kind: ChangeKind) {
        let mut pending = self.pending();
        let deadline = Instant::now() + self.debounce_duration;

        *pending = match pending.take() {
            None => Some(PendingChange { kind, deadline }),
            Some(existing) => {
                Self::coalesce(existing.kind, kind).map(|kind| PendingChange { kind, deadline })
            }
        };
    }

    /// Fold two consecutive changes into one.
    ///
    /// Returns `None` when the pair cancels out (file created then removed).
    #[allow(clippy::match_same_arms)]
    fn coalesce(existing: ChangeKind, new: ChangeKind) -> Option<ChangeKind> {
        use ChangeKind::{Created, Modified, Removed};

        match (existing, new) {
            (Created, Removed) => None,
            (Created, _) => Some(Created),
            (Modified, Created) => Some(Created),
            (Modified, Modified) => Some(Modified),
            (Modified, Removed) => Some(Removed),
            // Write-to-temp-then-rename saves show up as remove + create
            (Removed, Created) => Some(Modified),
            (Removed, _) => Some(Removed),
        }
    }

    /// Take the pending change if its quiet period has ended.
    pub(crate) fn take_ready(&self) -> Option<ChangeKind> {
        let mut pending = self.pending();
        let ready = pending
            .as_ref()
            .is_some_and(|change| change.deadline <= Instant::now());
        if ready {
            pending.take().map(|change| change.kind)
        } else {
            None
        }
    }
}
