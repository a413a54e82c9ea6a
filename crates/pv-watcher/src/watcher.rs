//! Preview watcher.
//!
//! Owns one repeating timer. Each tick fetches the preview status, adopts a
//! server-requested poll interval and triggers a reload when the preview was
//! rebuilt since the previous tick.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::reload::Reloader;
use crate::source::StatusSource;
use crate::state::{PollState, UpdateCheck};

/// Lowest poll interval a watcher will ever use.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Watcher timing configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WatcherConfig {
    /// Interval used until the server requests another one.
    pub initial_interval: Duration,
    /// Floor for every interval. Values below [`MIN_POLL_INTERVAL`] are raised to it.
    pub min_interval: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            initial_interval: MIN_POLL_INTERVAL,
            min_interval: MIN_POLL_INTERVAL,
        }
    }
}

/// Result of a single poll tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The status could not be fetched or decoded. State is unchanged.
    Failed,
    /// The status was processed.
    Polled {
        /// A newer preview was found and the reloader was invoked.
        reload_triggered: bool,
        /// Poll interval adopted from the server, if it changed.
        new_interval: Option<Duration>,
    },
}

/// State shared between the watcher handle and its timer task.
struct Shared<S, R> {
    source: S,
    reloader: R,
    min_interval: Duration,
    state: Mutex<PollState>,
    /// Signalled when the poll interval changes so the timer restarts.
    rescheduled: Notify,
}

impl<S, R> Shared<S, R> {
    fn state(&self) -> MutexGuard<'_, PollState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: StatusSource, R: Reloader> Shared<S, R> {
    async fn tick(&self) -> TickOutcome {
        tracing::debug!("Checking preview updates");

        let status = match self.source.fetch().await {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(error = %e, "Preview update check failed");
                return TickOutcome::Failed;
            }
        };

        let (new_interval, check) = {
            let mut state = self.state();
            let previous = state.poll_interval();
            let new_interval = status
                .requested_interval()
                .and_then(|requested| state.apply_requested_interval(requested, self.min_interval));
            if let Some(interval) = new_interval {
                tracing::info!(before = ?previous, after = ?interval, "Poll interval changed");
            }
            (new_interval, state.observe_update(status.last_update_timestamp))
        };

        if new_interval.is_some() {
            self.rescheduled.notify_one();
        }

        tracing::debug!(
            last_update = ?status.last_update_timestamp,
            last_seen = ?status.last_seen_timestamp,
            ?check,
            "Preview status received"
        );

        let reload_triggered = check == UpdateCheck::Newer;
        if reload_triggered {
            tracing::info!("New preview found, reloading");
            if let Err(e) = self.reloader.reload() {
                tracing::warn!(error = %e, "Preview reload failed");
            }
        }

        TickOutcome::Polled {
            reload_triggered,
            new_interval,
        }
    }

    /// Timer loop. Restarts the interval whenever the poll interval changes.
    async fn run(self: Arc<Self>) {
        loop {
            let period = self.state().poll_interval();
            tracing::debug!(interval = ?period, "Scheduling preview checks");

            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    () = self.rescheduled.notified() => break,
                    _ = ticker.tick() => {
                        self.tick().await;
                    }
                }
            }
        }
    }
}

/// Polls a preview status source and reloads when a newer preview appears.
///
/// ```ignore
/// use pv_watcher::{HttpStatusSource, LogReloader, PreviewWatcher, WatcherConfig};
///
/// let mut watcher = PreviewWatcher::new(
///     HttpStatusSource::default(),
///     LogReloader,
///     WatcherConfig::default(),
/// );
/// watcher.start();
/// ```
pub struct PreviewWatcher<S, R> {
    shared: Arc<Shared<S, R>>,
    timer: Option<JoinHandle<()>>,
}

impl<S: StatusSource, R: Reloader> PreviewWatcher<S, R> {
    /// Create a stopped watcher.
    pub fn new(source: S, reloader: R, config: WatcherConfig) -> Self {
        let min_interval = config.min_interval.max(MIN_POLL_INTERVAL);
        Self {
            shared: Arc::new(Shared {
                source,
                reloader,
                min_interval,
                state: Mutex::new(PollState::new(config.initial_interval, min_interval)),
                rescheduled: Notify::new(),
            }),
            timer: None,
        }
    }

    /// Start polling at the current interval, replacing any running timer.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&mut self) {
        self.stop();
        let shared = Arc::clone(&self.shared);
        self.timer = Some(tokio::spawn(shared.run()));
        tracing::info!(interval = ?self.poll_interval(), "Preview watcher started");
    }

    /// Run one poll cycle now.
    ///
    /// Errors are logged and reported as [`TickOutcome::Failed`]; they never
    /// stop the timer.
    pub async fn tick(&self) -> TickOutcome {
        self.shared.tick().await
    }
}

impl<S, R> PreviewWatcher<S, R> {
    /// Stop polling. Does nothing if the watcher is not running.
    pub fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
            tracing::info!("Preview watcher stopped");
        }
    }

    /// Whether the timer is active.
    pub fn is_running(&self) -> bool {
        self.timer.as_ref().is_some_and(|timer| !timer.is_finished())
    }

    /// Current delay between ticks.
    pub fn poll_interval(&self) -> Duration {
        self.shared.state().poll_interval()
    }

    /// Latest preview update time this watcher has seen.
    pub fn last_known_update(&self) -> Option<DateTime<Utc>> {
        self.shared.state().last_known_update()
    }
}

impl<S, R> Drop for PreviewWatcher<S, R> {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}
