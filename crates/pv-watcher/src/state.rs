//! Poll state owned by a watcher.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Result of comparing a reported update time with the tracked one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateCheck {
    /// The server reported no update time.
    NoSignal,
    /// First update time seen; recorded without reloading.
    Baseline,
    /// Same as, or older than, the tracked update time.
    Unchanged,
    /// Strictly newer than the tracked update time.
    Newer,
}

/// Mutable state of a watcher.
///
/// The poll interval never drops below the floor the state was created with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollState {
    last_known_update: Option<DateTime<Utc>>,
    poll_interval: Duration,
}

impl PollState {
    /// Create state with `poll_interval` clamped to `min_interval`.
    #[must_use]
    pub fn new(poll_interval: Duration, min_interval: Duration) -> Self {
        Self {
            last_known_update: None,
            poll_interval: poll_interval.max(min_interval),
        }
    }

    /// Latest update time observed so far.
    pub fn last_known_update(&self) -> Option<DateTime<Utc>> {
        self.last_known_update
    }

    /// Current delay between ticks.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Apply a server-requested interval.
    ///
    /// Returns the new interval if the clamped value differs from the
    /// current one.
    pub fn apply_requested_interval(
        &mut self,
        requested: Duration,
        min_interval: Duration,
    ) -> Option<Duration> {
        let clamped = requested.max(min_interval);
        if clamped == self.poll_interval {
            return None;
        }
        self.poll_interval = clamped;
        Some(clamped)
    }

    /// Record a reported update time and decide whether it is new.
    pub fn observe_update(&mut self, reported: Option<DateTime<Utc>>) -> UpdateCheck {
        let Some(reported) = reported else {
            return UpdateCheck::NoSignal;
        };

        match self.last_known_update {
            None => {
                self.last_known_update = Some(reported);
                UpdateCheck::Baseline
            }
            Some(known) if reported > known => {
                self.last_known_update = Some(reported);
                UpdateCheck::Newer
            }
            Some(_) => UpdateCheck::Unchanged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    const FLOOR: Duration = Duration::from_millis(1000);

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_714_557_600 + secs, 0).unwrap()
    }

    #[test]
    fn test_new_clamps_interval_to_floor() {
        let state = PollState::new(Duration::from_millis(10), FLOOR);
        assert_eq!(state.poll_interval(), FLOOR);
    }

    #[test]
    fn test_requested_interval_below_floor_uses_floor() {
        let mut state = PollState::new(Duration::from_millis(2000), FLOOR);

        let changed = state.apply_requested_interval(Duration::from_millis(200), FLOOR);

        assert_eq!(changed, Some(FLOOR));
        assert_eq!(state.poll_interval(), FLOOR);
    }

    #[test]
    fn test_requested_interval_same_after_clamp_is_not_a_change() {
        let mut state = PollState::new(FLOOR, FLOOR);

        assert_eq!(
            state.apply_requested_interval(Duration::from_millis(200), FLOOR),
            None
        );
        assert_eq!(state.apply_requested_interval(FLOOR, FLOOR), None);
    }

    #[test]
    fn test_requested_interval_increase() {
        let mut state = PollState::new(FLOOR, FLOOR);

        let changed = state.apply_requested_interval(Duration::from_millis(5000), FLOOR);

        assert_eq!(changed, Some(Duration::from_millis(5000)));
        assert_eq!(state.poll_interval(), Duration::from_millis(5000));
    }

    #[test]
    fn test_first_update_is_baseline() {
        let mut state = PollState::new(FLOOR, FLOOR);

        assert_eq!(state.observe_update(Some(at(0))), UpdateCheck::Baseline);
        assert_eq!(state.last_known_update(), Some(at(0)));
    }

    #[test]
    fn test_newer_update_detected_once() {
        let mut state = PollState::new(FLOOR, FLOOR);
        state.observe_update(Some(at(0)));

        assert_eq!(state.observe_update(Some(at(5))), UpdateCheck::Newer);
        assert_eq!(state.observe_update(Some(at(5))), UpdateCheck::Unchanged);
        assert_eq!(state.last_known_update(), Some(at(5)));
    }

    #[test]
    fn test_older_update_ignored() {
        let mut state = PollState::new(FLOOR, FLOOR);
        state.observe_update(Some(at(10)));

        assert_eq!(state.observe_update(Some(at(3))), UpdateCheck::Unchanged);
        assert_eq!(state.last_known_update(), Some(at(10)));
    }

    #[test]
    fn test_missing_update_keeps_state() {
        let mut state = PollState::new(FLOOR, FLOOR);
        state.observe_update(Some(at(10)));

        assert_eq!(state.observe_update(None), UpdateCheck::NoSignal);
        assert_eq!(state.last_known_update(), Some(at(10)));
    }
}
