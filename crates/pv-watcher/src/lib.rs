//! Preview update watcher for PV.
//!
//! Polls a preview server's status endpoint and triggers a reload when the
//! preview has been rebuilt since the last poll:
//! - [`PreviewWatcher`] owns the repeating timer and runs poll ticks
//! - [`StatusSource`] fetches [`PreviewStatus`] payloads ([`HttpStatusSource`] over HTTP)
//! - [`Reloader`] performs the reload ([`LogReloader`], [`CommandReloader`])
//!
//! # Quick Start
//!
//! ```ignore
//! use pv_watcher::{CommandReloader, HttpStatusSource, PreviewWatcher, WatcherConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut watcher = PreviewWatcher::new(
//!         HttpStatusSource::new("http://127.0.0.1:1234/preview-state-info"),
//!         CommandReloader::new("make open"),
//!         WatcherConfig::default(),
//!     );
//!     watcher.start();
//!     tokio::signal::ctrl_c().await.unwrap();
//!     watcher.stop();
//! }
//! ```
//!
//! # Failure Handling
//!
//! A poll never fails the watcher. Transport errors, non-success statuses and
//! malformed payloads are logged and the next tick tries again.

mod error;
mod reload;
mod source;
mod state;
mod status;
mod timestamp;
mod watcher;

pub use error::{PollError, ReloadError};
pub use reload::{CommandReloader, LogReloader, Reloader};
pub use source::{DEFAULT_STATUS_URL, HttpStatusSource, StatusSource};
pub use state::{PollState, UpdateCheck};
pub use status::PreviewStatus;
pub use timestamp::{TimestampError, from_epoch_millis, parse_timestamp};
pub use watcher::{MIN_POLL_INTERVAL, PreviewWatcher, TickOutcome, WatcherConfig};
