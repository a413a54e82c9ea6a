//! Preview file watcher.
//!
//! Marks the preview as updated whenever the rendered preview file changes
//! on disk, so polling clients pick up the new build.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::task::JoinHandle;

use super::debouncer::{ChangeDebouncer, ChangeKind};
use crate::state::PreviewState;

/// Default debounce duration in milliseconds.
const DEFAULT_DEBOUNCE_MS: u64 = 100;

/// How often the debouncer is checked for a settled change.
const DRAIN_INTERVAL: Duration = Duration::from_millis(50);

/// Watches the preview file and records updates in [`PreviewState`].
///
/// Watching stops when the value is dropped.
pub(crate) struct PreviewFileWatcher {
    _watcher: RecommendedWatcher,
    drain_task: JoinHandle<()>,
}

impl PreviewFileWatcher {
    /// Start watching `preview_file`.
    ///
    /// The file's directory is watched rather than the file itself so that
    /// atomic saves (write to temp file, rename over target) are seen.
    ///
    /// # Errors
    ///
    /// Returns an error if the file watcher cannot be created.
    pub(crate) fn start(
        preview_file: &Path,
        preview: Arc<PreviewState>,
    ) -> Result<Self, notify::Error> {
        Self::start_with_debounce(
            preview_file,
            preview,
            Duration::from_millis(DEFAULT_DEBOUNCE_MS),
        )
    }

    pub(crate) fn start_with_debounce(
        preview_file: &Path,
        preview: Arc<PreviewState>,
        debounce: Duration,
    ) -> Result<Self, notify::Error> {
        let file_name = preview_file
            .file_name()
            .map(OsStr::to_os_string)
            .ok_or_else(|| notify::Error::generic("preview path has no file name"))?;
        let watch_dir = match preview_file.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let debouncer = Arc::new(ChangeDebouncer::new(debounce));
        let recorder = Arc::clone(&debouncer);

        let mut watcher =
            notify::recommended_watcher(move |res: Result<Event, notify::Error>| match res {
                Ok(event) => Self::record_event(&event, &file_name, &recorder),
                Err(e) => tracing::warn!(error = %e, "Preview file watch error"),
            })?;
        watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;

        let path = preview_file.to_path_buf();
        let drain_task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(DRAIN_INTERVAL);
            loop {
                interval.tick().await;
                if let Some(kind) = debouncer.take_ready() {
                    Self::handle_change(kind, &path, &preview);
                }
            }
        });

        tracing::info!(path = %preview_file.display(), "Watching preview file");

        Ok(Self {
            _watcher: watcher,
            drain_task,
        })
    }

    /// Record a raw notify event if it concerns the preview file.
    fn record_event(event: &Event, file_name: &OsStr, debouncer: &ChangeDebouncer) {
        let kind = match event.kind {
            EventKind::Create(_) => ChangeKind::Created,
            EventKind::Modify(_) => ChangeKind::Modified,
            EventKind::Remove(_) => ChangeKind::Removed,
            _ => return,
        };

        if event
            .paths
            .iter()
            .any(|path| path.file_name() == Some(file_name))
        {
            debouncer.record(kind);
            tracing::debug!(?kind, "Recorded preview file change");
        }
    }

    /// Apply a settled change to the preview state.
    fn handle_change(kind: ChangeKind, path: &Path, preview: &PreviewState) {
        match kind {
            ChangeKind::Created | ChangeKind::Modified => {
                let updated_at = preview.mark_updated();
                tracing::info!(
                    path = %path.display(),
                    ?kind,
                    last_update = %updated_at,
                    "Preview updated"
                );
            }
            ChangeKind::Removed => {
                tracing::warn!(path = %path.display(), "Preview file removed");
            }
        }
    }
}

impl Drop for PreviewFileWatcher {
    fn drop(&mut self) {
        self.drain_task.abort();
    }
}
