//! Preview file watching.
//!
//! Turns filesystem events on the rendered preview file into preview
//! updates.

mod debouncer;
mod watcher;

pub(crate) use watcher::PreviewFileWatcher;
