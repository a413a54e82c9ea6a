//! Reload actions.

use std::process::Command;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::ReloadError;

/// Action taken when a newer preview is detected.
pub trait Reloader: Send + Sync + 'static {
    /// Perform the reload.
    fn reload(&self) -> Result<(), ReloadError>;
}

impl<R: Reloader + ?Sized> Reloader for Box<R> {
    fn reload(&self) -> Result<(), ReloadError> {
        (**self).reload()
    }
}

/// Reloader that only logs.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogReloader;

impl Reloader for LogReloader {
    fn reload(&self) -> Result<(), ReloadError> {
        tracing::info!("Preview changed, reload requested");
        Ok(())
    }
}

/// Reloader that runs a shell command.
///
/// The command is started in the background; the tick does not wait for it.
/// At most one run is in flight: a reload requested while the previous run
/// is still going is skipped.
#[derive(Debug)]
pub struct CommandReloader {
    command: String,
    running: Arc<AtomicBool>,
}

impl CommandReloader {
    /// Create a reloader for `command`, interpreted by the platform shell.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a previous run has not finished yet.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Command line run on reload.
    pub fn command(&self) -> &str {
        &self.command
    }

    fn shell_command(&self) -> Command {
        #[cfg(windows)]
        {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(&self.command);
            cmd
        }
        #[cfg(not(windows))]
        {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(&self.command);
            cmd
        }
    }
}

impl Reloader for CommandReloader {
    fn reload(&self) -> Result<(), ReloadError> {
        if self.running.swap(true, Ordering::AcqRel) {
            tracing::warn!(command = %self.command, "Previous reload command still running, skipping");
            return Ok(());
        }

        let mut child = match self.shell_command().spawn() {
            Ok(child) => child,
            Err(e) => {
                self.running.store(false, Ordering::Release);
                return Err(e.into());
            }
        };
        tracing::info!(command = %self.command, pid = child.id(), "Reload command started");

        let command = self.command.clone();
        let running = Arc::clone(&self.running);
        std::thread::spawn(move || {
            match child.wait() {
                Ok(status) if status.success() => {
                    tracing::debug!(command = %command, "Reload command finished");
                }
                Ok(status) => {
                    tracing::warn!(command = %command, %status, "Reload command failed");
                }
                Err(e) => {
                    tracing::warn!(command = %command, error = %e, "Failed to wait for reload command");
                }
            }
            running.store(false, Ordering::Release);
        });

        Ok(())
    }
}
