//! `pv watch` command implementation.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use pv_config::{CliSettings, Config};
use pv_watcher::{
    CommandReloader, HttpStatusSource, LogReloader, PreviewWatcher, Reloader, WatcherConfig,
};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the watch command.
#[derive(Args)]
pub(crate) struct WatchArgs {
    /// Path to configuration file (default: auto-discover pv.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Status endpoint to poll (overrides config).
    #[arg(short, long)]
    url: Option<String>,

    /// Initial poll interval in milliseconds (overrides config).
    #[arg(short, long)]
    interval: Option<u64>,

    /// Shell command to run when a newer preview is detected (overrides config).
    #[arg(long)]
    on_reload: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl WatchArgs {
    /// Execute the watch command.
    ///
    /// Polls until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the shutdown signal cannot
    /// be installed.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = Config::load(self.config.as_deref(), Some(&self.cli_settings()))?;
        let settings = &config.watcher;

        output.highlight(&format!("Watching {}", settings.url));
        output.info(&format!(
            "Poll interval: {}ms (minimum {}ms)",
            settings.interval_ms, settings.min_interval_ms
        ));

        let reloader: Box<dyn Reloader> = match &settings.on_reload {
            Some(command) => {
                output.info(&format!("On reload: {command}"));
                Box::new(CommandReloader::new(command.clone()))
            }
            None => {
                output.info("On reload: log only");
                Box::new(LogReloader)
            }
        };

        let mut watcher = PreviewWatcher::new(
            HttpStatusSource::new(settings.url.clone()),
            reloader,
            watcher_config(&config),
        );
        watcher.start();

        let signal = tokio::signal::ctrl_c().await;
        watcher.stop();
        tracing::info!(
            last_update = ?watcher.last_known_update(),
            interval = ?watcher.poll_interval(),
            "Preview watcher stopped"
        );
        signal.map_err(CliError::Signal)?;

        output.success("Watcher stopped");
        Ok(())
    }

    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            watcher_url: self.url.clone(),
            interval_ms: self.interval,
            on_reload: self.on_reload.clone(),
            ..Default::default()
        }
    }
}

/// Build watcher timing from the loaded configuration.
fn watcher_config(config: &Config) -> WatcherConfig {
    WatcherConfig {
        initial_interval: Duration::from_millis(config.watcher.interval_ms),
        min_interval: Duration::from_millis(config.watcher.min_interval_ms),
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: WatchArgs,
    }

    fn parse(args: &[&str]) -> WatchArgs {
        let argv = std::iter::once("watch").chain(args.iter().copied());
        TestCli::try_parse_from(argv).unwrap().args
    }

    #[test]
    fn test_flags_map_to_settings() {
        let settings = parse(&[
            "-u",
            "http://localhost:4000/preview-state-info",
            "-i",
            "2500",
            "--on-reload",
            "echo reloaded",
        ])
        .cli_settings();

        assert_eq!(
            settings.watcher_url.as_deref(),
            Some("http://localhost:4000/preview-state-info")
        );
        assert_eq!(settings.interval_ms, Some(2500));
        assert_eq!(settings.on_reload.as_deref(), Some("echo reloaded"));
        assert_eq!(settings.host, None);
        assert_eq!(settings.port, None);
    }

    #[test]
    fn test_watcher_config_uses_configured_intervals() {
        let mut config = Config::default();
        config.watcher.interval_ms = 3000;
        config.watcher.min_interval_ms = 1500;

        let watcher = watcher_config(&config);

        assert_eq!(watcher.initial_interval, Duration::from_millis(3000));
        assert_eq!(watcher.min_interval, Duration::from_millis(1500));
    }

    #[test]
    fn test_config_floor_matches_watcher_floor() {
        assert_eq!(
            Duration::from_millis(pv_config::MIN_INTERVAL_MS),
            pv_watcher::MIN_POLL_INTERVAL
        );
    }
}
