//! `pv serve` command implementation.

use std::path::PathBuf;

use clap::Args;
use pv_config::{CliSettings, Config};
use pv_server::{run_server, server_config_from_pv_config};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Path to configuration file (default: auto-discover pv.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Rendered preview file to serve (overrides config).
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Poll interval advertised to watchers, in milliseconds (overrides config).
    #[arg(long)]
    scrape_interval: Option<u64>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Watch the preview file for changes (default: enabled).
    #[arg(long)]
    watch: Option<bool>,

    /// Disable watching the preview file.
    #[arg(long, conflicts_with = "watch")]
    no_watch: bool,

    /// Serve the preview with a script that reloads it on new builds (default: enabled).
    #[arg(long)]
    reload_script: Option<bool>,

    /// Serve the preview file unchanged.
    #[arg(long, conflicts_with = "reload_script")]
    no_reload_script: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = Config::load(self.config.as_deref(), Some(&self.cli_settings()))?;

        output.highlight(&format!(
            "Starting preview server on {}:{}",
            config.server.host, config.server.port
        ));
        output.info(&format!(
            "Preview file: {}",
            config.preview_resolved.file.display()
        ));
        output.info(&format!(
            "Scrape interval: {}ms",
            config.preview_resolved.scrape_interval_ms
        ));

        if !config.preview_resolved.file.exists() {
            output.warning("Preview file does not exist yet, serving 404 until it is rendered");
        }

        if config.preview_resolved.watch {
            output.info("File watching: enabled");
        } else {
            output.info("File watching: disabled");
        }

        if config.preview_resolved.inject_reload_script {
            output.info("Browser reload: enabled");
        } else {
            output.info("Browser reload: disabled");
        }

        let server_config = server_config_from_pv_config(&config);
        run_server(server_config)
            .await
            .map_err(|e| CliError::Server(e.to_string()))?;

        output.success("Preview server stopped");
        Ok(())
    }

    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            host: self.host.clone(),
            port: self.port,
            preview_file: self.file.clone(),
            scrape_interval_ms: self.scrape_interval,
            watch_enabled: self.resolve_watch_enabled(),
            inject_reload_script: self.resolve_reload_script(),
            ..Default::default()
        }
    }

    /// Resolve `watch_enabled` from --watch/--no-watch flags.
    fn resolve_watch_enabled(&self) -> Option<bool> {
        self.no_watch.then_some(false).or(self.watch)
    }

    /// Resolve `inject_reload_script` from --reload-script/--no-reload-script flags.
    fn resolve_reload_script(&self) -> Option<bool> {
        self.no_reload_script.then_some(false).or(self.reload_script)
    }
}
