//! Preview server for PV.
//!
//! This crate provides an axum HTTP server for a locally rendered preview:
//! - The preview page itself (`/` and `/preview`)
//! - Status endpoints polled by watchers (`/preview-state-info`,
//!   `/check-preview-updates`)
//! - File watching that marks the preview as updated when it is re-rendered
//!
//! # Quick Start
//!
//! ```ignore
//! use std::path::PathBuf;
//! use pv_server::{ServerConfig, run_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig {
//!         host: "127.0.0.1".to_string(),
//!         port: 1234,
//!         preview_file: PathBuf::from("preview.html"),
//!         scrape_interval_ms: 2000,
//!         watch_enabled: true,
//!         inject_reload_script: true,
//!     };
//!
//!     run_server(config).await.unwrap();
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Watcher ──HTTP GET──► axum server (pv-server)
//!                            │
//!                            ├─► /preview-state-info ──► PreviewState (read, then mark seen)
//!                            ├─► /check-preview-updates ──► PreviewState (read)
//!                            └─► / , /preview ──► preview file
//!
//! notify ──► ChangeDebouncer ──► PreviewState::mark_updated
//! ```

mod app;
mod error;
mod file_watch;
mod handlers;
mod middleware;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use file_watch::PreviewFileWatcher;
use state::AppState;

pub use state::PreviewState;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Rendered preview file to serve.
    pub preview_file: PathBuf,
    /// Poll interval advertised to watchers, in milliseconds.
    pub scrape_interval_ms: u64,
    /// Mark the preview as updated when the file changes.
    pub watch_enabled: bool,
    /// Serve the preview with a script that reloads it on new builds.
    pub inject_reload_script: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 1234,
            preview_file: PathBuf::from("preview.html"),
            scrape_interval_ms: 2000,
            watch_enabled: true,
            inject_reload_script: true,
        }
    }
}

/// Run the server until Ctrl-C.
///
/// The preview counts as updated at startup, so the first rebuild after a
/// watcher's initial poll is detected as newer.
///
/// # Errors
///
/// Returns an error if the address is invalid, the file watcher cannot be
/// created, or the server fails to start.
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let preview = Arc::new(PreviewState::new(config.scrape_interval_ms));
    let initial_update = preview.mark_updated();
    tracing::debug!(last_update = %initial_update, "Preview state initialized");

    // Keep the watcher alive for the lifetime of the server
    let _file_watcher = if config.watch_enabled {
        Some(PreviewFileWatcher::start(
            &config.preview_file,
            Arc::clone(&preview),
        )?)
    } else {
        None
    };

    let state = Arc::new(AppState {
        preview_file: config.preview_file.clone(),
        preview,
        inject_reload_script: config.inject_reload_script,
    });

    let app = app::create_router(state);

    let addr = SocketAddr::from_str(&format!("{}:{}", config.host, config.port))?;
    tracing::info!(address = %addr, "Starting preview server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}

/// Create server configuration from PV config.
#[must_use]
pub fn server_config_from_pv_config(config: &pv_config::Config) -> ServerConfig {
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        preview_file: config.preview_resolved.file.clone(),
        scrape_interval_ms: config.preview_resolved.scrape_interval_ms,
        watch_enabled: config.preview_resolved.watch,
        inject_reload_script: config.preview_resolved.inject_reload_script,
    }
}
