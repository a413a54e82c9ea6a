//! PV CLI - preview server and watcher.
//!
//! Provides commands for:
//! - `serve`: Serve a rendered preview and its update status
//! - `watch`: Poll a preview server and reload when the preview changes

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ServeArgs, WatchArgs};
use output::Output;

/// PV - preview server and watcher.
#[derive(Parser)]
#[command(name = "pv", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the preview file and its update status.
    Serve(ServeArgs),
    /// Watch a preview server and reload on new builds.
    Watch(WatchArgs),
}

impl Commands {
    fn verbose(&self) -> bool {
        match self {
            Self::Serve(args) => args.verbose,
            Self::Watch(args) => args.verbose,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.command.verbose() {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = tokio::runtime::Runtime::new()
        .map_err(error::CliError::Runtime)
        .and_then(|rt| {
            rt.block_on(async {
                match cli.command {
                    Commands::Serve(args) => args.execute().await,
                    Commands::Watch(args) => args.execute().await,
                }
            })
        });

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
