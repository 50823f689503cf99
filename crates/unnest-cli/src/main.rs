//! Unnest CLI - Command-line utility that recursively unpacks nested,
//! encrypted, disguised and split archives.

mod cli;
mod commands;
mod error;
mod output;
mod progress;

use std::fs::File;
use std::sync::Mutex;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Narration is printed by the reporter, so its tracing mirror stays off
/// on stderr unless `RUST_LOG` asks for it.
const DEFAULT_FILTER_TAIL: &str = "unnest_core::session=off";

fn init_tracing(cli: &cli::Cli) -> Result<()> {
    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(cli.verbose)
        .with_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{level},{DEFAULT_FILTER_TAIL}").into()),
        );

    // The file keeps the full narration regardless of the console filter.
    let file_layer = match &cli.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Could not create log file '{}'", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(true)
                    .with_filter(cli.log_level),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    init_tracing(&cli)?;
    if let Some(path) = &cli.log_file {
        tracing::info!(log_file = %path.display(), "diagnostic log started");
    }

    let formatter = output::create_formatter(cli.json, cli.verbose, cli.quiet);

    commands::unpack::execute(&cli, &*formatter)
}
