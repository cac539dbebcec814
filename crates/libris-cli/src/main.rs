//! libris - command-line client for the library management service.

mod cli;
mod commands;
mod output;

use std::io;
use std::path::Path;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use libris_core::{ApiError, Config};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::Cli;
use commands::CommandExecutor;

/// File name prefix for the daily log file
const LOG_FILE_NAME: &str = "libris.log";

/// Initialize the tracing subscriber for logging.
///
/// Use RUST_LOG to control the level (e.g., RUST_LOG=libris_core=debug).
/// When a log directory is configured, events are also written to a daily
/// rotated file there; the returned guard must live until exit.
fn init_tracing(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    Ok(guard)
}

/// Print an error the way a user should see it: one line per notification
/// for backend errors, the full context chain otherwise.
fn report(err: &anyhow::Error) {
    match err.downcast_ref::<ApiError>() {
        Some(api_err) => {
            error!(status = api_err.status(), error = %api_err, "Request failed");
            for line in api_err.notifications() {
                eprintln!("Error: {}", line);
            }
        }
        None => {
            error!(error = %err, "Command failed");
            eprintln!("Error: {:#}", err);
        }
    }
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    let mut executor = CommandExecutor::new(config, cli.api_url)?;
    executor.run(cli.command).await
}

#[tokio::main]
async fn main() {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    };

    let guard = match init_tracing(config.log_dir.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    };
    info!("libris starting");

    if let Err(e) = run(cli, config).await {
        report(&e);
        drop(guard);
        process::exit(1);
    }
}
