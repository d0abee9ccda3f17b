//! Registry Lock command-line entry point
//!
//! Administers registry locks against the configured `SQLite` database and
//! runs the automatic relock worker.

mod cli;
mod commands;
mod fixtures;

use std::process::ExitCode;

use clap::Parser;
use registry_lock_app::config::AppConfig;
use registry_lock_app::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::Cli;

fn init_tracing(default_level: &str) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries command output, logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref());
    init_tracing(
        config
            .as_ref()
            .map_or("info", |config| config.log.level.as_str()),
    );

    let mut config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(database) = cli.database {
        config.database_path = Some(database);
    }

    let (state, store) = match AppState::open_sqlite(&config).await {
        Ok(opened) => opened,
        Err(e) => {
            tracing::error!("Failed to open registry database: {e}");
            return ExitCode::FAILURE;
        }
    };
    tracing::debug!(
        "Using database {}",
        config.resolved_database_path().display()
    );

    match commands::run(cli.command, &config, &state, &store).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
