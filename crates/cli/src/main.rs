mod assistant;
mod cli;
mod commands;
mod config;
mod session;
mod terminal;

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::{CliArgs, Command};

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.command.default_log_level(), args.log_file.as_deref())?;

    if let Command::Chat { list_sessions: true, .. } = args.command {
        return commands::list_sessions();
    }
    let mut config = config::load(&args.config)?;

    match args.command {
        Command::Ingest { source_dir, store } => {
            config::apply_overrides(&mut config, source_dir, store);
            commands::ingest(&config).await
        }
        Command::Search { query, k } => commands::search(&config, &query, k).await,
        Command::Ask { question, k } => commands::ask(&config, &question, k).await,
        Command::Chat { k, session, .. } => commands::chat(&config, k, session.as_deref()).await,
    }
}

/// Console logs go to stderr so answers on stdout stay clean. `--log-file`
/// adds a plain-text copy.
fn init_tracing(default_level: &str, log_file: Option<&Path>) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            Some(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(())
}
