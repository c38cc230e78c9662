//! ServerGuard - Remote Server Administration
//!
//! CLI entry point for the ServerGuard server.

#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use serverguard::{cli, logging, server};
use tracing::warn;

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv_loaded = dotenvy::dotenv().is_ok();

    let cli = cli::Cli::parse();
    let config = server::load_config()?;
    let _log_guard = logging::init(&config.logging)?;

    if !dotenv_loaded {
        tracing::debug!(".env file not found, using config files and environment only");
    }
    if config.auth.uses_default_credentials() {
        warn!("Default credentials are in use. Change [auth] before exposing this server.");
    }

    cli::run(cli, config).await
}
