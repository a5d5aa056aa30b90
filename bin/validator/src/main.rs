//! The Kroma validator binary.

use anyhow::Result;
use clap::Parser;
use tracing::error;

mod cli;
mod commands;
mod metrics;
mod provider;
mod service;
mod telemetry;

/// The version reported by the binary and its metrics.
pub(crate) const VERSION: &str = env!("CARGO_PKG_VERSION");

#[actix_web::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    telemetry::init_tracing_subscriber(cli.v)?;

    let res = match &cli.command {
        Some(command) => commands::run(&cli, command).await,
        None => service::run(&cli).await,
    };
    if let Err(e) = &res {
        error!(target: "kroma_validator", "Application failed: {e:#}");
    }
    res
}
