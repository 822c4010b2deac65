//! `jwplatform` command line entry point.

mod commands;
mod config;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, Args};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = AppConfig::from_args(&args, |name| std::env::var(name).ok())?;
    tracing::debug!(api_host = %config.api_host, upload_host = %config.upload_host, "configuration loaded");

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(commands::run(&config, args.command))
}
