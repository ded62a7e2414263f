//! src/main.rs
//!
//! Binary entry point: initializes tracing, loads configuration,
//! instantiates `App`, and runs it. Exit codes follow spec.md §6: zero
//! on clean stop, non-zero on unrecoverable startup failure.

use anyhow::Context;
use broadcast_gossip::{App, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::load().context("failed to load configuration")?;

    if let Err(err) = App::new(config)?.run().await {
        tracing::error!(error = %err, "agent failed");
        std::process::exit(1);
    }

    Ok(())
}
