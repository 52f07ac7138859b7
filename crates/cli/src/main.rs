//! `oracle-fn`: command line entry points for oracle functions.

mod cmd;
mod env;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // stdout carries the emitted batches
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    cmd::Cli::parse().run().await
}
