//! bv - browse S3 buckets and directory trees
//!
//! Thin binary over the `bucketview` library: parse arguments, set up
//! logging, run one command and exit with its code.

use anyhow::Context;
use bucketview::commands::{self, Cli};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .context("failed to initialize logging")?;

    let exit_code = commands::execute(cli).await;
    std::process::exit(exit_code.as_i32());
}
