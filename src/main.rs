//! forgefetch CLI
//!
//! Command-line interface for repository metadata retrieval

use clap::Parser;
use forgefetch::cli::{Cli, Runner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging; stdout carries the JSON output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let runner = Runner::new(cli);

    runner.run().await?;
    Ok(())
}
