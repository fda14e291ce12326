//! # weave — stackweave CLI
//!
//! Declarative deployment composition: validate a stack manifest, preview
//! the deployment plan, or run a full composition pass and emit the
//! runtime configuration artifact.

mod commands;
mod manifest;
mod output;

use clap::Parser;

use crate::commands::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    commands::execute(cli).await
}
