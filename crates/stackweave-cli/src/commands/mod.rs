//! CLI command definitions and dispatch.

pub mod compose;
pub mod plan;
pub mod validate;

use clap::{Parser, Subcommand};

/// stackweave — declarative deployment composition.
#[derive(Parser, Debug)]
#[command(name = "weave", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse a stack manifest and statically check the dependency graph.
    Validate(validate::ValidateArgs),
    /// Preview the deployment order, routes, and artifact without emitting.
    Plan(plan::PlanArgs),
    /// Run a full composition pass and emit the artifact set.
    Compose(compose::ComposeArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Validate(args) => validate::execute(args).await,
        Command::Plan(args) => plan::execute(args).await,
        Command::Compose(args) => compose::execute(args).await,
    }
}
