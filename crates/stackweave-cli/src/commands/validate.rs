//! `weave validate` — Static checks on a stack manifest.

use std::path::Path;
use std::sync::Arc;

use clap::Args;
use stackweave_common::constants::DEFAULT_MANIFEST;
use stackweave_compose::graph::GraphBuilder;
use stackweave_remote::resolve_all;

use crate::manifest::{Manifest, placeholder_store};

/// Arguments for the `validate` command.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the stack manifest.
    #[arg(default_value = DEFAULT_MANIFEST)]
    pub manifest: String,
}

/// Executes the `validate` command.
///
/// Parses the manifest and finalizes the dependency graph with
/// placeholder remote values, surfacing duplicate names, dangling
/// references, and cycles without touching any remote scope.
///
/// # Errors
///
/// Returns an error if parsing or graph finalization fails.
pub async fn execute(args: ValidateArgs) -> anyhow::Result<()> {
    let manifest = Manifest::load(Path::new(&args.manifest))?;
    let set = manifest.declaration_set()?;
    let requests = manifest.remote_requests()?;

    let store = Arc::new(placeholder_store(&requests));
    let resolved = resolve_all(store, &requests).await?;

    let mut builder = GraphBuilder::new();
    for spec in set.specs() {
        let _ = builder.add_node(spec.clone())?;
    }
    let graph = builder.finalize(&resolved)?;

    println!(
        "{}: {} resource(s), {} remote reference(s), graph is acyclic",
        args.manifest,
        graph.len(),
        requests.len()
    );
    Ok(())
}
