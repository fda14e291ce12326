//! `weave plan` — Preview the composition result before emitting.

use std::path::Path;
use std::sync::Arc;

use clap::Args;
use stackweave_common::constants::DEFAULT_MANIFEST;
use stackweave_common::types::NodeId;
use stackweave_compose::pass::CompositionPass;
use stackweave_compose::provision::PlanProvisioner;

use crate::manifest::{Manifest, placeholder_store};
use crate::output::{format_order, format_route};

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Path to the stack manifest.
    #[arg(default_value = DEFAULT_MANIFEST)]
    pub manifest: String,
}

/// Executes the `plan` command.
///
/// Runs a full composition pass against placeholder remote values and the
/// plan provisioner, then renders the deployment order, bound routes, and
/// artifact keys. Nothing is emitted to external collaborators.
///
/// # Errors
///
/// Returns an error if any pass stage fails.
pub async fn execute(args: PlanArgs) -> anyhow::Result<()> {
    let manifest = Manifest::load(Path::new(&args.manifest))?;
    let context = manifest.context();
    let stage = context.setting_or("stage-name", "prod");

    let requests = manifest.remote_requests()?;
    let store = Arc::new(placeholder_store(&requests));
    let input = manifest.into_input()?;
    let distributions: std::collections::BTreeSet<NodeId> = input
        .routes
        .iter()
        .map(|r| NodeId::new(r.distribution.clone()))
        .collect();

    let emission = CompositionPass::run(input, store, &PlanProvisioner::new(stage)).await?;

    println!("Deployment plan for: {}", args.manifest);
    println!();
    print!("{}", format_order(&emission.deploy_order));

    if !emission.routes.is_empty() {
        println!();
        for distribution in &distributions {
            println!("Routes on {distribution}:");
            let mut rules: Vec<_> = emission
                .routes
                .iter()
                .filter(|r| r.distribution == *distribution)
                .collect();
            rules.sort_by_key(|r| r.priority);
            for rule in rules {
                println!("{}", format_route(rule));
            }
        }
    }

    println!();
    println!("Artifact keys (placeholder values):");
    for (key, value) in emission.artifact.iter() {
        println!("  {key} = {value}");
    }
    if !emission.suppressions.is_empty() {
        println!();
        println!("{} suppression(s) recorded.", emission.suppressions.len());
    }
    Ok(())
}
