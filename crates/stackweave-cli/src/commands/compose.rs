//! `weave compose` — Run a full composition pass and emit the artifact set.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use stackweave_common::constants::DEFAULT_MANIFEST;
use stackweave_compose::pass::{CompositionPass, Emission};
use stackweave_compose::provision::PlanProvisioner;
use stackweave_remote::HttpScopeStore;

use crate::manifest::{Manifest, load_params};

/// Arguments for the `compose` command.
#[derive(Args, Debug)]
pub struct ComposeArgs {
    /// Path to the stack manifest.
    #[arg(default_value = DEFAULT_MANIFEST)]
    pub manifest: String,

    /// Base URL of the parameter service answering remote lookups.
    #[arg(long, conflicts_with = "params")]
    pub param_service: Option<String>,

    /// YAML file of scope/name/value entries answering remote lookups.
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// File to write the emission JSON to; stdout when omitted.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Executes the `compose` command.
///
/// Resolves remote references against the configured source, runs the
/// pass to the terminal state, and writes the emission envelope as JSON.
///
/// # Errors
///
/// Returns an error if any pass stage fails or the emission cannot be
/// written.
pub async fn execute(args: ComposeArgs) -> anyhow::Result<()> {
    let manifest = Manifest::load(Path::new(&args.manifest))?;
    let context = manifest.context();
    // Context settings resolve once, before declarations are built.
    let stage = context.setting_or("stage-name", "prod");
    if let Some(email) = context.setting("admin-email") {
        tracing::info!(admin_email = %email, stage = %stage, "composing deployment");
    } else {
        tracing::warn!(stage = %stage, "no admin-email context setting; alarms will be unrouted");
    }

    let input = manifest.into_input()?;
    let provisioner = PlanProvisioner::new(stage);

    let emission = if let Some(base_url) = args.param_service {
        CompositionPass::run(input, Arc::new(HttpScopeStore::new(base_url)), &provisioner).await?
    } else if let Some(params) = &args.params {
        CompositionPass::run(input, Arc::new(load_params(params)?), &provisioner).await?
    } else {
        CompositionPass::run(
            input,
            Arc::new(stackweave_remote::StaticScopeStore::new()),
            &provisioner,
        )
        .await?
    };

    write_emission(&emission, args.out.as_deref())
}

fn write_emission(emission: &Emission, out: Option<&Path>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(emission)?;
    match out {
        Some(path) => {
            std::fs::write(path, json)?;
            tracing::info!(path = %path.display(), "emission written");
        }
        None => println!("{json}"),
    }
    Ok(())
}
