//! Runtime configuration artifact synthesis.
//!
//! Walks the finalized graph in topological order collecting the fixed
//! output vocabulary the browser-side client consumes. A missing required
//! output is a deployment-time fatal error; the runtime client has no
//! fallback for an absent key.

use std::collections::BTreeMap;

use serde::Serialize;
use stackweave_common::constants::{
    KEY_API_URL, KEY_ARTIFACT_BUCKET, KEY_ASSET_BUCKET, KEY_IDENTITY_CLIENT_ID,
    KEY_IDENTITY_POOL_ID, PROP_STORAGE_PURPOSE, PURPOSE_ARTIFACTS, PURPOSE_ASSETS,
    REQUIRED_ARTIFACT_KEYS,
};
use stackweave_common::error::{Result, StackweaveError};
use stackweave_common::types::ResourceKind;

use crate::graph::{ResourceGraph, ResourceNode};

/// The published runtime configuration: an ordered map of identifier keys
/// to string values. Immutable once synthesized; handed off by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConfigArtifact {
    entries: BTreeMap<String, String>,
}

impl ConfigArtifact {
    /// Looks up a value by artifact key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Iterates over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the artifact has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serializes the artifact to JSON with stable key order.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }
}

/// Assembles the runtime configuration artifact from a finalized graph.
///
/// # Errors
///
/// Returns [`StackweaveError::MissingOutput`] if any required key was
/// never produced (or was produced empty) by a node of the relevant kind.
pub fn synthesize(graph: &ResourceGraph) -> Result<ConfigArtifact> {
    let mut entries: BTreeMap<String, String> = BTreeMap::new();
    for node in graph.nodes() {
        for (key, value) in contributions(node) {
            if value.is_empty() {
                continue;
            }
            if entries.contains_key(key) {
                tracing::warn!(node = %node.id, key, "duplicate artifact contribution ignored");
                continue;
            }
            let _ = entries.insert(key.to_owned(), value);
        }
    }

    for key in REQUIRED_ARTIFACT_KEYS {
        if !entries.contains_key(key) {
            return Err(StackweaveError::MissingOutput {
                key: key.to_owned(),
            });
        }
    }

    tracing::info!(keys = entries.len(), "runtime config artifact synthesized");
    Ok(ConfigArtifact { entries })
}

/// Returns the artifact entries one node contributes, by kind.
fn contributions(node: &ResourceNode) -> Vec<(&'static str, String)> {
    let out = |key: &str| node.output(key).unwrap_or_default().to_owned();
    match node.kind {
        ResourceKind::IdentityProvider => vec![
            (KEY_IDENTITY_POOL_ID, out("pool_id")),
            (KEY_IDENTITY_CLIENT_ID, out("client_id")),
        ],
        ResourceKind::ApiEndpoint => vec![(KEY_API_URL, out("url"))],
        ResourceKind::Storage => {
            let purpose = node.literal(PROP_STORAGE_PURPOSE).unwrap_or(PURPOSE_ASSETS);
            let key = match purpose {
                PURPOSE_ASSETS => KEY_ASSET_BUCKET,
                PURPOSE_ARTIFACTS => KEY_ARTIFACT_BUCKET,
                other => {
                    tracing::warn!(node = %node.id, purpose = other, "unknown storage purpose");
                    return Vec::new();
                }
            };
            vec![(key, out("bucket_name"))]
        }
        ResourceKind::AuditSink | ResourceKind::ContentDistribution | ResourceKind::ConfigPublisher => {
            Vec::new()
        }
    }
}
