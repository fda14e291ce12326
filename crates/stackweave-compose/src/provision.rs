//! Collaborator seam producing node output identifiers.
//!
//! Real provisioners (object storage, identity pools, CDN distributions)
//! live outside this crate; the engine only consumes the identifiers they
//! produce. [`PlanProvisioner`] derives stable placeholder identifiers so
//! planning and tests get a fully populated graph without touching any
//! provider.

use std::collections::BTreeMap;

use stackweave_common::error::Result;
use stackweave_common::types::ResourceKind;

use crate::graph::ResourceNode;

/// Produces output identifiers for a finalized node.
pub trait ResourceProvisioner {
    /// Returns the outputs (bucket names, pool ids, URLs) for one node.
    ///
    /// # Errors
    ///
    /// Returns an error if the collaborator cannot produce the outputs.
    fn provision(&self, node: &ResourceNode) -> Result<BTreeMap<String, String>>;
}

/// Deterministic provisioner deriving placeholder identifiers from the
/// node name and deployment stage. Identical declarations always yield
/// identical outputs.
#[derive(Debug, Clone)]
pub struct PlanProvisioner {
    stage: String,
}

impl PlanProvisioner {
    /// Creates a provisioner for the given deployment stage.
    #[must_use]
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
        }
    }
}

impl Default for PlanProvisioner {
    fn default() -> Self {
        Self::new("prod")
    }
}

impl ResourceProvisioner for PlanProvisioner {
    fn provision(&self, node: &ResourceNode) -> Result<BTreeMap<String, String>> {
        let name = node.id.as_str();
        let mut outputs = BTreeMap::new();
        let mut put = |key: &str, value: String| {
            let _ = outputs.insert(key.to_owned(), value);
        };
        match node.kind {
            ResourceKind::Storage => {
                put("bucket_name", format!("{name}-bucket"));
                put("bucket_domain", format!("{name}-bucket.storage.local"));
            }
            ResourceKind::IdentityProvider => {
                put("pool_id", format!("{name}-pool"));
                put("client_id", format!("{name}-client"));
            }
            ResourceKind::ApiEndpoint => {
                put("url", format!("https://{name}.api.local/{}", self.stage));
            }
            ResourceKind::ContentDistribution => {
                put("domain", format!("{name}.cdn.local"));
            }
            ResourceKind::AuditSink => {
                put("trail_name", format!("{name}-trail"));
            }
            ResourceKind::ConfigPublisher => {}
        }
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::ResourceSpec;
    use crate::graph::GraphBuilder;
    use stackweave_common::types::NodeId;
    use stackweave_remote::ResolvedValues;

    fn node(name: &str, kind: ResourceKind) -> ResourceNode {
        let mut builder = GraphBuilder::new();
        let _ = builder.add_node(ResourceSpec::new(name, kind)).expect("add");
        let graph = builder.finalize(&ResolvedValues::empty()).expect("finalize");
        graph.node(&NodeId::new(name)).expect("node").clone()
    }

    #[test]
    fn plan_outputs_are_deterministic() {
        let api = node("api", ResourceKind::ApiEndpoint);
        let provisioner = PlanProvisioner::default();
        let first = provisioner.provision(&api).expect("provision");
        let second = provisioner.provision(&api).expect("provision");
        assert_eq!(first, second);
        assert_eq!(
            first.get("url").map(String::as_str),
            Some("https://api.api.local/prod")
        );
    }

    #[test]
    fn stage_feeds_the_endpoint_url() {
        let api = node("api", ResourceKind::ApiEndpoint);
        let outputs = PlanProvisioner::new("staging")
            .provision(&api)
            .expect("provision");
        assert_eq!(
            outputs.get("url").map(String::as_str),
            Some("https://api.api.local/staging")
        );
    }

    #[test]
    fn identity_provider_produces_pool_and_client() {
        let identity = node("identity", ResourceKind::IdentityProvider);
        let outputs = PlanProvisioner::default().provision(&identity).expect("provision");
        assert_eq!(outputs.get("pool_id").map(String::as_str), Some("identity-pool"));
        assert_eq!(
            outputs.get("client_id").map(String::as_str),
            Some("identity-client")
        );
    }

    #[test]
    fn config_publisher_produces_no_outputs() {
        let publisher = node("runtime-config", ResourceKind::ConfigPublisher);
        let outputs = PlanProvisioner::default().provision(&publisher).expect("provision");
        assert!(outputs.is_empty());
    }
}
