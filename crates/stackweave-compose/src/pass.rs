//! The composition pass: one deterministic build-then-emit run.
//!
//! A pass moves through a fixed sequence of states; every stage checks the
//! current state and refuses out-of-order operations, so ordering bugs
//! (binding routes before finalization, emitting before synthesis) surface
//! as [`StackweaveError::InvalidState`] instead of silently producing a
//! partial artifact set. Any failure aborts the pass; only the terminal
//! `Emitted` state hands anything to external collaborators.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use stackweave_common::error::{Result, StackweaveError};
use stackweave_common::types::NodeId;
use stackweave_remote::{RemoteRequest, ResolvedValues, ScopeStore, resolve_all};

use crate::declaration::{DeclarationSet, ResourceSpec};
use crate::graph::{GraphBuilder, ResourceGraph};
use crate::provision::ResourceProvisioner;
use crate::routing::{RoutingRule, RoutingTable};
use crate::suppress::{SuppressionEntry, SuppressionRegistry};
use crate::synth::{ConfigArtifact, synthesize};

/// States of one composition pass, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    /// Declarations and remote-reference requests are being collected.
    Declaring,
    /// All remote references have been resolved (barrier passed).
    Resolving,
    /// The dependency graph is frozen and outputs are recorded.
    GraphFinalized,
    /// Routing rules are bound.
    Bound,
    /// The runtime config artifact is assembled.
    ConfigSynthesized,
    /// Suppression metadata is attached.
    SuppressionsApplied,
    /// Terminal: the artifact set has been handed off.
    Emitted,
}

impl fmt::Display for PassState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Declaring => "declaring",
            Self::Resolving => "resolving",
            Self::GraphFinalized => "graph-finalized",
            Self::Bound => "bound",
            Self::ConfigSynthesized => "config-synthesized",
            Self::SuppressionsApplied => "suppressions-applied",
            Self::Emitted => "emitted",
        };
        write!(f, "{name}")
    }
}

/// A requested route binding, by logical names.
#[derive(Debug, Clone)]
pub struct RouteBinding {
    /// Logical name of the content distribution.
    pub distribution: String,
    /// Logical name of the API endpoint.
    pub api: String,
    /// Path prefix to bind (e.g. `/api`).
    pub path_prefix: String,
}

/// A requested suppression, by logical name.
#[derive(Debug, Clone)]
pub struct SuppressionRequest {
    /// Logical name of the target node.
    pub target: String,
    /// Policy rule identifier being suppressed.
    pub rule_id: String,
    /// Operator justification.
    pub justification: String,
    /// Optional sub-resource pattern.
    pub applies_to: Option<String>,
}

/// Everything one pass consumes, collected up front.
#[derive(Debug, Default)]
pub struct PassInput {
    /// Resource declarations.
    pub resources: Vec<ResourceSpec>,
    /// Explicit remote-reference requests (implicit ones come from
    /// `remote` property values).
    pub remote_refs: Vec<RemoteRequest>,
    /// Desired route bindings.
    pub routes: Vec<RouteBinding>,
    /// Suppression directives.
    pub suppressions: Vec<SuppressionRequest>,
}

/// The artifact set handed to external collaborators from the terminal
/// state. Owned by the caller once returned.
#[derive(Debug, Serialize)]
pub struct Emission {
    /// Unique identifier of the pass that produced this emission.
    pub pass_id: String,
    /// When the emission was produced.
    pub emitted_at: DateTime<Utc>,
    /// Deterministic deployment order, dependencies first.
    pub deploy_order: Vec<NodeId>,
    /// The runtime configuration artifact.
    pub artifact: ConfigArtifact,
    /// Every bound routing rule.
    pub routes: Vec<RoutingRule>,
    /// Every effective suppression entry.
    pub suppressions: Vec<SuppressionEntry>,
}

/// Driver for one composition pass.
#[derive(Debug)]
pub struct CompositionPass {
    state: PassState,
    pass_id: uuid::Uuid,
    declarations: DeclarationSet,
    remote_requests: Vec<RemoteRequest>,
    resolved: ResolvedValues,
    graph: Option<ResourceGraph>,
    routes: RoutingTable,
    artifact: Option<ConfigArtifact>,
    suppressions: SuppressionRegistry,
}

impl CompositionPass {
    /// Starts a pass in the `Declaring` state.
    #[must_use]
    pub fn new() -> Self {
        let pass_id = uuid::Uuid::new_v4();
        tracing::info!(pass_id = %pass_id, "composition pass started");
        Self {
            state: PassState::Declaring,
            pass_id,
            declarations: DeclarationSet::new(),
            remote_requests: Vec::new(),
            resolved: ResolvedValues::empty(),
            graph: None,
            routes: RoutingTable::new(),
            artifact: None,
            suppressions: SuppressionRegistry::new(),
        }
    }

    /// Returns the current pass state.
    #[must_use]
    pub const fn state(&self) -> PassState {
        self.state
    }

    /// Declares a resource.
    ///
    /// # Errors
    ///
    /// Fails outside the `Declaring` state or on a duplicate name.
    pub fn declare(&mut self, spec: ResourceSpec) -> Result<()> {
        self.expect_state(PassState::Declaring, "declare resources")?;
        self.declarations.declare(spec)
    }

    /// Adds an explicit remote-reference request.
    ///
    /// # Errors
    ///
    /// Fails outside the `Declaring` state.
    pub fn request_remote(&mut self, request: RemoteRequest) -> Result<()> {
        self.expect_state(PassState::Declaring, "request remote references")?;
        self.remote_requests.push(request);
        Ok(())
    }

    /// Resolves every remote reference (explicit and property-implied)
    /// against the store. This is the pass's only blocking stage; all
    /// fetches are joined before it returns.
    ///
    /// # Errors
    ///
    /// Fails outside the `Declaring` state or when any resolution fails,
    /// aborting the pass.
    pub async fn resolve<S>(&mut self, store: Arc<S>) -> Result<()>
    where
        S: ScopeStore + 'static,
    {
        self.expect_state(PassState::Declaring, "resolve remote references")?;
        let mut requests = self.declarations.remote_requests();
        requests.extend(self.remote_requests.iter().cloned());
        self.resolved = resolve_all(store, &requests).await?;
        self.transition(PassState::Resolving);
        Ok(())
    }

    /// Freezes the dependency graph and records provisioner outputs for
    /// every node in topological order.
    ///
    /// # Errors
    ///
    /// Fails outside the `Resolving` state, on any malformed-graph
    /// condition, or when the provisioner cannot produce outputs.
    pub fn finalize(&mut self, provisioner: &dyn ResourceProvisioner) -> Result<()> {
        self.expect_state(PassState::Resolving, "finalize the graph")?;
        let mut builder = GraphBuilder::new();
        for spec in self.declarations.specs() {
            let _ = builder.add_node(spec.clone())?;
        }
        let mut graph = builder.finalize(&self.resolved)?;

        let order: Vec<NodeId> = graph.deploy_order().to_vec();
        for id in &order {
            let node = graph.node(id).ok_or_else(|| StackweaveError::NotFound {
                kind: "node",
                id: id.to_string(),
            })?;
            let outputs = provisioner.provision(node)?;
            graph.record_outputs(id, outputs)?;
        }

        self.graph = Some(graph);
        self.transition(PassState::GraphFinalized);
        Ok(())
    }

    /// Binds the requested routes. Runs strictly after finalization.
    ///
    /// # Errors
    ///
    /// Fails outside the `GraphFinalized` state or on any binding error.
    pub fn bind_routes(&mut self, bindings: &[RouteBinding]) -> Result<()> {
        self.expect_state(PassState::GraphFinalized, "bind routes")?;
        let graph = self.graph.as_ref().ok_or_else(|| StackweaveError::InvalidState {
            operation: "bind routes",
            state: self.state.to_string(),
        })?;
        for binding in bindings {
            self.routes.bind(
                graph,
                &NodeId::new(binding.distribution.clone()),
                &NodeId::new(binding.api.clone()),
                &binding.path_prefix,
            )?;
        }
        self.transition(PassState::Bound);
        Ok(())
    }

    /// Assembles the runtime configuration artifact.
    ///
    /// # Errors
    ///
    /// Fails outside the `Bound` state or when a required output is
    /// missing.
    pub fn synthesize(&mut self) -> Result<()> {
        self.expect_state(PassState::Bound, "synthesize the artifact")?;
        let artifact = synthesize(self.graph_ref()?)?;
        self.artifact = Some(artifact);
        self.transition(PassState::ConfigSynthesized);
        Ok(())
    }

    /// Attaches suppression metadata to finalized nodes.
    ///
    /// # Errors
    ///
    /// Fails outside the `ConfigSynthesized` state or when a target does
    /// not exist.
    pub fn apply_suppressions(&mut self, requests: &[SuppressionRequest]) -> Result<()> {
        self.expect_state(PassState::ConfigSynthesized, "apply suppressions")?;
        let graph = self.graph.as_ref().ok_or_else(|| StackweaveError::InvalidState {
            operation: "apply suppressions",
            state: self.state.to_string(),
        })?;
        for request in requests {
            let _ = self.suppressions.suppress(
                graph,
                &NodeId::new(request.target.clone()),
                request.rule_id.clone(),
                request.justification.clone(),
                request.applies_to.clone(),
            )?;
        }
        self.transition(PassState::SuppressionsApplied);
        Ok(())
    }

    /// Enters the terminal state and hands off the artifact set by value.
    ///
    /// # Errors
    ///
    /// Fails outside the `SuppressionsApplied` state.
    pub fn emit(mut self) -> Result<Emission> {
        self.expect_state(PassState::SuppressionsApplied, "emit")?;
        let graph = self.graph.take().ok_or_else(|| StackweaveError::InvalidState {
            operation: "emit",
            state: self.state.to_string(),
        })?;
        let artifact = self.artifact.take().ok_or_else(|| StackweaveError::InvalidState {
            operation: "emit",
            state: self.state.to_string(),
        })?;
        self.transition(PassState::Emitted);
        Ok(Emission {
            pass_id: self.pass_id.to_string(),
            emitted_at: Utc::now(),
            deploy_order: graph.deploy_order().to_vec(),
            artifact,
            routes: self.routes.rules().to_vec(),
            suppressions: self.suppressions.entries().to_vec(),
        })
    }

    /// Runs a whole pass from collected input to emission.
    ///
    /// # Errors
    ///
    /// Propagates the first failure from any stage; the pass is then
    /// unusable and nothing has been emitted.
    pub async fn run<S>(
        input: PassInput,
        store: Arc<S>,
        provisioner: &dyn ResourceProvisioner,
    ) -> Result<Emission>
    where
        S: ScopeStore + 'static,
    {
        let mut pass = Self::new();
        for spec in input.resources {
            pass.declare(spec)?;
        }
        for request in input.remote_refs {
            pass.request_remote(request)?;
        }
        pass.resolve(store).await?;
        pass.finalize(provisioner)?;
        pass.bind_routes(&input.routes)?;
        pass.synthesize()?;
        pass.apply_suppressions(&input.suppressions)?;
        pass.emit()
    }

    fn graph_ref(&self) -> Result<&ResourceGraph> {
        self.graph.as_ref().ok_or_else(|| StackweaveError::InvalidState {
            operation: "access the graph",
            state: self.state.to_string(),
        })
    }

    fn expect_state(&self, expected: PassState, operation: &'static str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(StackweaveError::InvalidState {
                operation,
                state: self.state.to_string(),
            })
        }
    }

    fn transition(&mut self, next: PassState) {
        tracing::info!(pass_id = %self.pass_id, from = %self.state, to = %next, "pass transition");
        self.state = next;
    }
}

impl Default for CompositionPass {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provision::PlanProvisioner;
    use stackweave_common::types::ResourceKind;
    use stackweave_remote::StaticScopeStore;

    fn empty_store() -> Arc<StaticScopeStore> {
        Arc::new(StaticScopeStore::new())
    }

    #[test]
    fn new_pass_starts_declaring() {
        let pass = CompositionPass::new();
        assert_eq!(pass.state(), PassState::Declaring);
    }

    #[test]
    fn binding_before_finalization_is_an_invalid_state() {
        let mut pass = CompositionPass::new();
        let err = pass.bind_routes(&[]).unwrap_err();
        assert!(matches!(err, StackweaveError::InvalidState { .. }));
        assert!(err.to_string().contains("declaring"));
    }

    #[test]
    fn emitting_before_synthesis_is_an_invalid_state() {
        let pass = CompositionPass::new();
        let err = pass.emit().unwrap_err();
        assert!(matches!(err, StackweaveError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn declaring_after_resolution_is_rejected() {
        let mut pass = CompositionPass::new();
        pass.declare(ResourceSpec::new("assets", ResourceKind::Storage))
            .expect("declare");
        pass.resolve(empty_store()).await.expect("resolve");

        let err = pass
            .declare(ResourceSpec::new("late", ResourceKind::Storage))
            .unwrap_err();
        assert!(matches!(err, StackweaveError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn failed_resolution_leaves_pass_declaring() {
        let mut pass = CompositionPass::new();
        pass.request_remote(RemoteRequest::new(
            stackweave_common::types::ScopeDescriptor::region("us-east-1"),
            "absent",
        ))
        .expect("request");

        let err = pass.resolve(empty_store()).await.unwrap_err();
        assert!(matches!(err, StackweaveError::RemoteNotFound { .. }));
        assert_eq!(pass.state(), PassState::Declaring);
    }

    #[tokio::test]
    async fn stages_walk_the_full_state_machine() {
        let mut pass = CompositionPass::new();
        pass.declare(ResourceSpec::new("assets", ResourceKind::Storage))
            .expect("declare");
        pass.declare(ResourceSpec::new("identity", ResourceKind::IdentityProvider))
            .expect("declare");
        pass.declare(ResourceSpec::new("api", ResourceKind::ApiEndpoint).depends_on("identity"))
            .expect("declare");
        pass.declare(
            ResourceSpec::new("cdn", ResourceKind::ContentDistribution).depends_on("api"),
        )
        .expect("declare");

        pass.resolve(empty_store()).await.expect("resolve");
        assert_eq!(pass.state(), PassState::Resolving);

        pass.finalize(&PlanProvisioner::default()).expect("finalize");
        assert_eq!(pass.state(), PassState::GraphFinalized);

        pass.bind_routes(&[RouteBinding {
            distribution: "cdn".into(),
            api: "api".into(),
            path_prefix: "/api".into(),
        }])
        .expect("bind");
        assert_eq!(pass.state(), PassState::Bound);

        pass.synthesize().expect("synthesize");
        assert_eq!(pass.state(), PassState::ConfigSynthesized);

        pass.apply_suppressions(&[]).expect("suppress");
        assert_eq!(pass.state(), PassState::SuppressionsApplied);

        let emission = pass.emit().expect("emit");
        assert_eq!(emission.deploy_order.len(), 4);
        assert!(!emission.artifact.is_empty());
    }
}
