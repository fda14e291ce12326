//! Policy suppression registry.
//!
//! Suppressions mark known, accepted policy exceptions for specific graph
//! nodes. They are applied after finalization, when node identities are
//! stable, and keyed by `(node, rule_id)` rather than textual paths.
//! Nodes are never mutated; the entries ride alongside the graph for
//! downstream validators.

use std::collections::HashSet;

use serde::Serialize;
use stackweave_common::error::{Result, StackweaveError};
use stackweave_common::types::NodeId;

use crate::graph::ResourceGraph;

/// One recorded policy exception.
#[derive(Debug, Clone, Serialize)]
pub struct SuppressionEntry {
    /// Node the exception applies to.
    pub target: NodeId,
    /// Identifier of the suppressed policy rule.
    pub rule_id: String,
    /// Operator-provided justification.
    pub justification: String,
    /// Optional sub-resource pattern the exception is limited to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applies_to: Option<String>,
}

/// Registry of suppression entries for one pass.
#[derive(Debug, Default)]
pub struct SuppressionRegistry {
    entries: Vec<SuppressionEntry>,
    seen: HashSet<(NodeId, String)>,
}

impl SuppressionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a suppression for a finalized node.
    ///
    /// Idempotent: re-applying the same `(target, rule_id)` pair is a
    /// no-op and returns `false`; a newly recorded entry returns `true`.
    ///
    /// # Errors
    ///
    /// Returns [`StackweaveError::NotFound`] if the target node does not
    /// exist in the graph at application time.
    pub fn suppress(
        &mut self,
        graph: &ResourceGraph,
        target: &NodeId,
        rule_id: impl Into<String>,
        justification: impl Into<String>,
        applies_to: Option<String>,
    ) -> Result<bool> {
        if !graph.contains(target) {
            return Err(StackweaveError::NotFound {
                kind: "suppression target",
                id: target.to_string(),
            });
        }
        let rule_id = rule_id.into();
        if !self.seen.insert((target.clone(), rule_id.clone())) {
            tracing::debug!(target = %target, rule_id = %rule_id, "suppression already recorded");
            return Ok(false);
        }
        self.entries.push(SuppressionEntry {
            target: target.clone(),
            rule_id,
            justification: justification.into(),
            applies_to,
        });
        Ok(true)
    }

    /// Returns the recorded entries in application order.
    #[must_use]
    pub fn entries(&self) -> &[SuppressionEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::ResourceSpec;
    use crate::graph::GraphBuilder;
    use stackweave_common::types::ResourceKind;
    use stackweave_remote::ResolvedValues;

    fn single_node_graph() -> ResourceGraph {
        let mut builder = GraphBuilder::new();
        let _ = builder
            .add_node(ResourceSpec::new("assets", ResourceKind::Storage))
            .expect("add");
        builder.finalize(&ResolvedValues::empty()).expect("finalize")
    }

    #[test]
    fn suppress_records_entry() {
        let graph = single_node_graph();
        let mut registry = SuppressionRegistry::new();
        let recorded = registry
            .suppress(
                &graph,
                &NodeId::new("assets"),
                "S1",
                "access logs ship to the audit sink instead",
                None,
            )
            .expect("suppress");
        assert!(recorded);
        assert_eq!(registry.entries().len(), 1);
        assert_eq!(registry.entries()[0].rule_id, "S1");
    }

    #[test]
    fn reapplying_same_pair_is_a_noop() {
        let graph = single_node_graph();
        let mut registry = SuppressionRegistry::new();
        let first = registry
            .suppress(&graph, &NodeId::new("assets"), "S1", "justified", None)
            .expect("suppress");
        let second = registry
            .suppress(&graph, &NodeId::new("assets"), "S1", "justified again", None)
            .expect("suppress");
        assert!(first);
        assert!(!second);
        assert_eq!(registry.entries().len(), 1);
    }

    #[test]
    fn different_rule_on_same_node_is_a_new_entry() {
        let graph = single_node_graph();
        let mut registry = SuppressionRegistry::new();
        let _ = registry
            .suppress(&graph, &NodeId::new("assets"), "S1", "justified", None)
            .expect("suppress");
        let _ = registry
            .suppress(
                &graph,
                &NodeId::new("assets"),
                "S2",
                "versioning handled upstream",
                Some("lifecycle/*".into()),
            )
            .expect("suppress");
        assert_eq!(registry.entries().len(), 2);
        assert_eq!(registry.entries()[1].applies_to.as_deref(), Some("lifecycle/*"));
    }

    #[test]
    fn unknown_target_is_rejected() {
        let graph = single_node_graph();
        let mut registry = SuppressionRegistry::new();
        let err = registry
            .suppress(&graph, &NodeId::new("ghost"), "S1", "justified", None)
            .unwrap_err();
        assert!(matches!(err, StackweaveError::NotFound { .. }));
    }
}
