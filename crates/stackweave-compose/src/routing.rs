//! Path-based routing rules binding a content distribution to an API
//! endpoint.
//!
//! Binding runs strictly after graph finalization: both endpoints must be
//! concrete nodes before a rule may reference them. Each distribution
//! carries an implicit catch-all static-content rule; API prefixes bind at
//! a higher priority so they always shadow it.

use serde::Serialize;
use stackweave_common::constants::{
    CATCH_ALL_PATTERN, ROUTE_PRIORITY_API, ROUTE_PRIORITY_CATCH_ALL,
};
use stackweave_common::error::{Result, StackweaveError};
use stackweave_common::types::{NodeId, ResourceKind};

use crate::graph::ResourceGraph;

/// A single routing rule attached to a distribution.
///
/// Lower priority values evaluate first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingRule {
    /// Distribution the rule is attached to.
    pub distribution: NodeId,
    /// Path pattern matched against incoming requests.
    pub path_pattern: String,
    /// Node requests matching the pattern are routed to.
    pub target: NodeId,
    /// Evaluation priority; lower values win.
    pub priority: u32,
}

/// The set of routing rules bound during one pass.
#[derive(Debug, Default)]
pub struct RoutingTable {
    rules: Vec<RoutingRule>,
}

impl RoutingTable {
    /// Creates an empty routing table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds an API endpoint under a path prefix on a distribution.
    ///
    /// The prefix is normalized to a `<prefix>/*` pattern. The first rule
    /// bound for a distribution also installs its implicit catch-all
    /// static-content rule.
    ///
    /// # Errors
    ///
    /// - [`StackweaveError::NotFound`] if either node is absent from the
    ///   finalized graph.
    /// - [`StackweaveError::Config`] if either node has the wrong kind or
    ///   the prefix does not start with `/`.
    /// - [`StackweaveError::ConflictingRoute`] if the pattern collides
    ///   with an existing rule at equal priority.
    pub fn bind(
        &mut self,
        graph: &ResourceGraph,
        distribution: &NodeId,
        api_endpoint: &NodeId,
        path_prefix: &str,
    ) -> Result<()> {
        let dist_node = graph.node(distribution).ok_or_else(|| StackweaveError::NotFound {
            kind: "distribution node",
            id: distribution.to_string(),
        })?;
        let api_node = graph.node(api_endpoint).ok_or_else(|| StackweaveError::NotFound {
            kind: "api node",
            id: api_endpoint.to_string(),
        })?;
        if dist_node.kind != ResourceKind::ContentDistribution {
            return Err(StackweaveError::Config {
                message: format!(
                    "node \"{distribution}\" is {}, expected content-distribution",
                    dist_node.kind
                ),
            });
        }
        if api_node.kind != ResourceKind::ApiEndpoint {
            return Err(StackweaveError::Config {
                message: format!(
                    "node \"{api_endpoint}\" is {}, expected api-endpoint",
                    api_node.kind
                ),
            });
        }
        if !path_prefix.starts_with('/') {
            return Err(StackweaveError::Config {
                message: format!("path prefix \"{path_prefix}\" must start with /"),
            });
        }

        if !self.rules.iter().any(|r| r.distribution == *distribution) {
            self.rules.push(RoutingRule {
                distribution: distribution.clone(),
                path_pattern: CATCH_ALL_PATTERN.to_owned(),
                target: distribution.clone(),
                priority: ROUTE_PRIORITY_CATCH_ALL,
            });
        }

        let pattern = normalize_pattern(path_prefix);
        let collides = self.rules.iter().any(|r| {
            r.distribution == *distribution
                && r.path_pattern == pattern
                && r.priority == ROUTE_PRIORITY_API
        });
        if collides {
            return Err(StackweaveError::ConflictingRoute {
                path: pattern,
                priority: ROUTE_PRIORITY_API,
            });
        }

        tracing::info!(
            distribution = %distribution,
            target = %api_endpoint,
            pattern = %pattern,
            "route bound"
        );
        self.rules.push(RoutingRule {
            distribution: distribution.clone(),
            path_pattern: pattern,
            target: api_endpoint.clone(),
            priority: ROUTE_PRIORITY_API,
        });
        Ok(())
    }

    /// Returns the rules for one distribution, priority first, then
    /// insertion order.
    #[must_use]
    pub fn rules_for(&self, distribution: &NodeId) -> Vec<&RoutingRule> {
        let mut rules: Vec<&RoutingRule> = self
            .rules
            .iter()
            .filter(|r| r.distribution == *distribution)
            .collect();
        rules.sort_by_key(|r| r.priority);
        rules
    }

    /// Returns every bound rule in insertion order.
    #[must_use]
    pub fn rules(&self) -> &[RoutingRule] {
        &self.rules
    }
}

/// Normalizes a path prefix into a wildcard pattern.
fn normalize_pattern(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.ends_with("/*") {
        trimmed.to_owned()
    } else {
        format!("{trimmed}/*")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::ResourceSpec;
    use crate::graph::GraphBuilder;
    use stackweave_remote::ResolvedValues;

    fn graph_with_endpoints() -> ResourceGraph {
        let mut builder = GraphBuilder::new();
        let _ = builder
            .add_node(ResourceSpec::new("api", ResourceKind::ApiEndpoint))
            .expect("add");
        let _ = builder
            .add_node(ResourceSpec::new("cdn", ResourceKind::ContentDistribution).depends_on("api"))
            .expect("add");
        builder.finalize(&ResolvedValues::empty()).expect("finalize")
    }

    #[test]
    fn bind_installs_catch_all_and_api_rule() {
        let graph = graph_with_endpoints();
        let mut table = RoutingTable::new();
        table
            .bind(&graph, &NodeId::new("cdn"), &NodeId::new("api"), "/api")
            .expect("bind");

        let rules = table.rules_for(&NodeId::new("cdn"));
        assert_eq!(rules.len(), 2);
        // API rule evaluates before the catch-all.
        assert_eq!(rules[0].path_pattern, "/api/*");
        assert_eq!(rules[0].target, NodeId::new("api"));
        assert_eq!(rules[1].path_pattern, CATCH_ALL_PATTERN);
        assert!(rules[0].priority < rules[1].priority);
    }

    #[test]
    fn equal_prefix_and_priority_conflicts() {
        let graph = graph_with_endpoints();
        let mut table = RoutingTable::new();
        table
            .bind(&graph, &NodeId::new("cdn"), &NodeId::new("api"), "/api")
            .expect("bind");

        let err = table
            .bind(&graph, &NodeId::new("cdn"), &NodeId::new("api"), "/api")
            .unwrap_err();
        assert!(matches!(err, StackweaveError::ConflictingRoute { .. }));
    }

    #[test]
    fn distinct_prefixes_both_bind_and_are_retrievable() {
        let graph = graph_with_endpoints();
        let mut table = RoutingTable::new();
        table
            .bind(&graph, &NodeId::new("cdn"), &NodeId::new("api"), "/api")
            .expect("bind");
        table
            .bind(&graph, &NodeId::new("cdn"), &NodeId::new("api"), "/auth")
            .expect("bind");

        let rules = table.rules_for(&NodeId::new("cdn"));
        let patterns: Vec<&str> = rules.iter().map(|r| r.path_pattern.as_str()).collect();
        assert!(patterns.contains(&"/api/*"));
        assert!(patterns.contains(&"/auth/*"));
        // One catch-all, not one per binding.
        assert_eq!(rules.len(), 3);
    }

    #[test]
    fn binding_unknown_node_fails() {
        let graph = graph_with_endpoints();
        let mut table = RoutingTable::new();
        let err = table
            .bind(&graph, &NodeId::new("ghost"), &NodeId::new("api"), "/api")
            .unwrap_err();
        assert!(matches!(err, StackweaveError::NotFound { .. }));
    }

    #[test]
    fn binding_wrong_kind_fails() {
        let graph = graph_with_endpoints();
        let mut table = RoutingTable::new();
        // Distribution and API swapped.
        let err = table
            .bind(&graph, &NodeId::new("api"), &NodeId::new("cdn"), "/api")
            .unwrap_err();
        assert!(matches!(err, StackweaveError::Config { .. }));
    }

    #[test]
    fn prefix_without_leading_slash_is_rejected() {
        let graph = graph_with_endpoints();
        let mut table = RoutingTable::new();
        let err = table
            .bind(&graph, &NodeId::new("cdn"), &NodeId::new("api"), "api")
            .unwrap_err();
        assert!(matches!(err, StackweaveError::Config { .. }));
    }

    #[test]
    fn trailing_slash_and_wildcard_prefixes_normalize() {
        assert_eq!(normalize_pattern("/api"), "/api/*");
        assert_eq!(normalize_pattern("/api/"), "/api/*");
        assert_eq!(normalize_pattern("/api/*"), "/api/*");
    }
}
