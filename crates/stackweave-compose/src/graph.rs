//! Dependency graph construction and deterministic finalization using
//! `petgraph`.
//!
//! Nodes are declared in any order (forward references permitted); edges
//! come from explicit `depends_on` lists and implicit node-reference
//! properties. Finalization validates every reference, substitutes the
//! resolved remote values, and freezes a topological order. Given the same
//! declarations the order is identical across runs: Kahn's algorithm with
//! ties broken by declaration order.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::graph::NodeIndex;
use stackweave_common::error::{Result, StackweaveError};
use stackweave_common::types::{NodeId, PropertyValue, ResourceKind};
use stackweave_remote::ResolvedValues;

use crate::declaration::ResourceSpec;

/// A finalized resource within the composition graph.
#[derive(Debug, Clone)]
pub struct ResourceNode {
    /// Stable identity (the logical name).
    pub id: NodeId,
    /// Kind of resource.
    pub kind: ResourceKind,
    /// Properties, with remote references substituted by their values.
    pub properties: BTreeMap<String, PropertyValue>,
    /// Identities of the nodes this one depends on.
    pub depends_on: Vec<NodeId>,
    /// Output identifiers produced for this node by the provisioner seam.
    pub outputs: BTreeMap<String, String>,
}

impl ResourceNode {
    /// Returns a literal property value, if present and literal.
    #[must_use]
    pub fn literal(&self, key: &str) -> Option<&str> {
        match self.properties.get(key) {
            Some(PropertyValue::Literal(value)) => Some(value),
            _ => None,
        }
    }

    /// Returns an output identifier produced for this node.
    #[must_use]
    pub fn output(&self, key: &str) -> Option<&str> {
        self.outputs.get(key).map(String::as_str)
    }
}

/// Builder collecting declared resources into a dependency DAG.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: petgraph::Graph<ResourceNode, ()>,
    indices: HashMap<String, NodeIndex>,
}

impl GraphBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a declared resource as a graph node.
    ///
    /// References to not-yet-added nodes are permitted; they are checked
    /// at [`GraphBuilder::finalize`].
    ///
    /// # Errors
    ///
    /// Returns [`StackweaveError::DuplicateNode`] if the logical name is
    /// already taken.
    pub fn add_node(&mut self, spec: ResourceSpec) -> Result<NodeId> {
        if self.indices.contains_key(&spec.name) {
            return Err(StackweaveError::DuplicateNode { name: spec.name });
        }
        let id = NodeId::new(spec.name.clone());
        let node = ResourceNode {
            id: id.clone(),
            kind: spec.kind,
            properties: spec.properties,
            depends_on: spec
                .depends_on
                .iter()
                .map(|name| NodeId::new(name.clone()))
                .collect(),
            outputs: BTreeMap::new(),
        };
        let index = self.graph.add_node(node);
        let _ = self.indices.insert(spec.name, index);
        Ok(id)
    }

    /// Validates all references, binds resolved remote values, and freezes
    /// the graph with a deterministic topological order.
    ///
    /// # Errors
    ///
    /// - [`StackweaveError::DanglingReference`] if a dependency or `ref`
    ///   property names an undeclared node.
    /// - [`StackweaveError::UnresolvedRemote`] if a `remote` property has
    ///   no resolved value. Resolution is an ordering barrier: every
    ///   remote value must be fetched before finalization.
    /// - [`StackweaveError::CyclicDependency`] if the declarations form a
    ///   cycle.
    pub fn finalize(mut self, resolved: &ResolvedValues) -> Result<ResourceGraph> {
        self.bind_remote_values(resolved)?;
        let edges = self.reference_edges()?;
        for &(dependency, dependent) in &edges {
            let _ = self.graph.add_edge(dependency, dependent, ());
        }
        let order = self.topological_order()?;
        tracing::info!(nodes = order.len(), "dependency graph finalized");
        Ok(ResourceGraph {
            graph: self.graph,
            indices: self.indices,
            order,
        })
    }

    /// Substitutes each remote property with its resolved literal value.
    fn bind_remote_values(&mut self, resolved: &ResolvedValues) -> Result<()> {
        for index in self.graph.node_indices().collect::<Vec<_>>() {
            let node = &mut self.graph[index];
            for value in node.properties.values_mut() {
                if let PropertyValue::Remote { remote } = value {
                    let scope = remote.scope();
                    match resolved.get(&scope, &remote.name) {
                        Some(concrete) => {
                            *value = PropertyValue::Literal(concrete.to_owned());
                        }
                        None => {
                            return Err(StackweaveError::UnresolvedRemote {
                                node: node.id.to_string(),
                                scope: scope.qualifier(),
                                name: remote.name.clone(),
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Collects dependency edges from explicit lists and `ref` properties.
    ///
    /// Edges point dependency → dependent so the topological order yields
    /// dependencies first.
    fn reference_edges(&self) -> Result<Vec<(NodeIndex, NodeIndex)>> {
        let mut edges = Vec::new();
        for index in self.graph.node_indices() {
            let node = &self.graph[index];
            for dep in &node.depends_on {
                let dep_index = self.lookup(node, dep.as_str())?;
                edges.push((dep_index, index));
            }
            for value in node.properties.values() {
                if let PropertyValue::NodeRef { r#ref } = value {
                    let dep_index = self.lookup(node, r#ref)?;
                    edges.push((dep_index, index));
                }
            }
        }
        Ok(edges)
    }

    fn lookup(&self, node: &ResourceNode, reference: &str) -> Result<NodeIndex> {
        self.indices
            .get(reference)
            .copied()
            .ok_or_else(|| StackweaveError::DanglingReference {
                node: node.id.to_string(),
                reference: reference.to_owned(),
            })
    }

    /// Kahn's algorithm with declaration-order tie-breaking.
    ///
    /// Node indices follow insertion order, so draining the ready set in
    /// index order reproduces the same total order on every run.
    fn topological_order(&self) -> Result<Vec<NodeId>> {
        let count = self.graph.node_count();
        let mut indegree = vec![0_usize; count];
        for edge in self.graph.edge_indices() {
            if let Some((_, target)) = self.graph.edge_endpoints(edge) {
                indegree[target.index()] += 1;
            }
        }

        let mut ready: BTreeSet<usize> = indegree
            .iter()
            .enumerate()
            .filter(|&(_, degree)| *degree == 0)
            .map(|(i, _)| i)
            .collect();

        let mut order = Vec::with_capacity(count);
        while let Some(&next) = ready.iter().next() {
            let _ = ready.remove(&next);
            let index = NodeIndex::new(next);
            order.push(self.graph[index].id.clone());
            for neighbor in self
                .graph
                .neighbors_directed(index, petgraph::Direction::Outgoing)
            {
                indegree[neighbor.index()] -= 1;
                if indegree[neighbor.index()] == 0 {
                    let _ = ready.insert(neighbor.index());
                }
            }
        }

        if order.len() < count {
            // Every remaining node participates in or depends on a cycle;
            // report the first one in declaration order.
            let offender = indegree
                .iter()
                .enumerate()
                .find(|&(_, degree)| *degree > 0)
                .map(|(i, _)| self.graph[NodeIndex::new(i)].id.to_string())
                .unwrap_or_default();
            return Err(StackweaveError::CyclicDependency { node: offender });
        }
        Ok(order)
    }
}

/// A finalized, frozen dependency graph.
///
/// Structure and properties are immutable after finalization; the only
/// permitted mutation is recording provisioner outputs on a node.
#[derive(Debug)]
pub struct ResourceGraph {
    graph: petgraph::Graph<ResourceNode, ()>,
    indices: HashMap<String, NodeIndex>,
    order: Vec<NodeId>,
}

impl ResourceGraph {
    /// Returns the deterministic deployment order, dependencies first.
    #[must_use]
    pub fn deploy_order(&self) -> &[NodeId] {
        &self.order
    }

    /// Looks up a finalized node by identity.
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&ResourceNode> {
        self.indices.get(id.as_str()).map(|&index| &self.graph[index])
    }

    /// Returns whether a node with the given identity exists.
    #[must_use]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.indices.contains_key(id.as_str())
    }

    /// Iterates over nodes in topological order.
    pub fn nodes(&self) -> impl Iterator<Item = &ResourceNode> {
        self.order.iter().filter_map(|id| self.node(id))
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns whether the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Records provisioner outputs for a node.
    ///
    /// # Errors
    ///
    /// Returns [`StackweaveError::NotFound`] if the node does not exist.
    pub fn record_outputs(
        &mut self,
        id: &NodeId,
        outputs: BTreeMap<String, String>,
    ) -> Result<()> {
        let index = self
            .indices
            .get(id.as_str())
            .copied()
            .ok_or_else(|| StackweaveError::NotFound {
                kind: "node",
                id: id.to_string(),
            })?;
        self.graph[index].outputs = outputs;
        Ok(())
    }
}
