//! Resource declaration set: the name → specification table.
//!
//! Declarations are collected first, in full, before any reference is
//! resolved. Forward references by logical name are permitted during
//! declaration; they are checked when the graph is built.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use stackweave_common::error::{Result, StackweaveError};
use stackweave_common::types::{PropertyValue, ResourceKind};
use stackweave_remote::RemoteRequest;

/// Specification of one declared resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSpec {
    /// Logical name, unique within the declaration set.
    pub name: String,
    /// Kind of resource being declared.
    pub kind: ResourceKind,
    /// Property name → value-or-reference mapping.
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
    /// Logical names of resources this one depends on.
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl ResourceSpec {
    /// Creates a specification with no properties or dependencies.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            name: name.into(),
            kind,
            properties: BTreeMap::new(),
            depends_on: Vec::new(),
        }
    }

    /// Adds a property value.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: PropertyValue) -> Self {
        let _ = self.properties.insert(key.into(), value);
        self
    }

    /// Adds an explicit dependency on another declared resource.
    #[must_use]
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.depends_on.push(name.into());
        self
    }
}

/// Ordered collection of declarations for one composition pass.
///
/// Declaration order is preserved; it breaks ties in the topological
/// ordering, which keeps re-runs reproducible.
#[derive(Debug, Default)]
pub struct DeclarationSet {
    specs: Vec<ResourceSpec>,
}

impl DeclarationSet {
    /// Creates an empty declaration set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a specification to the set.
    ///
    /// # Errors
    ///
    /// Returns [`StackweaveError::DuplicateNode`] if a resource with the
    /// same logical name was already declared, and
    /// [`StackweaveError::Config`] for an empty name.
    pub fn declare(&mut self, spec: ResourceSpec) -> Result<()> {
        if spec.name.is_empty() {
            return Err(StackweaveError::Config {
                message: "resource declared with an empty name".into(),
            });
        }
        if self.specs.iter().any(|s| s.name == spec.name) {
            return Err(StackweaveError::DuplicateNode { name: spec.name });
        }
        tracing::debug!(name = %spec.name, kind = %spec.kind, "resource declared");
        self.specs.push(spec);
        Ok(())
    }

    /// Returns the declarations in declaration order.
    #[must_use]
    pub fn specs(&self) -> &[ResourceSpec] {
        &self.specs
    }

    /// Returns whether a resource with the given name was declared.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.specs.iter().any(|s| s.name == name)
    }

    /// Returns the number of declarations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Returns whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Collects the remote references implied by declared properties.
    ///
    /// Every `remote` property value becomes a resolution request; the
    /// resolver dedups repeated scope/name pairs.
    #[must_use]
    pub fn remote_requests(&self) -> Vec<RemoteRequest> {
        let mut requests = Vec::new();
        for spec in &self.specs {
            for value in spec.properties.values() {
                if let PropertyValue::Remote { remote } = value {
                    requests.push(RemoteRequest::new(remote.scope(), remote.name.clone()));
                }
            }
        }
        requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackweave_common::types::RemoteValueRef;

    #[test]
    fn declare_preserves_order() {
        let mut set = DeclarationSet::new();
        set.declare(ResourceSpec::new("storage", ResourceKind::Storage))
            .expect("declare");
        set.declare(ResourceSpec::new("identity", ResourceKind::IdentityProvider))
            .expect("declare");

        let names: Vec<&str> = set.specs().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["storage", "identity"]);
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let mut set = DeclarationSet::new();
        set.declare(ResourceSpec::new("api", ResourceKind::ApiEndpoint))
            .expect("declare");
        let err = set
            .declare(ResourceSpec::new("api", ResourceKind::ApiEndpoint))
            .unwrap_err();
        assert!(matches!(err, StackweaveError::DuplicateNode { .. }));
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut set = DeclarationSet::new();
        let err = set
            .declare(ResourceSpec::new("", ResourceKind::Storage))
            .unwrap_err();
        assert!(matches!(err, StackweaveError::Config { .. }));
    }

    #[test]
    fn forward_references_are_allowed_at_declaration_time() {
        let mut set = DeclarationSet::new();
        // cdn depends on api, which is declared afterwards.
        set.declare(
            ResourceSpec::new("cdn", ResourceKind::ContentDistribution).depends_on("api"),
        )
        .expect("declare");
        set.declare(ResourceSpec::new("api", ResourceKind::ApiEndpoint))
            .expect("declare");
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn remote_properties_become_requests() {
        let mut set = DeclarationSet::new();
        set.declare(
            ResourceSpec::new("cdn", ResourceKind::ContentDistribution).with_property(
                "waf_acl_id",
                PropertyValue::Remote {
                    remote: RemoteValueRef {
                        region: "us-east-1".into(),
                        account: None,
                        name: "waf-acl".into(),
                    },
                },
            ),
        )
        .expect("declare");

        let requests = set.remote_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].name, "waf-acl");
        assert_eq!(requests[0].scope.qualifier(), "us-east-1");
    }
}
