//! Domain primitive types used across the stackweave workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identity of a declared resource within one composition graph.
///
/// Wraps the logical name from the declaration; logical names are unique
/// within a graph, so the wrapper is usable as a map key and as the
/// addressing scheme for routing and suppression entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    /// Creates a node ID from a logical resource name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the inner logical name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

/// The closed set of resource kinds the composition engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    /// Object storage bucket (assets, artifacts).
    Storage,
    /// User identity pool with an application client.
    IdentityProvider,
    /// Audit trail sink receiving data events.
    AuditSink,
    /// Backend HTTP API endpoint.
    ApiEndpoint,
    /// Front-door content-delivery distribution.
    ContentDistribution,
    /// Publisher of the runtime configuration artifact.
    ConfigPublisher,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Storage => "storage",
            Self::IdentityProvider => "identity-provider",
            Self::AuditSink => "audit-sink",
            Self::ApiEndpoint => "api-endpoint",
            Self::ContentDistribution => "content-distribution",
            Self::ConfigPublisher => "config-publisher",
        };
        write!(f, "{name}")
    }
}

/// Qualifier of a deployment scope a remote value lives in.
///
/// A scope is a region plus an optional account; values addressed through
/// a scope descriptor originate outside the current deployment context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeDescriptor {
    /// Region identifier (e.g. `us-east-1`).
    pub region: String,
    /// Account qualifier, when the value lives in a different account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
}

impl ScopeDescriptor {
    /// Creates a scope descriptor for a region in the current account.
    #[must_use]
    pub fn region(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            account: None,
        }
    }

    /// Returns the canonical `region` or `account/region` qualifier string.
    #[must_use]
    pub fn qualifier(&self) -> String {
        self.account.as_ref().map_or_else(
            || self.region.clone(),
            |account| format!("{account}/{}", self.region),
        )
    }
}

impl fmt::Display for ScopeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualifier())
    }
}

/// A property value on a resource declaration.
///
/// Values are either literal strings, symbolic references to another
/// declared node (resolved during graph construction), or remote
/// references (resolved before graph finalization).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Reference to a value living in another deployment scope.
    Remote {
        /// The remote scope/name pair to resolve.
        remote: RemoteValueRef,
    },
    /// Symbolic reference to another declared node by logical name.
    NodeRef {
        /// Logical name of the referenced node.
        r#ref: String,
    },
    /// A plain literal value.
    Literal(String),
}

/// Address of a value stored in a remote scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RemoteValueRef {
    /// Region the value lives in.
    pub region: String,
    /// Account qualifier, if different from the current one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    /// Logical parameter name within the scope.
    pub name: String,
}

impl RemoteValueRef {
    /// Returns the scope descriptor part of this reference.
    #[must_use]
    pub fn scope(&self) -> ScopeDescriptor {
        ScopeDescriptor {
            region: self.region.clone(),
            account: self.account.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_displays_logical_name() {
        let id = NodeId::new("api");
        assert_eq!(id.to_string(), "api");
        assert_eq!(id.as_str(), "api");
    }

    #[test]
    fn scope_qualifier_without_account() {
        let scope = ScopeDescriptor::region("us-east-1");
        assert_eq!(scope.qualifier(), "us-east-1");
    }

    #[test]
    fn scope_qualifier_with_account() {
        let scope = ScopeDescriptor {
            region: "eu-west-1".into(),
            account: Some("123456789012".into()),
        };
        assert_eq!(scope.qualifier(), "123456789012/eu-west-1");
    }

    #[test]
    fn resource_kind_serializes_kebab_case() {
        let json = serde_json::to_string(&ResourceKind::IdentityProvider).expect("serialize");
        assert_eq!(json, "\"identity-provider\"");
        let back: ResourceKind = serde_json::from_str("\"content-distribution\"").expect("parse");
        assert_eq!(back, ResourceKind::ContentDistribution);
    }

    #[test]
    fn property_value_parses_untagged_forms() {
        let literal: PropertyValue = serde_json::from_str("\"true\"").expect("literal");
        assert_eq!(literal, PropertyValue::Literal("true".into()));

        let node_ref: PropertyValue = serde_json::from_str(r#"{"ref": "api"}"#).expect("ref");
        assert_eq!(node_ref, PropertyValue::NodeRef { r#ref: "api".into() });

        let remote: PropertyValue =
            serde_json::from_str(r#"{"remote": {"region": "us-east-1", "name": "waf-acl"}}"#)
                .expect("remote");
        match remote {
            PropertyValue::Remote { remote } => {
                assert_eq!(remote.region, "us-east-1");
                assert_eq!(remote.name, "waf-acl");
                assert_eq!(remote.scope().qualifier(), "us-east-1");
            }
            other => panic!("expected remote, got {other:?}"),
        }
    }
}
