//! Unified error types for the stackweave workspace.
//!
//! Every failure in a composition pass is fatal for that pass and carries
//! the offending identifier (node name, scope/name pair, path pattern, or
//! artifact key) so the operator can fix the declaration and re-run.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum StackweaveError {
    /// A remote scope could not be reached (transport or permission failure).
    #[error("scope {scope} unavailable: {message}")]
    ScopeUnavailable {
        /// Qualifier of the unreachable scope.
        scope: String,
        /// Description of the transport failure.
        message: String,
    },

    /// A remote scope has no value stored under the requested name.
    #[error("remote value \"{name}\" not found in scope {scope}")]
    RemoteNotFound {
        /// Qualifier of the scope that was queried.
        scope: String,
        /// Parameter name that was absent.
        name: String,
    },

    /// The declared resources form a dependency cycle.
    #[error("cyclic dependency detected involving node \"{node}\"")]
    CyclicDependency {
        /// A node participating in the cycle.
        node: String,
    },

    /// A declared reference never resolved to a declared node.
    #[error("node \"{node}\" references undeclared node \"{reference}\"")]
    DanglingReference {
        /// Node carrying the bad reference.
        node: String,
        /// Logical name that was never declared.
        reference: String,
    },

    /// A node depends on a remote value that was never resolved.
    #[error("node \"{node}\" depends on unresolved remote value \"{name}\" in scope {scope}")]
    UnresolvedRemote {
        /// Node carrying the remote property.
        node: String,
        /// Scope qualifier of the missing value.
        scope: String,
        /// Parameter name of the missing value.
        name: String,
    },

    /// Two routing rules collide on the same path pattern at equal priority.
    #[error("conflicting route for \"{path}\" at priority {priority}")]
    ConflictingRoute {
        /// Path pattern that collides.
        path: String,
        /// Priority at which the collision occurs.
        priority: u32,
    },

    /// A required artifact output was never produced by any node.
    #[error("required artifact output \"{key}\" was never produced")]
    MissingOutput {
        /// Artifact key that could not be assembled.
        key: String,
    },

    /// Two resources were declared under the same logical name.
    #[error("duplicate resource name: \"{name}\"")]
    DuplicateNode {
        /// The repeated logical name.
        name: String,
    },

    /// A pass operation was attempted in the wrong state.
    #[error("cannot {operation} while pass is in state {state}")]
    InvalidState {
        /// Operation that was attempted.
        operation: &'static str,
        /// State the pass was actually in.
        state: String,
    },

    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, StackweaveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_name_the_offending_identifier() {
        let err = StackweaveError::DanglingReference {
            node: "cdn".into(),
            reference: "api".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("cdn"));
        assert!(msg.contains("api"));
    }

    #[test]
    fn conflicting_route_reports_path_and_priority() {
        let err = StackweaveError::ConflictingRoute {
            path: "/api/*".into(),
            priority: 100,
        };
        assert_eq!(
            err.to_string(),
            "conflicting route for \"/api/*\" at priority 100"
        );
    }
}
