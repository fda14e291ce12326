//! Concurrent remote-reference resolution with a barrier join.
//!
//! Every remote reference declared for a pass is resolved here, exactly
//! once, before graph finalization may proceed. Independent scope/name
//! pairs are fetched in parallel; the resolver joins all fetches and hands
//! the graph builder a single consistent [`ResolvedValues`] set. Any
//! failure aborts the whole pass.

use std::collections::BTreeMap;
use std::sync::Arc;

use stackweave_common::error::{Result, StackweaveError};
use stackweave_common::types::ScopeDescriptor;
use tokio::task::JoinSet;

/// A request to resolve one named value from a remote scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRequest {
    /// Scope the value lives in.
    pub scope: ScopeDescriptor,
    /// Logical parameter name within the scope.
    pub name: String,
}

impl RemoteRequest {
    /// Creates a request for a scope/name pair.
    #[must_use]
    pub fn new(scope: ScopeDescriptor, name: impl Into<String>) -> Self {
        Self {
            scope,
            name: name.into(),
        }
    }
}

/// Lifecycle of a single remote reference within one pass.
///
/// Created pending at composition start, resolved exactly once before the
/// graph is finalized, immutable thereafter.
#[derive(Debug)]
pub struct RemoteReference {
    /// Scope the reference points into.
    pub scope: ScopeDescriptor,
    /// Parameter name within the scope.
    pub name: String,
    state: ReferenceState,
}

#[derive(Debug)]
enum ReferenceState {
    Pending,
    Resolved(String),
    Failed(StackweaveError),
}

impl RemoteReference {
    fn pending(request: &RemoteRequest) -> Self {
        Self {
            scope: request.scope.clone(),
            name: request.name.clone(),
            state: ReferenceState::Pending,
        }
    }

    /// Returns the resolved value, if resolution has completed successfully.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        match &self.state {
            ReferenceState::Resolved(value) => Some(value),
            ReferenceState::Pending | ReferenceState::Failed(_) => None,
        }
    }

    /// Returns whether this reference is still awaiting resolution.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.state, ReferenceState::Pending)
    }
}

/// Immutable set of resolved remote values for one composition pass.
///
/// Exposed read-only to the graph builder; keyed by scope qualifier and
/// parameter name.
#[derive(Debug, Clone, Default)]
pub struct ResolvedValues {
    values: BTreeMap<(String, String), String>,
}

impl ResolvedValues {
    /// Creates an empty set (for passes with no remote references).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Looks up the resolved value for a scope/name pair.
    #[must_use]
    pub fn get(&self, scope: &ScopeDescriptor, name: &str) -> Option<&str> {
        self.values
            .get(&(scope.qualifier(), name.to_owned()))
            .map(String::as_str)
    }

    /// Returns the number of resolved values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Resolves every request against the store and joins all fetches.
///
/// Duplicate scope/name pairs are fetched once and shared. Failures are
/// reported in request order so re-runs surface the same offender first.
///
/// # Errors
///
/// Returns [`StackweaveError::Config`] for empty scope regions or names,
/// and propagates [`StackweaveError::ScopeUnavailable`] /
/// [`StackweaveError::RemoteNotFound`] from the store.
pub async fn resolve_all<S>(store: Arc<S>, requests: &[RemoteRequest]) -> Result<ResolvedValues>
where
    S: crate::store::ScopeStore + 'static,
{
    for request in requests {
        if request.scope.region.is_empty() {
            return Err(StackweaveError::Config {
                message: format!("remote reference \"{}\" has an empty scope", request.name),
            });
        }
        if request.name.is_empty() {
            return Err(StackweaveError::Config {
                message: format!("remote reference in scope {} has an empty name", request.scope),
            });
        }
    }

    // Dedup: each scope/name pair is read once per pass.
    let mut references: Vec<RemoteReference> = Vec::new();
    for request in requests {
        let exists = references
            .iter()
            .any(|r| r.scope == request.scope && r.name == request.name);
        if !exists {
            references.push(RemoteReference::pending(request));
        }
    }
    tracing::info!(count = references.len(), "resolving remote references");

    let mut tasks: JoinSet<(usize, Result<String>)> = JoinSet::new();
    for (index, reference) in references.iter().enumerate() {
        let store = Arc::clone(&store);
        let scope = reference.scope.clone();
        let name = reference.name.clone();
        let _ = tasks.spawn(async move {
            let outcome = store.fetch(&scope, &name).await;
            (index, outcome)
        });
    }

    // Barrier: every fetch completes before any outcome is inspected.
    while let Some(joined) = tasks.join_next().await {
        let (index, outcome) = joined.map_err(|e| StackweaveError::Config {
            message: format!("remote resolution task failed: {e}"),
        })?;
        references[index].state = match outcome {
            Ok(value) => {
                tracing::debug!(
                    scope = %references[index].scope,
                    name = %references[index].name,
                    "remote reference resolved"
                );
                ReferenceState::Resolved(value)
            }
            Err(e) => ReferenceState::Failed(e),
        };
    }

    let mut values = BTreeMap::new();
    for reference in references {
        match reference.state {
            ReferenceState::Resolved(value) => {
                let _ = values.insert((reference.scope.qualifier(), reference.name), value);
            }
            ReferenceState::Failed(error) => return Err(error),
            ReferenceState::Pending => {
                return Err(StackweaveError::Config {
                    message: format!(
                        "remote reference \"{}\" never completed resolution",
                        reference.name
                    ),
                });
            }
        }
    }
    Ok(ResolvedValues { values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StaticScopeStore;

    fn store_with(values: &[(&str, &str, &str)]) -> Arc<StaticScopeStore> {
        let mut store = StaticScopeStore::new();
        for (region, name, value) in values {
            store.insert(&ScopeDescriptor::region(*region), *name, *value);
        }
        Arc::new(store)
    }

    #[tokio::test]
    async fn resolves_independent_references() {
        let store = store_with(&[
            ("us-east-1", "waf-acl", "arn:aws:wafv2:us-east-1::webacl/demo"),
            ("eu-west-1", "cert", "arn:aws:acm:eu-west-1::cert/abc"),
        ]);
        let requests = vec![
            RemoteRequest::new(ScopeDescriptor::region("us-east-1"), "waf-acl"),
            RemoteRequest::new(ScopeDescriptor::region("eu-west-1"), "cert"),
        ];

        let resolved = resolve_all(store, &requests).await.expect("resolve");
        assert_eq!(resolved.len(), 2);
        assert_eq!(
            resolved.get(&ScopeDescriptor::region("us-east-1"), "waf-acl"),
            Some("arn:aws:wafv2:us-east-1::webacl/demo")
        );
    }

    #[tokio::test]
    async fn duplicate_pairs_resolve_to_one_value() {
        let store = store_with(&[("us-east-1", "waf-acl", "acl")]);
        let request = RemoteRequest::new(ScopeDescriptor::region("us-east-1"), "waf-acl");
        let requests = vec![request.clone(), request];

        let resolved = resolve_all(store, &requests).await.expect("resolve");
        assert_eq!(resolved.len(), 1);
    }

    #[tokio::test]
    async fn missing_value_aborts_resolution() {
        let store = store_with(&[("us-east-1", "present", "v")]);
        let requests = vec![
            RemoteRequest::new(ScopeDescriptor::region("us-east-1"), "present"),
            RemoteRequest::new(ScopeDescriptor::region("us-east-1"), "absent"),
        ];

        let err = resolve_all(store, &requests).await.unwrap_err();
        assert!(matches!(err, StackweaveError::RemoteNotFound { .. }));
        assert!(err.to_string().contains("absent"));
    }

    #[tokio::test]
    async fn empty_name_is_rejected_before_fetching() {
        let store = store_with(&[]);
        let requests = vec![RemoteRequest::new(ScopeDescriptor::region("us-east-1"), "")];

        let err = resolve_all(store, &requests).await.unwrap_err();
        assert!(matches!(err, StackweaveError::Config { .. }));
    }

    #[tokio::test]
    async fn empty_set_resolves_to_empty_values() {
        let store = store_with(&[]);
        let resolved = resolve_all(store, &[]).await.expect("resolve");
        assert!(resolved.is_empty());
        let reference = RemoteReference::pending(&RemoteRequest::new(
            ScopeDescriptor::region("us-east-1"),
            "x",
        ));
        assert!(reference.is_pending());
        assert!(reference.value().is_none());
    }
}
