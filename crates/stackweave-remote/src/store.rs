//! Scope-store backends for remote value lookup.
//!
//! A scope store answers `fetch(scope, name)` for values living outside
//! the current deployment scope. The HTTP backend talks to a parameter
//! service; the static backend serves tests and offline planning.

use std::collections::{HashMap, HashSet};
use std::future::Future;

use serde::Deserialize;
use stackweave_common::error::{Result, StackweaveError};
use stackweave_common::types::ScopeDescriptor;

/// Backend capable of reading a named value from a remote scope.
///
/// One remote read per call; callers resolve once per pass and reuse the
/// result rather than re-querying. Retry behavior, if any, is a private
/// concern of the implementation.
pub trait ScopeStore: Send + Sync {
    /// Fetches the value stored under `name` in `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`StackweaveError::RemoteNotFound`] when the scope has no
    /// such name, and [`StackweaveError::ScopeUnavailable`] when the scope
    /// cannot be reached.
    fn fetch(
        &self,
        scope: &ScopeDescriptor,
        name: &str,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// In-memory scope store for tests and offline planning.
#[derive(Debug, Default)]
pub struct StaticScopeStore {
    values: HashMap<(String, String), String>,
    unavailable: HashSet<String>,
}

impl StaticScopeStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value under a scope/name pair.
    pub fn insert(&mut self, scope: &ScopeDescriptor, name: impl Into<String>, value: impl Into<String>) {
        let _ = self
            .values
            .insert((scope.qualifier(), name.into()), value.into());
    }

    /// Marks a whole scope as unreachable, simulating transport failure.
    pub fn mark_unavailable(&mut self, scope: &ScopeDescriptor) {
        let _ = self.unavailable.insert(scope.qualifier());
    }
}

impl ScopeStore for StaticScopeStore {
    async fn fetch(&self, scope: &ScopeDescriptor, name: &str) -> Result<String> {
        let qualifier = scope.qualifier();
        if self.unavailable.contains(&qualifier) {
            return Err(StackweaveError::ScopeUnavailable {
                scope: qualifier,
                message: "scope marked unavailable".into(),
            });
        }
        self.values
            .get(&(qualifier.clone(), name.to_owned()))
            .cloned()
            .ok_or_else(|| StackweaveError::RemoteNotFound {
                scope: qualifier,
                name: name.to_owned(),
            })
    }
}

/// Scope store backed by an HTTP parameter service.
///
/// Values are read from `GET {base_url}/scopes/{qualifier}/values/{name}`,
/// which answers `{"value": "..."}`. A single bounded attempt is made per
/// fetch; the composition pass aborts on failure rather than retrying.
#[derive(Debug, Clone)]
pub struct HttpScopeStore {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ValueBody {
    value: String,
}

impl HttpScopeStore {
    /// Creates a store reading from the given parameter-service base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

impl ScopeStore for HttpScopeStore {
    async fn fetch(&self, scope: &ScopeDescriptor, name: &str) -> Result<String> {
        let qualifier = scope.qualifier();
        let url = format!("{}/scopes/{qualifier}/values/{name}", self.base_url);
        tracing::debug!(scope = %qualifier, name, "fetching remote value");

        let response =
            self.client
                .get(&url)
                .send()
                .await
                .map_err(|e| StackweaveError::ScopeUnavailable {
                    scope: qualifier.clone(),
                    message: e.to_string(),
                })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StackweaveError::RemoteNotFound {
                scope: qualifier,
                name: name.to_owned(),
            });
        }
        if !response.status().is_success() {
            return Err(StackweaveError::ScopeUnavailable {
                scope: qualifier,
                message: format!("parameter service answered {}", response.status()),
            });
        }

        let body: ValueBody =
            response
                .json()
                .await
                .map_err(|e| StackweaveError::ScopeUnavailable {
                    scope: qualifier,
                    message: format!("malformed parameter response: {e}"),
                })?;
        Ok(body.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_store_returns_inserted_value() {
        let scope = ScopeDescriptor::region("us-east-1");
        let mut store = StaticScopeStore::new();
        store.insert(&scope, "waf-acl", "arn:aws:wafv2:us-east-1::webacl/demo");

        let value = store.fetch(&scope, "waf-acl").await.expect("fetch");
        assert_eq!(value, "arn:aws:wafv2:us-east-1::webacl/demo");
    }

    #[tokio::test]
    async fn static_store_reports_missing_name() {
        let scope = ScopeDescriptor::region("us-east-1");
        let store = StaticScopeStore::new();

        let err = store.fetch(&scope, "absent").await.unwrap_err();
        assert!(matches!(err, StackweaveError::RemoteNotFound { .. }));
    }

    #[tokio::test]
    async fn static_store_reports_unavailable_scope() {
        let scope = ScopeDescriptor::region("eu-central-1");
        let mut store = StaticScopeStore::new();
        store.insert(&scope, "key", "value");
        store.mark_unavailable(&scope);

        let err = store.fetch(&scope, "key").await.unwrap_err();
        assert!(matches!(err, StackweaveError::ScopeUnavailable { .. }));
    }
}
