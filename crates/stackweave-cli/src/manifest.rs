//! Stack manifest loading and conversion into pass input.
//!
//! The manifest is a YAML document naming declarations, remote-reference
//! requests, route bindings, and suppression directives. Loading performs
//! no validation beyond parsing; the composition pass owns the semantic
//! checks.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use stackweave_common::config::DeploymentContext;
use stackweave_common::error::{Result, StackweaveError};
use stackweave_common::types::ScopeDescriptor;
use stackweave_compose::declaration::{DeclarationSet, ResourceSpec};
use stackweave_compose::pass::{PassInput, RouteBinding, SuppressionRequest};
use stackweave_remote::{RemoteRequest, StaticScopeStore};

/// A parsed stack manifest.
#[derive(Debug, Default, Deserialize)]
pub struct Manifest {
    /// Deployment-context settings (explicit source of the precedence
    /// chain).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Explicit remote-reference requests.
    #[serde(default)]
    pub remote_refs: Vec<RemoteRefDecl>,
    /// Resource declarations.
    #[serde(default)]
    pub resources: Vec<ResourceSpec>,
    /// Route bindings between distributions and API endpoints.
    #[serde(default)]
    pub routes: Vec<RouteDecl>,
    /// Suppression directives.
    #[serde(default)]
    pub suppressions: Vec<SuppressionDecl>,
}

/// An explicit remote-reference request in the manifest.
#[derive(Debug, Deserialize)]
pub struct RemoteRefDecl {
    /// Region the value lives in.
    pub region: String,
    /// Account qualifier, if any.
    #[serde(default)]
    pub account: Option<String>,
    /// Parameter name within the scope.
    pub name: String,
}

/// A route binding declaration.
#[derive(Debug, Deserialize)]
pub struct RouteDecl {
    /// Logical name of the distribution node.
    pub distribution: String,
    /// Logical name of the API endpoint node.
    pub api: String,
    /// Path prefix to bind.
    pub path_prefix: String,
}

/// A suppression directive.
#[derive(Debug, Deserialize)]
pub struct SuppressionDecl {
    /// Logical name of the target node.
    pub target: String,
    /// Policy rule identifier.
    pub rule_id: String,
    /// Operator justification.
    pub justification: String,
    /// Optional sub-resource pattern.
    #[serde(default)]
    pub applies_to: Option<String>,
}

impl Manifest {
    /// Loads and parses a manifest file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| StackweaveError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_yaml::from_str(&content).map_err(|e| StackweaveError::Config {
            message: format!("{}: {e}", path.display()),
        })
    }

    /// Returns the deployment context built from the manifest values.
    #[must_use]
    pub fn context(&self) -> DeploymentContext {
        DeploymentContext::from_values(self.context.clone())
    }

    /// Collects the declarations into a set, checking duplicates.
    ///
    /// # Errors
    ///
    /// Returns an error on duplicate or empty resource names.
    pub fn declaration_set(&self) -> Result<DeclarationSet> {
        let mut set = DeclarationSet::new();
        for spec in &self.resources {
            set.declare(spec.clone())?;
        }
        Ok(set)
    }

    /// Returns every remote request: explicit entries plus the references
    /// implied by `remote` property values.
    ///
    /// # Errors
    ///
    /// Returns an error if the declarations are malformed.
    pub fn remote_requests(&self) -> Result<Vec<RemoteRequest>> {
        let set = self.declaration_set()?;
        let mut requests = set.remote_requests();
        for decl in &self.remote_refs {
            requests.push(RemoteRequest::new(
                ScopeDescriptor {
                    region: decl.region.clone(),
                    account: decl.account.clone(),
                },
                decl.name.clone(),
            ));
        }
        Ok(requests)
    }

    /// Converts the manifest into pass input.
    ///
    /// # Errors
    ///
    /// Returns an error if the declarations are malformed.
    pub fn into_input(self) -> Result<PassInput> {
        let remote_refs = self.remote_requests()?;
        Ok(PassInput {
            resources: self.resources,
            remote_refs,
            routes: self
                .routes
                .iter()
                .map(|r| RouteBinding {
                    distribution: r.distribution.clone(),
                    api: r.api.clone(),
                    path_prefix: r.path_prefix.clone(),
                })
                .collect(),
            suppressions: self
                .suppressions
                .iter()
                .map(|s| SuppressionRequest {
                    target: s.target.clone(),
                    rule_id: s.rule_id.clone(),
                    justification: s.justification.clone(),
                    applies_to: s.applies_to.clone(),
                })
                .collect(),
        })
    }
}

/// One entry in a parameter file backing offline composition.
#[derive(Debug, Deserialize)]
pub struct ParamEntry {
    /// Region of the scope.
    pub region: String,
    /// Account qualifier, if any.
    #[serde(default)]
    pub account: Option<String>,
    /// Parameter name.
    pub name: String,
    /// Stored value.
    pub value: String,
}

/// Loads a YAML parameter file into an in-memory scope store.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_params(path: &Path) -> Result<StaticScopeStore> {
    let content = std::fs::read_to_string(path).map_err(|e| StackweaveError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let entries: Vec<ParamEntry> =
        serde_yaml::from_str(&content).map_err(|e| StackweaveError::Config {
            message: format!("{}: {e}", path.display()),
        })?;
    let mut store = StaticScopeStore::new();
    for entry in entries {
        let scope = ScopeDescriptor {
            region: entry.region,
            account: entry.account,
        };
        store.insert(&scope, entry.name, entry.value);
    }
    Ok(store)
}

/// Builds a store answering every request with a visible placeholder, for
/// offline validation and planning.
#[must_use]
pub fn placeholder_store(requests: &[RemoteRequest]) -> StaticScopeStore {
    let mut store = StaticScopeStore::new();
    for request in requests {
        store.insert(
            &request.scope,
            request.name.clone(),
            format!("<unresolved:{}>", request.name),
        );
    }
    store
}
