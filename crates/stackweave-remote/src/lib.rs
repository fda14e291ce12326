//! # stackweave-remote
//!
//! Remote reference resolution: fetching named configuration values from
//! scopes outside the current deployment region/account and exposing them
//! as an immutable resolved-value set.
//!
//! Handles:
//! - **Store**: the [`store::ScopeStore`] seam plus HTTP-backed and
//!   in-memory implementations.
//! - **Resolver**: concurrent resolution of independent references with a
//!   barrier join before graph finalization may proceed.

pub mod resolver;
pub mod store;

pub use resolver::{RemoteReference, RemoteRequest, ResolvedValues, resolve_all};
pub use store::{HttpScopeStore, ScopeStore, StaticScopeStore};
