//! # stackweave-compose
//!
//! Composition and dependency-resolution engine for declarative
//! deployments.
//!
//! Handles:
//! - **Declaration**: two-phase collection of resource specifications with
//!   forward references by logical name.
//! - **Graph**: dependency DAG construction and deterministic topological
//!   finalization.
//! - **Routing**: path-prefix rules binding a content distribution to an
//!   API endpoint, after both are finalized.
//! - **Synth**: assembly of the runtime configuration artifact.
//! - **Suppress**: idempotent policy-exception metadata keyed by stable
//!   node identity.
//! - **Provision**: the collaborator seam that produces node outputs.
//! - **Pass**: the checked state machine driving one build-then-emit pass.

pub mod declaration;
pub mod graph;
pub mod pass;
pub mod provision;
pub mod routing;
pub mod suppress;
pub mod synth;
