//! # stackweave-common
//!
//! Shared types, error definitions, deployment-context configuration,
//! and constants used across the entire stackweave workspace.
//!
//! This crate depends on no other internal crate and provides the
//! foundational primitives that all other crates build upon.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
