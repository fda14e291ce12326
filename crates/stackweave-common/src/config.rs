//! Deployment-context configuration model.
//!
//! Context settings (operator email, target region, stage name) feed the
//! declarations but are not resources themselves. Each setting resolves
//! through an enumerated source precedence, evaluated once before any
//! declaration is built:
//!
//! 1. Explicit value in the manifest `context` map.
//! 2. Environment variable `STACKWEAVE_<NAME>` (name upper-cased,
//!    dashes mapped to underscores).
//! 3. Caller-supplied default.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::ENV_PREFIX;

/// Resolved deployment-context settings for one composition pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentContext {
    values: BTreeMap<String, String>,
}

impl DeploymentContext {
    /// Creates a context from explicit manifest values.
    #[must_use]
    pub fn from_values(values: BTreeMap<String, String>) -> Self {
        Self { values }
    }

    /// Resolves a setting through the source precedence chain.
    ///
    /// Returns `None` when the setting is neither declared explicitly nor
    /// present in the environment.
    #[must_use]
    pub fn setting(&self, name: &str) -> Option<String> {
        if let Some(value) = self.values.get(name) {
            return Some(value.clone());
        }
        std::env::var(env_var_name(name)).ok()
    }

    /// Resolves a setting, falling back to `default` when no explicit or
    /// environment source provides one.
    #[must_use]
    pub fn setting_or(&self, name: &str, default: &str) -> String {
        self.setting(name)
            .unwrap_or_else(|| default.to_owned())
    }

    /// Returns the explicitly declared values.
    #[must_use]
    pub const fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }
}

fn env_var_name(setting: &str) -> String {
    let mut name = String::with_capacity(ENV_PREFIX.len() + setting.len());
    name.push_str(ENV_PREFIX);
    for ch in setting.chars() {
        if ch == '-' {
            name.push('_');
        } else {
            name.push(ch.to_ascii_uppercase());
        }
    }
    name
}
