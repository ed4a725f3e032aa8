// SPDX-License-Identifier: MIT OR Apache-2.0

//! Environment variable deployment source adapter.
//!
//! This module provides an adapter that derives the deployment fragment from
//! environment variables each time it is asked.

use crate::domain::{DeploymentConfiguration, Result};
use crate::ports::DeploymentSource;
use std::collections::HashMap;
use std::env;

/// Maximum length for environment variable values (prevents DoS)
const MAX_ENV_VALUE_LEN: usize = 1048576; // 1MB

/// Default environment variable prefix.
pub const DEFAULT_ENV_PREFIX: &str = "SRC_";

/// Variable (after the prefix) listing git server addresses.
const GIT_SERVERS_VAR: &str = "GIT_SERVERS";

/// Deployment source adapter for environment variables.
///
/// Reads `<PREFIX>GIT_SERVERS`, a whitespace-separated list of addresses. The
/// environment is read on every call, never cached, so a composed snapshot
/// always reflects the current process environment.
///
/// # Examples
///
/// ```rust
/// use cfgstore::adapters::EnvDeploymentSource;
///
/// // Reads SRC_GIT_SERVERS
/// let source = EnvDeploymentSource::new();
///
/// // Reads MYAPP_GIT_SERVERS
/// let source = EnvDeploymentSource::with_prefix("MYAPP_");
/// ```
#[derive(Debug, Clone)]
pub struct EnvDeploymentSource {
    /// Prefix prepended to every variable name
    prefix: String,
    /// Fixed values used instead of the process environment
    values: Option<HashMap<String, String>>,
}

impl EnvDeploymentSource {
    /// Creates a source using the default `SRC_` prefix.
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_ENV_PREFIX)
    }

    /// Creates a source using a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            values: None,
        }
    }

    /// Creates a source with pre-populated values for testing.
    ///
    /// **Note**: This method is primarily intended for testing. Keys are full
    /// variable names including the prefix.
    pub fn with_values(values: HashMap<String, String>) -> Self {
        Self {
            prefix: DEFAULT_ENV_PREFIX.to_string(),
            values: Some(values),
        }
    }

    fn lookup(&self, name: &str) -> Option<String> {
        let value = match &self.values {
            Some(values) => values.get(name).cloned(),
            None => env::var(name).ok(),
        }?;

        if value.len() > MAX_ENV_VALUE_LEN {
            tracing::debug!(
                "Skipping oversized environment variable {}: value_len={} (max {})",
                name,
                value.len(),
                MAX_ENV_VALUE_LEN
            );
            return None;
        }
        Some(value)
    }
}

impl Default for EnvDeploymentSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DeploymentSource for EnvDeploymentSource {
    fn deployment(&self) -> Result<DeploymentConfiguration> {
        let name = format!("{}{}", self.prefix, GIT_SERVERS_VAR);
        let git_servers = self
            .lookup(&name)
            .map(|value| value.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        Ok(DeploymentConfiguration { git_servers })
    }
}
