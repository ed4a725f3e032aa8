// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deployment fragment provider trait definition.

use crate::domain::{DeploymentConfiguration, Result};

/// A provider of the unversioned deployment fragment.
///
/// Implementations are asked on every composition and must not cache the
/// fragment across calls.
pub trait DeploymentSource: Send + Sync {
    /// Returns the current deployment fragment.
    fn deployment(&self) -> Result<DeploymentConfiguration>;
}

impl DeploymentSource for DeploymentConfiguration {
    fn deployment(&self) -> Result<DeploymentConfiguration> {
        Ok(self.clone())
    }
}
