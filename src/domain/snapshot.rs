// SPDX-License-Identifier: MIT OR Apache-2.0

//! The unified configuration snapshot.
//!
//! A [`UnifiedConfiguration`] is the read-only view composed from the latest
//! core document, the latest site document and a deployment fragment that is
//! never persisted by the store. Structural equality lets callers skip
//! re-processing when nothing changed.

use crate::domain::ConfigurationVersion;
use serde::{Deserialize, Serialize};

/// Deployment-derived settings that are not versioned by the store.
///
/// These are supplied fresh from the process environment on every
/// composition.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentConfiguration {
    /// Addresses of the git server instances other services should talk to.
    #[serde(default)]
    pub git_servers: Vec<String>,
}

impl DeploymentConfiguration {
    /// Creates a deployment fragment from a list of git server addresses.
    pub fn with_git_servers<I, S>(servers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            git_servers: servers.into_iter().map(Into::into).collect(),
        }
    }
}

/// Kinds of deployment that ship different built-in defaults.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeployType {
    /// Local development and tests.
    Dev,
    /// A single Docker container.
    DockerContainer,
    /// A multi-service cluster deployment.
    Cluster,
}

/// The merged, read-only configuration snapshot.
///
/// Equality is string equality on `core` and `site` plus deep equality on
/// `deployment`.
///
/// # Examples
///
/// ```
/// use cfgstore::domain::{DeploymentConfiguration, UnifiedConfiguration};
///
/// let a = UnifiedConfiguration::new("{}", "{}", DeploymentConfiguration::default());
/// let b = UnifiedConfiguration::new("{}", "{}", DeploymentConfiguration::default());
/// assert_eq!(a, b);
///
/// let c = UnifiedConfiguration::new("{}", "{ }", DeploymentConfiguration::default());
/// assert_ne!(a, c);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnifiedConfiguration {
    /// The core configuration document
    pub core: String,
    /// The site configuration document
    pub site: String,
    /// The deployment fragment
    #[serde(default)]
    pub deployment: DeploymentConfiguration,
}

impl UnifiedConfiguration {
    /// Creates a snapshot from raw document text.
    pub fn new(
        core: impl Into<String>,
        site: impl Into<String>,
        deployment: DeploymentConfiguration,
    ) -> Self {
        Self {
            core: core.into(),
            site: site.into(),
            deployment,
        }
    }

    /// Composes a snapshot from the latest stored version of each category.
    ///
    /// This is a pure function: only the `contents` of each version are kept.
    pub fn compose(
        core: &ConfigurationVersion,
        site: &ConfigurationVersion,
        deployment: DeploymentConfiguration,
    ) -> Self {
        Self::new(core.contents.clone(), site.contents.clone(), deployment)
    }

    /// Returns the built-in defaults for a deployment type.
    pub fn default_for(deploy_type: DeployType) -> Self {
        match deploy_type {
            DeployType::Dev | DeployType::DockerContainer | DeployType::Cluster => {
                Self::new("{}", "{}", DeploymentConfiguration::default())
            }
        }
    }
}
