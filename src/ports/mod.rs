// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ports layer containing trait definitions.
//!
//! These traits define the boundaries of the store: the storage engine below
//! it, the deployment fragment beside it, and the configuration source above
//! it. Adapters in the adapters layer implement them.

pub mod backend;
pub mod deployment;
pub mod source;

// Re-export commonly used types
pub use backend::{VersionBackend, VersionTransaction};
pub use deployment::DeploymentSource;
pub use source::ConfigurationSource;
