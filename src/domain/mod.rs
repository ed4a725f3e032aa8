// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain layer containing core types.
//!
//! Categories, stored versions, the unified snapshot, default documents and
//! the error type. Nothing here touches storage.

pub mod category;
pub mod defaults;
pub mod document;
pub mod errors;
pub mod snapshot;
pub mod version;

// Re-export commonly used types
pub use category::Category;
pub use defaults::{DefaultConfigurations, DefaultsCell};
pub use document::validate_document;
pub use errors::{Result, StoreError};
pub use snapshot::{DeployType, DeploymentConfiguration, UnifiedConfiguration};
pub use version::{CategoryWrite, ConfigurationVersion, VersionId, WriteOutcome};
