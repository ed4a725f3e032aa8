// SPDX-License-Identifier: MIT OR Apache-2.0

//! A versioned configuration store with optimistic concurrency control.
//!
//! Configuration is kept as JSONC documents in two independent categories,
//! *core* and *site*. Each category is an append-only history: versions are
//! never updated or deleted, and the one with the highest id is the latest.
//! Writers supply the id they last read; a write is stored only if that id is
//! still the latest (compare-and-swap), so two editors starting from the same
//! version cannot silently overwrite each other.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain Layer**: core types (`Category`, `ConfigurationVersion`,
//!   `UnifiedConfiguration`, `DefaultConfigurations`, errors)
//! - **Ports**: trait definitions (`VersionBackend`, `ConfigurationSource`,
//!   `DeploymentSource`)
//! - **Adapters**: SQLite and in-memory backends; database, file and static
//!   configuration sources; the environment deployment source
//! - **Service**: `ConfigVersionTable` (bootstrap + CAS), `CategoryStore`,
//!   `ChangeTracker`
//!
//! # Feature Flags
//!
//! - `sqlite`: Enable the SQLite storage backend (default)
//! - `env`: Enable the environment deployment source (default)
//! - `file`: Enable the JSON file configuration source (default)
//! - `full`: Enable all features
//!
//! # Quick Start
//!
//! ```rust
//! use cfgstore::prelude::*;
//! use std::sync::Arc;
//!
//! # fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! // Chosen once at process start.
//! let defaults = DefaultConfigurations::new("{}", "{}")?;
//! let store = CategoryStore::new(Arc::new(MemoryBackend::new()), defaults);
//!
//! // The first read seeds the default as version 1.
//! let site = store.site_get_latest()?;
//!
//! // An up-to-date write is accepted...
//! let first = store.site_create_if_up_to_date(Some(site.id), r#"{"a": 1}"#)?;
//! assert!(first.accepted);
//!
//! // ...a stale one is rejected and returns the authoritative latest.
//! let stale = store.site_create_if_up_to_date(Some(site.id), r#"{"b": 2}"#)?;
//! assert!(!stale.accepted);
//! assert_eq!(stale.latest.contents, r#"{"a": 1}"#);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

/// Commonly used types and traits.
///
/// This module re-exports the most commonly used types and traits for convenient access.
pub mod prelude {
    pub use crate::domain::{
        Category, CategoryWrite, ConfigurationVersion, DefaultConfigurations, DefaultsCell, DeployType,
        DeploymentConfiguration, Result, StoreError, UnifiedConfiguration, VersionId,
        WriteOutcome,
    };
    pub use crate::ports::{ConfigurationSource, DeploymentSource, VersionBackend};
    pub use crate::service::{CategoryStore, ChangeTracker, ConfigVersionTable};

    pub use crate::adapters::{DatabaseSource, MemoryBackend, StaticSource};
    // Re-export adapters based on feature flags
    #[cfg(feature = "env")]
    pub use crate::adapters::EnvDeploymentSource;
    #[cfg(feature = "file")]
    pub use crate::adapters::JsonFileSource;
    #[cfg(feature = "sqlite")]
    pub use crate::adapters::{SqliteBackend, SqliteStoreConfig};
}
