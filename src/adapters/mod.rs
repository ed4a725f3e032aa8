// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapters layer containing storage backends and configuration sources.
//!
//! Storage backends implement `VersionBackend`; configuration sources
//! implement `ConfigurationSource`; the environment adapter implements
//! `DeploymentSource`.

pub mod database;
#[cfg(feature = "env")]
pub mod env_var;
#[cfg(feature = "file")]
pub mod json_file;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod static_source;

// Re-export adapters based on feature flags
pub use database::DatabaseSource;
#[cfg(feature = "env")]
pub use env_var::EnvDeploymentSource;
#[cfg(feature = "file")]
pub use json_file::JsonFileSource;
pub use memory::MemoryBackend;
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteBackend, SqliteJournalMode, SqliteStoreConfig};
pub use static_source::StaticSource;
