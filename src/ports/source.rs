// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration source trait definition.
//!
//! This module defines the `ConfigurationSource` trait, the port through which
//! the rest of a system reads and persists the unified configuration snapshot
//! without knowing which store backs it.

use crate::domain::{Result, UnifiedConfiguration};

/// A trait for configuration sources.
///
/// A source produces the current [`UnifiedConfiguration`] and persists edited
/// snapshots. Change detection and API exposure sit on top of this trait and
/// are agnostic to whether the snapshot lives in a database, a file or
/// memory.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow for use in multi-threaded contexts.
///
/// # Examples
///
/// ```rust
/// use cfgstore::ports::ConfigurationSource;
/// use cfgstore::domain::{DeploymentConfiguration, Result, UnifiedConfiguration};
///
/// struct FixedSource;
///
/// impl ConfigurationSource for FixedSource {
///     fn name(&self) -> &str {
///         "fixed"
///     }
///
///     fn read(&self) -> Result<UnifiedConfiguration> {
///         Ok(UnifiedConfiguration::new("{}", "{}", DeploymentConfiguration::default()))
///     }
///
///     fn write(&self, _input: &UnifiedConfiguration) -> Result<()> {
///         Ok(())
///     }
/// }
///
/// let snapshot = FixedSource.read().unwrap();
/// assert_eq!(snapshot.core, "{}");
/// ```
pub trait ConfigurationSource: Send + Sync {
    /// Returns the name of this configuration source.
    ///
    /// This name is used for logging and error messages. It should be a short
    /// identifier like "database", "file" or "static".
    fn name(&self) -> &str;

    /// Reads the current configuration snapshot.
    ///
    /// # Returns
    ///
    /// * `Ok(UnifiedConfiguration)` - The current snapshot
    /// * `Err(StoreError)` - The backing store could not be read
    fn read(&self) -> Result<UnifiedConfiguration>;

    /// Persists a configuration snapshot.
    ///
    /// Sources that derive part of the snapshot from elsewhere (such as the
    /// deployment fragment) persist only what they own.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The snapshot was persisted
    /// * `Err(StoreError)` - The snapshot was rejected or could not be stored
    fn write(&self, input: &UnifiedConfiguration) -> Result<()>;
}
