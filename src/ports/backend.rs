// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage backend trait definitions.
//!
//! This module defines the ports a storage engine implements to hold version
//! histories. All access happens through a [`VersionTransaction`], so the
//! same read-then-insert logic runs unchanged against every backend.

use crate::domain::{Category, ConfigurationVersion, Result};

/// A storage engine that can open transactions over category histories.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`. Transactions that may insert must
/// be serialised per backend so that two concurrent check-then-insert
/// sequences cannot interleave.
///
/// # Examples
///
/// ```rust
/// use cfgstore::adapters::MemoryBackend;
/// use cfgstore::domain::Category;
/// use cfgstore::ports::{VersionBackend, VersionTransaction};
///
/// let backend = MemoryBackend::new();
/// let mut tx = backend.begin().unwrap();
/// assert!(tx.latest(Category::Site).unwrap().is_none());
/// tx.rollback().unwrap();
/// ```
pub trait VersionBackend: Send + Sync {
    /// Returns the name of this backend, used in logs and errors.
    fn name(&self) -> &str;

    /// Opens a transaction.
    ///
    /// The returned handle must roll back if it is dropped without an
    /// explicit [`VersionTransaction::commit`].
    fn begin(&self) -> Result<Box<dyn VersionTransaction + '_>>;
}

/// An open transaction over the category histories of one backend.
pub trait VersionTransaction {
    /// Returns the version with the highest id, or `None` if the category
    /// has no history.
    fn latest(&mut self, category: Category) -> Result<Option<ConfigurationVersion>>;

    /// Appends `contents` as a new version and returns it with its assigned
    /// id and timestamps.
    fn insert(&mut self, category: Category, contents: &str) -> Result<ConfigurationVersion>;

    /// Returns up to `limit` versions, newest first.
    fn history(&mut self, category: Category, limit: usize) -> Result<Vec<ConfigurationVersion>>;

    /// Makes every insert of this transaction durable.
    ///
    /// If the commit fails the transaction must be rolled back before this
    /// returns. When that rollback fails as well, the error is the commit
    /// error combined with it via [`StoreError::with_rollback_failure`].
    ///
    /// [`StoreError::with_rollback_failure`]: crate::domain::StoreError::with_rollback_failure
    fn commit(self: Box<Self>) -> Result<()>;

    /// Discards every insert of this transaction.
    ///
    /// If this fails, the backend must not leave the transaction open for
    /// the next [`VersionBackend::begin`].
    fn rollback(self: Box<Self>) -> Result<()>;
}
