// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only version table for one category.
//!
//! This is where the compare-and-swap protocol lives. Every public operation
//! except [`ConfigVersionTable::create_in`] runs in exactly one backend
//! transaction: it commits on success, rolls back on error, and reports a
//! failed rollback together with the error that caused it.

use crate::domain::{
    validate_document, Category, ConfigurationVersion, Result, StoreError, VersionId,
    WriteOutcome,
};
use crate::ports::{VersionBackend, VersionTransaction};
use std::sync::Arc;

/// The version history of a single category.
///
/// # Examples
///
/// ```rust
/// use cfgstore::adapters::MemoryBackend;
/// use cfgstore::domain::Category;
/// use cfgstore::service::ConfigVersionTable;
/// use std::sync::Arc;
///
/// # fn main() -> cfgstore::domain::Result<()> {
/// let table = ConfigVersionTable::new(Arc::new(MemoryBackend::new()), Category::Site, "{}");
///
/// // The first read seeds the default.
/// let latest = table.get_latest()?;
/// assert_eq!(latest.id.get(), 1);
///
/// // Writing against the latest id is accepted.
/// let outcome = table.create_if_up_to_date(Some(latest.id), r#"{"a": 1}"#)?;
/// assert!(outcome.accepted);
/// assert_eq!(outcome.latest.id.get(), 2);
/// # Ok(())
/// # }
/// ```
pub struct ConfigVersionTable {
    backend: Arc<dyn VersionBackend>,
    category: Category,
    default_contents: String,
}

impl ConfigVersionTable {
    /// Creates a table for `category` on `backend`, seeded lazily with
    /// `default_contents`.
    pub fn new(
        backend: Arc<dyn VersionBackend>,
        category: Category,
        default_contents: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            category,
            default_contents: default_contents.into(),
        }
    }

    /// Returns the category this table stores.
    pub fn category(&self) -> Category {
        self.category
    }

    /// Returns the document seeded into an empty history.
    pub fn default_contents(&self) -> &str {
        &self.default_contents
    }

    /// Returns the latest version, seeding the default first if the history
    /// is empty.
    pub fn get_latest(&self) -> Result<ConfigurationVersion> {
        let latest = in_transaction(self.backend.as_ref(), |tx| {
            self.ensure_default(tx)?;
            self.require_latest(tx)
        })?;
        tracing::debug!(
            "Read latest {} configuration (id={})",
            self.category,
            latest.id
        );
        Ok(latest)
    }

    /// Seeds the default in its own transaction if the history is empty.
    ///
    /// Returns the id of the seeded version, or `None` if the history already
    /// had one.
    pub fn ensure_seeded(&self) -> Result<Option<VersionId>> {
        in_transaction(self.backend.as_ref(), |tx| self.ensure_default(tx))
    }

    /// Inserts the default document if, inside `tx`, the history is empty.
    ///
    /// The emptiness check and the insert happen in the caller's transaction,
    /// so a backend that serialises writers (as every [`VersionBackend`]
    /// must) never seeds twice.
    pub fn ensure_default(&self, tx: &mut dyn VersionTransaction) -> Result<Option<VersionId>> {
        if tx.latest(self.category)?.is_some() {
            return Ok(None);
        }

        validate_document(self.category, &self.default_contents)?;
        let seeded = tx.insert(self.category, &self.default_contents)?;
        tracing::debug!(
            "Seeded default {} configuration (id={})",
            self.category,
            seeded.id
        );
        Ok(Some(seeded.id))
    }

    /// Stores `contents` as a new version iff `last_id` is the current latest.
    ///
    /// If the history was empty, the default is seeded first and becomes the
    /// comparison baseline in place of `last_id`. A rejected write is not an
    /// error: the outcome carries `accepted = false` and the unchanged latest
    /// version so the caller can reconcile.
    ///
    /// # Errors
    ///
    /// * `MalformedConfiguration` - `contents` is not valid JSONC; nothing
    ///   was written
    /// * `Storage` / `RollbackFailed` - the backend failed
    pub fn create_if_up_to_date(
        &self,
        last_id: Option<VersionId>,
        contents: &str,
    ) -> Result<WriteOutcome> {
        validate_document(self.category, contents)?;

        let outcome = in_transaction(self.backend.as_ref(), |tx| {
            self.create_in(tx, last_id, contents)
        })?;

        if outcome.accepted {
            tracing::info!(
                "Stored {} configuration (id={})",
                self.category,
                outcome.latest.id
            );
        } else {
            tracing::warn!(
                "Rejected stale {} configuration write (last_id={:?}, latest={})",
                self.category,
                last_id.map(|id| id.get()),
                outcome.latest.id
            );
        }
        Ok(outcome)
    }

    /// Runs the compare-and-swap step inside the caller's transaction.
    ///
    /// `contents` must already be validated. Nothing is committed here, so a
    /// caller can combine several writes and roll them back together.
    pub fn create_in(
        &self,
        tx: &mut dyn VersionTransaction,
        last_id: Option<VersionId>,
        contents: &str,
    ) -> Result<WriteOutcome> {
        let mut last_id = last_id;
        if let Some(seeded) = self.ensure_default(tx)? {
            last_id = Some(seeded);
        }

        let latest = tx.latest(self.category)?;
        let up_to_date = match (&latest, last_id) {
            (None, _) => true,
            (Some(latest), Some(last_id)) => latest.id == last_id,
            (Some(_), None) => false,
        };

        match latest {
            Some(latest) if !up_to_date => Ok(WriteOutcome {
                latest,
                accepted: false,
            }),
            _ => Ok(WriteOutcome {
                latest: tx.insert(self.category, contents)?,
                accepted: true,
            }),
        }
    }

    /// Returns up to `limit` versions, newest first, seeding the default if
    /// the history is empty.
    pub fn history(&self, limit: usize) -> Result<Vec<ConfigurationVersion>> {
        in_transaction(self.backend.as_ref(), |tx| {
            self.ensure_default(tx)?;
            tx.history(self.category, limit)
        })
    }

    fn require_latest(&self, tx: &mut dyn VersionTransaction) -> Result<ConfigurationVersion> {
        tx.latest(self.category)?
            .ok_or(StoreError::InvariantViolation {
                category: self.category,
            })
    }

    pub(crate) fn backend(&self) -> &dyn VersionBackend {
        self.backend.as_ref()
    }
}

/// Runs `op` in a transaction: commit on `Ok`, rollback on `Err`.
///
/// A failed rollback is reported together with the error that caused it.
/// A failed commit is the backend's to roll back (see
/// [`VersionTransaction::commit`]).
pub(crate) fn in_transaction<T>(
    backend: &dyn VersionBackend,
    op: impl FnOnce(&mut dyn VersionTransaction) -> Result<T>,
) -> Result<T> {
    let mut tx = backend.begin()?;
    match op(&mut *tx) {
        Ok(value) => {
            tx.commit()?;
            Ok(value)
        }
        Err(err) => match tx.rollback() {
            Ok(()) => Err(err),
            Err(rollback) => {
                tracing::warn!(
                    "Rollback on backend '{}' failed: {}",
                    backend.name(),
                    rollback
                );
                Err(err.with_rollback_failure(rollback))
            }
        },
    }
}

impl std::fmt::Debug for ConfigVersionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigVersionTable")
            .field("backend", &self.backend.name())
            .field("category", &self.category)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryBackend;

    fn table(default: &str) -> (Arc<MemoryBackend>, ConfigVersionTable) {
        let backend = Arc::new(MemoryBackend::new());
        let table = ConfigVersionTable::new(backend.clone(), Category::Site, default);
        (backend, table)
    }

    #[test]
    fn test_get_latest_seeds_default() {
        let (backend, table) = table(r#"{"seeded": true}"#);
        let latest = table.get_latest().unwrap();

        assert_eq!(latest.id, VersionId::new(1));
        assert_eq!(latest.contents, r#"{"seeded": true}"#);
        assert_eq!(backend.len(Category::Site), 1);
    }

    #[test]
    fn test_get_latest_seeds_only_once() {
        let (backend, table) = table("{}");
        table.get_latest().unwrap();
        table.get_latest().unwrap();
        assert_eq!(backend.len(Category::Site), 1);
    }

    #[test]
    fn test_ensure_seeded_reports_insert() {
        let (_backend, table) = table("{}");
        assert_eq!(table.ensure_seeded().unwrap(), Some(VersionId::new(1)));
        assert_eq!(table.ensure_seeded().unwrap(), None);
    }

    #[test]
    fn test_write_with_latest_id_accepted() {
        let (_backend, table) = table("{}");
        let latest = table.get_latest().unwrap();

        let outcome = table
            .create_if_up_to_date(Some(latest.id), r#"{"a": 1}"#)
            .unwrap();
        assert!(outcome.accepted);
        assert_eq!(outcome.latest.id, VersionId::new(2));
        assert_eq!(outcome.latest.contents, r#"{"a": 1}"#);
    }

    #[test]
    fn test_write_with_stale_id_rejected() {
        let (backend, table) = table("{}");
        table.get_latest().unwrap();
        table
            .create_if_up_to_date(Some(VersionId::new(1)), r#"{"a": 1}"#)
            .unwrap();

        let outcome = table
            .create_if_up_to_date(Some(VersionId::new(1)), r#"{"b": 2}"#)
            .unwrap();
        assert!(!outcome.accepted);
        assert_eq!(outcome.latest.id, VersionId::new(2));
        assert_eq!(outcome.latest.contents, r#"{"a": 1}"#);
        assert_eq!(backend.len(Category::Site), 2);
    }

    #[test]
    fn test_write_without_id_rejected_when_history_exists() {
        let (_backend, table) = table("{}");
        table.get_latest().unwrap();

        let outcome = table.create_if_up_to_date(None, r#"{"a": 1}"#).unwrap();
        assert!(!outcome.accepted);
        assert_eq!(outcome.latest.id, VersionId::new(1));
    }

    #[test]
    fn test_write_to_empty_history_uses_seeded_baseline() {
        let (backend, table) = table("{}");

        // A stale id against an empty history is replaced by the seeded id.
        let outcome = table
            .create_if_up_to_date(Some(VersionId::new(42)), r#"{"a": 1}"#)
            .unwrap();
        assert!(outcome.accepted);
        assert_eq!(outcome.latest.id, VersionId::new(2));

        let history = table.history(10).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].contents, "{}");
        assert_eq!(backend.len(Category::Site), 2);
    }

    #[test]
    fn test_malformed_write_rejected_without_mutation() {
        let (backend, table) = table("{}");
        let err = table
            .create_if_up_to_date(None, r#"{"a": 1"#)
            .unwrap_err();

        assert!(matches!(
            err,
            StoreError::MalformedConfiguration {
                category: Category::Site,
                ..
            }
        ));
        assert!(backend.is_empty(Category::Site));
    }

    #[test]
    fn test_malformed_default_fails_bootstrap() {
        let (backend, table) = table("{");
        let err = table.get_latest().unwrap_err();

        assert!(err.is_malformed());
        assert!(backend.is_empty(Category::Site));
    }

    #[test]
    fn test_history_newest_first() {
        let (_backend, table) = table("{}");
        let mut last = table.get_latest().unwrap().id;
        for i in 0..3 {
            let outcome = table
                .create_if_up_to_date(Some(last), &format!(r#"{{"n": {}}}"#, i))
                .unwrap();
            last = outcome.latest.id;
        }

        let history = table.history(2).unwrap();
        let ids: Vec<i64> = history.iter().map(|v| v.id.get()).collect();
        assert_eq!(ids, vec![4, 3]);
    }

    #[test]
    fn test_debug_omits_backend_internals() {
        let (_backend, table) = table("{}");
        let debug = format!("{:?}", table);
        assert!(debug.contains("memory"));
        assert!(debug.contains("Site"));
    }
}
