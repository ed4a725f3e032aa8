// SPDX-License-Identifier: MIT OR Apache-2.0

//! The core and site configuration histories.

use crate::domain::{
    validate_document, Category, CategoryWrite, ConfigurationVersion, DefaultConfigurations,
    Result, StoreError, VersionId, WriteOutcome,
};
use crate::ports::VersionBackend;
use crate::service::version_table::in_transaction;
use crate::service::ConfigVersionTable;
use std::sync::Arc;

/// Reads and writes the core and site configuration histories.
///
/// Each category is seeded with its own default independently, on the first
/// read or write that touches it.
///
/// 🚨 SECURITY: this type does not check who is asking. Callers are
/// responsible for ensuring writers are administrators and that contents
/// are only shown to users allowed to see them.
///
/// # Examples
///
/// ```rust
/// use cfgstore::adapters::MemoryBackend;
/// use cfgstore::domain::{DefaultConfigurations, DeployType};
/// use cfgstore::service::CategoryStore;
/// use std::sync::Arc;
///
/// # fn main() -> cfgstore::domain::Result<()> {
/// let store = CategoryStore::new(
///     Arc::new(MemoryBackend::new()),
///     DefaultConfigurations::for_deploy_type(DeployType::Dev),
/// );
///
/// let site = store.site_get_latest()?;
/// let outcome = store.site_create_if_up_to_date(Some(site.id), r#"{"a": 1}"#)?;
/// assert!(outcome.accepted);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CategoryStore {
    core: ConfigVersionTable,
    site: ConfigVersionTable,
}

impl CategoryStore {
    /// Creates the store over `backend`.
    ///
    /// `defaults` is fixed for the store's lifetime.
    pub fn new(backend: Arc<dyn VersionBackend>, defaults: DefaultConfigurations) -> Self {
        Self {
            core: ConfigVersionTable::new(
                backend.clone(),
                Category::Core,
                defaults.get(Category::Core),
            ),
            site: ConfigVersionTable::new(backend, Category::Site, defaults.get(Category::Site)),
        }
    }

    /// Returns the table for a category.
    pub fn table(&self, category: Category) -> &ConfigVersionTable {
        match category {
            Category::Core => &self.core,
            Category::Site => &self.site,
        }
    }

    /// Returns the latest version of a category.
    pub fn get_latest(&self, category: Category) -> Result<ConfigurationVersion> {
        self.table(category).get_latest()
    }

    /// Stores `contents` for a category iff `last_id` is its latest id.
    pub fn create_if_up_to_date(
        &self,
        category: Category,
        last_id: Option<VersionId>,
        contents: &str,
    ) -> Result<WriteOutcome> {
        self.table(category).create_if_up_to_date(last_id, contents)
    }

    /// Stores several category writes atomically.
    ///
    /// Each write is compare-and-swapped against its own `last_id` inside a
    /// single backend transaction, so either every write is stored or none
    /// is. Each category should appear at most once.
    ///
    /// # Errors
    ///
    /// * `MalformedConfiguration` - a document is not valid JSONC; nothing
    ///   was written
    /// * `ConcurrentModification` - a `last_id` was stale; the transaction
    ///   was rolled back and the error names the first stale category
    /// * `Storage` / `RollbackFailed` - the backend failed
    pub fn create_all_if_up_to_date(
        &self,
        writes: &[CategoryWrite<'_>],
    ) -> Result<Vec<WriteOutcome>> {
        for write in writes {
            validate_document(write.category, write.contents)?;
        }

        let outcomes = in_transaction(self.core.backend(), |tx| {
            let mut outcomes = Vec::with_capacity(writes.len());
            for write in writes {
                let outcome = self
                    .table(write.category)
                    .create_in(tx, write.last_id, write.contents)?;
                if !outcome.accepted {
                    tracing::warn!(
                        "Rejected stale {} configuration write (last_id={:?}, latest={}); rolling back",
                        write.category,
                        write.last_id.map(|id| id.get()),
                        outcome.latest.id
                    );
                    return Err(StoreError::ConcurrentModification {
                        category: write.category,
                        latest: outcome.latest.id,
                    });
                }
                outcomes.push(outcome);
            }
            Ok(outcomes)
        })?;

        for outcome in &outcomes {
            tracing::info!("Stored configuration version (id={})", outcome.latest.id);
        }
        Ok(outcomes)
    }

    /// Returns the latest core configuration.
    pub fn core_get_latest(&self) -> Result<ConfigurationVersion> {
        self.core.get_latest()
    }

    /// Returns the latest site configuration.
    pub fn site_get_latest(&self) -> Result<ConfigurationVersion> {
        self.site.get_latest()
    }

    /// Stores core configuration `contents` iff `last_id` is the latest core id.
    pub fn core_create_if_up_to_date(
        &self,
        last_id: Option<VersionId>,
        contents: &str,
    ) -> Result<WriteOutcome> {
        self.core.create_if_up_to_date(last_id, contents)
    }

    /// Stores site configuration `contents` iff `last_id` is the latest site id.
    pub fn site_create_if_up_to_date(
        &self,
        last_id: Option<VersionId>,
        contents: &str,
    ) -> Result<WriteOutcome> {
        self.site.create_if_up_to_date(last_id, contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryBackend;

    fn store() -> (Arc<MemoryBackend>, CategoryStore) {
        let backend = Arc::new(MemoryBackend::new());
        let defaults = DefaultConfigurations::new(r#"{"kind": "core"}"#, r#"{"kind": "site"}"#).unwrap();
        let store = CategoryStore::new(backend.clone(), defaults);
        (backend, store)
    }

    #[test]
    fn test_each_category_seeded_with_own_default() {
        let (_backend, store) = store();
        assert_eq!(store.core_get_latest().unwrap().contents, r#"{"kind": "core"}"#);
        assert_eq!(store.site_get_latest().unwrap().contents, r#"{"kind": "site"}"#);
    }

    #[test]
    fn test_categories_seeded_independently() {
        let (backend, store) = store();
        store.site_get_latest().unwrap();

        assert_eq!(backend.len(Category::Site), 1);
        assert!(backend.is_empty(Category::Core));
    }

    #[test]
    fn test_categories_have_independent_ids() {
        let (_backend, store) = store();
        let site = store.site_get_latest().unwrap();
        store
            .site_create_if_up_to_date(Some(site.id), r#"{"a": 1}"#)
            .unwrap();

        let core = store.core_get_latest().unwrap();
        assert_eq!(core.id, VersionId::new(1));
        assert_eq!(store.site_get_latest().unwrap().id, VersionId::new(2));
    }

    #[test]
    fn test_create_all_stores_every_category() {
        let (backend, store) = store();
        let core = store.core_get_latest().unwrap();
        let site = store.site_get_latest().unwrap();

        let outcomes = store
            .create_all_if_up_to_date(&[
                CategoryWrite {
                    category: Category::Core,
                    last_id: Some(core.id),
                    contents: r#"{"core": 2}"#,
                },
                CategoryWrite {
                    category: Category::Site,
                    last_id: Some(site.id),
                    contents: r#"{"site": 2}"#,
                },
            ])
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.accepted));
        assert_eq!(backend.len(Category::Core), 2);
        assert_eq!(backend.len(Category::Site), 2);
    }

    #[test]
    fn test_create_all_stale_write_stores_nothing() {
        let (backend, store) = store();
        let core = store.core_get_latest().unwrap();
        let site = store.site_get_latest().unwrap();
        store
            .site_create_if_up_to_date(Some(site.id), r#"{"other": true}"#)
            .unwrap();

        let err = store
            .create_all_if_up_to_date(&[
                CategoryWrite {
                    category: Category::Core,
                    last_id: Some(core.id),
                    contents: r#"{"core": 2}"#,
                },
                CategoryWrite {
                    category: Category::Site,
                    last_id: Some(site.id),
                    contents: r#"{"site": 2}"#,
                },
            ])
            .unwrap_err();

        assert!(matches!(
            err,
            StoreError::ConcurrentModification {
                category: Category::Site,
                latest,
            } if latest == VersionId::new(2)
        ));
        assert_eq!(backend.len(Category::Core), 1);
        assert_eq!(store.core_get_latest().unwrap(), core);
    }

    #[test]
    fn test_create_all_seeds_empty_categories() {
        let (backend, store) = store();
        let outcomes = store
            .create_all_if_up_to_date(&[CategoryWrite {
                category: Category::Site,
                last_id: None,
                contents: r#"{"site": "first"}"#,
            }])
            .unwrap();

        assert_eq!(outcomes[0].latest.id, VersionId::new(2));
        assert_eq!(backend.len(Category::Site), 2);
        assert!(backend.is_empty(Category::Core));
    }

    #[test]
    fn test_generic_entry_points_match_named_ones() {
        let (_backend, store) = store();
        let core = store.get_latest(Category::Core).unwrap();
        let outcome = store
            .create_if_up_to_date(Category::Core, Some(core.id), r#"{"b": 2}"#)
            .unwrap();

        assert!(outcome.accepted);
        assert_eq!(store.core_get_latest().unwrap(), outcome.latest);
        assert_eq!(store.table(Category::Core).category(), Category::Core);
    }
}
