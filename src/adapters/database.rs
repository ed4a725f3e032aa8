// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database-backed configuration source adapter.
//!
//! Composes the unified snapshot from the latest core and site versions in a
//! [`CategoryStore`] and a deployment fragment read fresh on every call.

use crate::domain::{validate_document, Category, CategoryWrite, Result, UnifiedConfiguration};
use crate::ports::{ConfigurationSource, DeploymentSource};
use crate::service::CategoryStore;
use std::sync::Arc;

const SOURCE_NAME: &str = "database";

/// Configuration source backed by the versioned category store.
///
/// # Examples
///
/// ```rust
/// use cfgstore::adapters::{DatabaseSource, MemoryBackend};
/// use cfgstore::domain::{DefaultConfigurations, DeployType, DeploymentConfiguration};
/// use cfgstore::ports::ConfigurationSource;
/// use cfgstore::service::CategoryStore;
/// use std::sync::Arc;
///
/// let store = Arc::new(CategoryStore::new(
///     Arc::new(MemoryBackend::new()),
///     DefaultConfigurations::for_deploy_type(DeployType::Dev),
/// ));
/// let source = DatabaseSource::new(store, DeploymentConfiguration::default());
///
/// let snapshot = source.read().unwrap();
/// assert_eq!(snapshot.core, "{}");
/// ```
pub struct DatabaseSource {
    store: Arc<CategoryStore>,
    deployment: Box<dyn DeploymentSource>,
}

impl DatabaseSource {
    /// Creates a source over `store`, taking the deployment fragment from
    /// `deployment`.
    pub fn new(store: Arc<CategoryStore>, deployment: impl DeploymentSource + 'static) -> Self {
        Self {
            store,
            deployment: Box::new(deployment),
        }
    }

    /// Creates a source whose deployment fragment comes from the process
    /// environment.
    #[cfg(feature = "env")]
    pub fn with_env_deployment(store: Arc<CategoryStore>) -> Self {
        Self::new(store, crate::adapters::EnvDeploymentSource::new())
    }

    /// Returns the underlying category store.
    pub fn store(&self) -> &CategoryStore {
        &self.store
    }

    /// Collects a compare-and-swap write for `category` if `contents`
    /// differs from its latest version.
    fn pending_write<'a>(
        &self,
        category: Category,
        contents: &'a str,
    ) -> Result<Option<CategoryWrite<'a>>> {
        let latest = self.store.get_latest(category)?;
        if latest.contents == contents {
            return Ok(None);
        }
        Ok(Some(CategoryWrite {
            category,
            last_id: Some(latest.id),
            contents,
        }))
    }
}

impl std::fmt::Debug for DatabaseSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseSource")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl ConfigurationSource for DatabaseSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn read(&self) -> Result<UnifiedConfiguration> {
        let core = self.store.core_get_latest()?;
        let site = self.store.site_get_latest()?;
        let deployment = self.deployment.deployment()?;
        Ok(UnifiedConfiguration::compose(&core, &site, deployment))
    }

    /// Stores every changed category in one transaction.
    ///
    /// Each category is compared against the latest version read just
    /// before; if another writer got in first the whole write is rolled
    /// back and `ConcurrentModification` is returned.
    fn write(&self, input: &UnifiedConfiguration) -> Result<()> {
        // Validate both documents before storing either.
        validate_document(Category::Core, &input.core)?;
        validate_document(Category::Site, &input.site)?;

        let writes: Vec<CategoryWrite<'_>> = [
            self.pending_write(Category::Core, &input.core)?,
            self.pending_write(Category::Site, &input.site)?,
        ]
        .into_iter()
        .flatten()
        .collect();
        if writes.is_empty() {
            return Ok(());
        }

        self.store.create_all_if_up_to_date(&writes)?;
        Ok(())
    }
}
