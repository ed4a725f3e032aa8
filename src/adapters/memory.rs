// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory storage backend.
//!
//! Histories live in a mutex-guarded map. A transaction holds the lock for
//! its whole lifetime, which serialises concurrent check-then-insert
//! sequences, and stages its inserts until commit.

use crate::domain::{Category, ConfigurationVersion, Result, StoreError, VersionId};
use crate::ports::{VersionBackend, VersionTransaction};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

const BACKEND_NAME: &str = "memory";

/// A storage backend that keeps every history in process memory.
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
/// let first = tx.insert(Category::Core, "{}").unwrap();
/// tx.commit().unwrap();
///
/// assert_eq!(first.id.get(), 1);
/// assert_eq!(backend.len(Category::Core), 1);
/// ```
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: Mutex<HashMap<Category, Vec<ConfigurationVersion>>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of committed versions in a category.
    pub fn len(&self, category: Category) -> usize {
        match self.tables.lock() {
            Ok(tables) => tables.get(&category).map_or(0, Vec::len),
            Err(_) => 0,
        }
    }

    /// Returns true if the category has no committed versions.
    pub fn is_empty(&self, category: Category) -> bool {
        self.len(category) == 0
    }
}

impl VersionBackend for MemoryBackend {
    fn name(&self) -> &str {
        BACKEND_NAME
    }

    fn begin(&self) -> Result<Box<dyn VersionTransaction + '_>> {
        let tables = self.tables.lock().map_err(|_| StoreError::Storage {
            backend: BACKEND_NAME.to_string(),
            message: "mutex poisoned".to_string(),
            source: None,
        })?;
        Ok(Box::new(MemoryTransaction {
            tables,
            staged: HashMap::new(),
        }))
    }
}

/// A transaction over a [`MemoryBackend`].
struct MemoryTransaction<'a> {
    tables: MutexGuard<'a, HashMap<Category, Vec<ConfigurationVersion>>>,
    /// Inserts not yet visible to other transactions
    staged: HashMap<Category, Vec<ConfigurationVersion>>,
}

impl MemoryTransaction<'_> {
    fn visible(&self, category: Category) -> impl Iterator<Item = &ConfigurationVersion> {
        let committed = self.tables.get(&category).into_iter().flatten();
        let staged = self.staged.get(&category).into_iter().flatten();
        committed.chain(staged)
    }
}

impl VersionTransaction for MemoryTransaction<'_> {
    fn latest(&mut self, category: Category) -> Result<Option<ConfigurationVersion>> {
        Ok(self.visible(category).max_by_key(|v| v.id).cloned())
    }

    fn insert(&mut self, category: Category, contents: &str) -> Result<ConfigurationVersion> {
        let next = self
            .visible(category)
            .map(|v| v.id.get())
            .max()
            .unwrap_or(0)
            + 1;
        let now = Utc::now();
        let version = ConfigurationVersion {
            id: VersionId::new(next),
            contents: contents.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.staged
            .entry(category)
            .or_default()
            .push(version.clone());
        Ok(version)
    }

    fn history(&mut self, category: Category, limit: usize) -> Result<Vec<ConfigurationVersion>> {
        let mut versions: Vec<ConfigurationVersion> = self.visible(category).cloned().collect();
        versions.sort_by(|a, b| b.id.cmp(&a.id));
        versions.truncate(limit);
        Ok(versions)
    }

    fn commit(self: Box<Self>) -> Result<()> {
        let MemoryTransaction { mut tables, staged } = *self;
        for (category, versions) in staged {
            tables.entry(category).or_default().extend(versions);
        }
        Ok(())
    }

    fn rollback(self: Box<Self>) -> Result<()> {
        // Staged inserts are dropped with the transaction.
        Ok(())
    }
}
