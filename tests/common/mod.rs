// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared helpers for integration tests.

use cfgstore::adapters::MemoryBackend;
use cfgstore::domain::{Category, ConfigurationVersion, Result, StoreError};
use cfgstore::ports::{VersionBackend, VersionTransaction};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, Once};

static TRACING: Once = Once::new();

/// Installs a test-writer tracing subscriber once per test binary.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// A write another client commits while the backend is in use.
#[derive(Debug)]
struct ForeignWrite {
    /// Transactions to let through before the write lands
    skip: usize,
    category: Category,
    contents: String,
}

/// A memory backend whose inserts, commits and rollbacks can be made to fail,
/// and which can slip a foreign write in between two transactions.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct FailingBackend {
    inner: MemoryBackend,
    fail_insert: AtomicBool,
    fail_commit: AtomicBool,
    fail_rollback: AtomicBool,
    foreign_write: Mutex<Option<ForeignWrite>>,
}

#[allow(dead_code)]
impl FailingBackend {
    /// Creates a backend that does not fail until told to.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every insert fail.
    pub fn fail_inserts(&self, fail: bool) {
        self.fail_insert.store(fail, Ordering::SeqCst);
    }

    /// Makes every commit fail.
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commit.store(fail, Ordering::SeqCst);
    }

    /// Makes every rollback fail.
    pub fn fail_rollbacks(&self, fail: bool) {
        self.fail_rollback.store(fail, Ordering::SeqCst);
    }

    /// Commits `contents` to `category` as another client would, just
    /// before the transaction that follows the next `skip` ones begins.
    pub fn write_before_transaction(&self, skip: usize, category: Category, contents: &str) {
        *self.foreign_write.lock().unwrap() = Some(ForeignWrite {
            skip,
            category,
            contents: contents.to_string(),
        });
    }

    /// Returns the number of committed versions in a category.
    pub fn len(&self, category: Category) -> usize {
        self.inner.len(category)
    }

    fn apply_foreign_write(&self) -> Result<()> {
        let mut pending = self.foreign_write.lock().unwrap();
        let write = match pending.take() {
            Some(mut write) if write.skip > 0 => {
                write.skip -= 1;
                *pending = Some(write);
                return Ok(());
            }
            Some(write) => write,
            None => return Ok(()),
        };
        drop(pending);

        let mut tx = self.inner.begin()?;
        tx.insert(write.category, &write.contents)?;
        tx.commit()
    }
}

fn injected(message: &str) -> StoreError {
    StoreError::Storage {
        backend: "failing".to_string(),
        message: message.to_string(),
        source: None,
    }
}

impl VersionBackend for FailingBackend {
    fn name(&self) -> &str {
        "failing"
    }

    fn begin(&self) -> Result<Box<dyn VersionTransaction + '_>> {
        self.apply_foreign_write()?;
        let inner = self.inner.begin()?;
        Ok(Box::new(FailingTransaction {
            inner,
            backend: self,
        }))
    }
}

struct FailingTransaction<'a> {
    inner: Box<dyn VersionTransaction + 'a>,
    backend: &'a FailingBackend,
}

impl VersionTransaction for FailingTransaction<'_> {
    fn latest(&mut self, category: Category) -> Result<Option<ConfigurationVersion>> {
        self.inner.latest(category)
    }

    fn insert(&mut self, category: Category, contents: &str) -> Result<ConfigurationVersion> {
        if self.backend.fail_insert.load(Ordering::SeqCst) {
            return Err(injected("injected insert failure"));
        }
        self.inner.insert(category, contents)
    }

    fn history(&mut self, category: Category, limit: usize) -> Result<Vec<ConfigurationVersion>> {
        self.inner.history(category, limit)
    }

    fn commit(self: Box<Self>) -> Result<()> {
        if self.backend.fail_commit.load(Ordering::SeqCst) {
            let err = injected("injected commit failure");
            return match self.rollback() {
                Ok(()) => Err(err),
                Err(rollback) => Err(err.with_rollback_failure(rollback)),
            };
        }
        self.inner.commit()
    }

    fn rollback(self: Box<Self>) -> Result<()> {
        if self.backend.fail_rollback.load(Ordering::SeqCst) {
            return Err(injected("injected rollback failure"));
        }
        self.inner.rollback()
    }
}
