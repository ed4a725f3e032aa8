// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite storage backend.
//!
//! Each category is an append-only table whose `id` column is an
//! `AUTOINCREMENT` primary key, so ids are never reused. Transactions are
//! opened with `BEGIN IMMEDIATE`, which takes the database write lock up
//! front; together with the connection mutex this serialises concurrent
//! bootstraps and compare-and-swap writes, both inside one process and
//! across processes sharing the file.

use crate::domain::{Category, ConfigurationVersion, Result, StoreError, VersionId};
use crate::ports::{VersionBackend, VersionTransaction};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

const BACKEND_NAME: &str = "sqlite";

/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteJournalMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteJournalMode {
    /// Returns the `SQLite` pragma value.
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// Configuration for the `SQLite` backend.
///
/// # Examples
///
/// ```rust
/// use cfgstore::adapters::SqliteStoreConfig;
///
/// let config: SqliteStoreConfig =
///     serde_json::from_str(r#"{"path": "/var/lib/app/config.db"}"#).unwrap();
/// assert_eq!(config.busy_timeout_ms, 5000);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// How long a transaction waits for the write lock, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
}

impl SqliteStoreConfig {
    /// Creates a configuration with default settings for a database file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteJournalMode::default(),
        }
    }
}

/// A storage backend persisting histories in an `SQLite` database.
///
/// # Examples
///
/// ```rust,no_run
/// use cfgstore::adapters::{SqliteBackend, SqliteStoreConfig};
///
/// let backend = SqliteBackend::open(&SqliteStoreConfig::new("/var/lib/app/config.db")).unwrap();
/// ```
#[derive(Debug)]
pub struct SqliteBackend {
    connection: Mutex<Connection>,
}

impl SqliteBackend {
    /// Opens (creating if needed) the database described by `config`.
    pub fn open(config: &SqliteStoreConfig) -> Result<Self> {
        ensure_parent_dir(&config.path)?;
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
        let connection = Connection::open_with_flags(&config.path, flags)
            .map_err(|e| StoreError::storage(BACKEND_NAME, "failed to open database", e))?;
        connection
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .map_err(|e| StoreError::storage(BACKEND_NAME, "failed to set busy timeout", e))?;
        connection
            .execute_batch(&format!(
                "PRAGMA journal_mode = {};",
                config.journal_mode.pragma_value()
            ))
            .map_err(|e| StoreError::storage(BACKEND_NAME, "failed to set journal mode", e))?;

        tracing::debug!(
            "Opened SQLite configuration store at {} (journal_mode={}, busy_timeout_ms={})",
            config.path.display(),
            config.journal_mode.pragma_value(),
            config.busy_timeout_ms
        );
        Self::with_connection(connection)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let connection = Connection::open_in_memory()
            .map_err(|e| StoreError::storage(BACKEND_NAME, "failed to open database", e))?;
        Self::with_connection(connection)
    }

    fn begin_transaction(&self) -> Result<SqliteTransaction<'_>> {
        let connection = self.connection.lock().map_err(|_| StoreError::Storage {
            backend: BACKEND_NAME.to_string(),
            message: "mutex poisoned".to_string(),
            source: None,
        })?;

        // A transaction whose rollback failed earlier may still be open.
        if !connection.is_autocommit() {
            tracing::warn!("Rolling back transaction left open on SQLite connection");
            connection
                .execute_batch("ROLLBACK")
                .map_err(|e| StoreError::storage(BACKEND_NAME, "failed to roll back transaction", e))?;
        }

        connection
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| StoreError::storage(BACKEND_NAME, "failed to begin transaction", e))?;
        Ok(SqliteTransaction {
            connection,
            open: true,
        })
    }

    fn with_connection(connection: Connection) -> Result<Self> {
        initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }
}

impl VersionBackend for SqliteBackend {
    fn name(&self) -> &str {
        BACKEND_NAME
    }

    fn begin(&self) -> Result<Box<dyn VersionTransaction + '_>> {
        Ok(Box::new(self.begin_transaction()?))
    }
}

/// An open `BEGIN IMMEDIATE` transaction.
///
/// Dropping it while still open issues a `ROLLBACK`.
struct SqliteTransaction<'a> {
    connection: MutexGuard<'a, Connection>,
    open: bool,
}

impl VersionTransaction for SqliteTransaction<'_> {
    fn latest(&mut self, category: Category) -> Result<Option<ConfigurationVersion>> {
        let sql = format!(
            "SELECT id, contents, created_at, updated_at FROM {} ORDER BY id DESC LIMIT 1",
            category.table_name()
        );
        self.connection
            .query_row(&sql, [], map_version_row)
            .optional()
            .map_err(|e| StoreError::storage(BACKEND_NAME, format!("failed to read latest {}", category), e))
    }

    fn insert(&mut self, category: Category, contents: &str) -> Result<ConfigurationVersion> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO {} (contents, created_at, updated_at) VALUES (?1, ?2, ?2)",
            category.table_name()
        );
        self.connection
            .execute(&sql, params![contents, now])
            .map_err(|e| StoreError::storage(BACKEND_NAME, format!("failed to insert {}", category), e))?;
        let id = self.connection.last_insert_rowid();
        Ok(ConfigurationVersion {
            id: VersionId::new(id),
            contents: contents.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    fn history(&mut self, category: Category, limit: usize) -> Result<Vec<ConfigurationVersion>> {
        let sql = format!(
            "SELECT id, contents, created_at, updated_at FROM {} ORDER BY id DESC LIMIT ?1",
            category.table_name()
        );
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut statement = self
            .connection
            .prepare(&sql)
            .map_err(|e| StoreError::storage(BACKEND_NAME, "failed to prepare history query", e))?;
        let rows = statement
            .query_map(params![limit], map_version_row)
            .map_err(|e| StoreError::storage(BACKEND_NAME, format!("failed to read {} history", category), e))?;
        let versions = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| StoreError::storage(BACKEND_NAME, format!("failed to read {} history", category), e))?;
        Ok(versions)
    }

    /// Commits, or rolls back if the commit fails.
    ///
    /// A failed rollback is reported together with the commit error.
    fn commit(mut self: Box<Self>) -> Result<()> {
        if let Err(e) = self.connection.execute_batch("COMMIT") {
            let err = StoreError::storage(BACKEND_NAME, "failed to commit transaction", e);
            if self.connection.is_autocommit() {
                // SQLite already rolled back.
                self.open = false;
                return Err(err);
            }
            return match self.roll_back() {
                Ok(()) => Err(err),
                Err(rollback) => Err(err.with_rollback_failure(rollback)),
            };
        }
        self.open = false;
        Ok(())
    }

    fn rollback(mut self: Box<Self>) -> Result<()> {
        self.roll_back()
    }
}

impl SqliteTransaction<'_> {
    /// Issues `ROLLBACK`; the transaction stays open if that fails.
    fn roll_back(&mut self) -> Result<()> {
        self.connection
            .execute_batch("ROLLBACK")
            .map_err(|e| StoreError::storage(BACKEND_NAME, "failed to roll back transaction", e))?;
        self.open = false;
        Ok(())
    }
}

impl Drop for SqliteTransaction<'_> {
    fn drop(&mut self) {
        if self.open {
            if let Err(e) = self.roll_back() {
                tracing::warn!("Failed to roll back abandoned SQLite transaction: {}", e);
            }
        }
    }
}

fn map_version_row(row: &Row<'_>) -> rusqlite::Result<ConfigurationVersion> {
    let id: i64 = row.get(0)?;
    let created_at: DateTime<Utc> = row.get(2)?;
    let updated_at: DateTime<Utc> = row.get(3)?;
    Ok(ConfigurationVersion {
        id: VersionId::new(id),
        contents: row.get(1)?,
        created_at,
        updated_at,
    })
}

/// Ensures the parent directory for the database exists.
fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent)?;
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Creates the category tables if they do not exist yet.
fn initialize_schema(connection: &Connection) -> Result<()> {
    for category in Category::ALL {
        connection
            .execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    contents TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );",
                category.table_name()
            ))
            .map_err(|e| StoreError::storage(BACKEND_NAME, "failed to initialize schema", e))?;
    }
    Ok(())
}
