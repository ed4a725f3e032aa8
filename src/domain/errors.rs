// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the configuration store.
//!
//! Optimistic-concurrency conflicts are deliberately absent here: a rejected
//! compare-and-swap write is an expected outcome and is reported through
//! [`WriteOutcome::accepted`](crate::domain::WriteOutcome::accepted).

use crate::domain::{Category, VersionId};
use thiserror::Error;

/// The main error type for configuration store operations.
///
/// # Examples
///
/// ```
/// use cfgstore::domain::{Category, StoreError};
///
/// let error = StoreError::MalformedConfiguration {
///     category: Category::Site,
///     message: "unexpected end of input".to_string(),
/// };
/// assert!(error.to_string().contains("site"));
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// The document is not syntactically valid JSONC. Nothing was written.
    #[error("Malformed {category} configuration: {message}")]
    MalformedConfiguration {
        /// The category the document was destined for
        category: Category,
        /// The parser's description of the problem
        message: String,
    },

    /// The storage backend failed (connection, statement or commit).
    #[error("Storage backend '{backend}' error: {message}")]
    Storage {
        /// The name of the backend that failed
        backend: String,
        /// The error message
        message: String,
        /// The underlying backend error, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An operation failed and rolling back its transaction failed as well.
    ///
    /// `cause` is the original error and is what [`std::error::Error::source`]
    /// returns. Use [`StoreError::original`] to reach it through nested
    /// rollback failures.
    #[error("{cause} (rollback also failed: {rollback})")]
    RollbackFailed {
        /// The error that triggered the rollback
        #[source]
        cause: Box<StoreError>,
        /// The error raised by the rollback itself
        rollback: Box<StoreError>,
    },

    /// A category had no latest version after its default was ensured.
    ///
    /// This cannot happen against a correctly behaving backend; callers
    /// should treat it as unrecoverable.
    #[error("Invariant violated: {category} configuration has no latest version after bootstrap")]
    InvariantViolation {
        /// The category that was found empty
        category: Category,
    },

    /// A configuration source write lost a race against another writer.
    #[error("Concurrent modification of {category} configuration (latest is now {latest})")]
    ConcurrentModification {
        /// The category that was modified concurrently
        category: Category,
        /// The latest version id observed when the write was rejected
        latest: VersionId,
    },

    /// An error occurred in a configuration source.
    #[error("Configuration source '{source_name}' error: {message}")]
    SourceError {
        /// The name of the source that encountered the error
        source_name: String,
        /// The error message
        message: String,
        /// The underlying error, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An I/O error occurred while reading or writing configuration.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StoreError {
    /// Creates a `Storage` error wrapping a backend error.
    pub fn storage<E>(backend: &str, message: impl Into<String>, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StoreError::Storage {
            backend: backend.to_string(),
            message: message.into(),
            source: Some(Box::new(err)),
        }
    }

    /// Combines an operation error with the error its rollback produced.
    pub fn with_rollback_failure(self, rollback: StoreError) -> Self {
        StoreError::RollbackFailed {
            cause: Box::new(self),
            rollback: Box::new(rollback),
        }
    }

    /// Returns the error that started the failure chain.
    ///
    /// For `RollbackFailed` this follows `cause` until it reaches the first
    /// non-rollback error; every other variant returns itself.
    pub fn original(&self) -> &StoreError {
        match self {
            StoreError::RollbackFailed { cause, .. } => cause.original(),
            other => other,
        }
    }

    /// Returns true if the error is a rejected malformed document.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self.original(),
            StoreError::MalformedConfiguration { .. }
        )
    }
}

/// A specialized Result type for configuration store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
