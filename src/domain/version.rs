// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stored configuration versions.
//!
//! A [`ConfigurationVersion`] is one immutable row of a category's history.
//! Rows are only ever appended; the row with the highest [`VersionId`] is the
//! latest.

use crate::domain::Category;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a stored configuration version.
///
/// Ids are assigned by the store, strictly increase within a category and
/// are never reused.
///
/// # Examples
///
/// ```
/// use cfgstore::domain::VersionId;
///
/// let id = VersionId::from(3);
/// assert_eq!(id.get(), 3);
/// assert_eq!(id.to_string(), "3");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(i64);

impl VersionId {
    /// Wraps a raw id.
    pub fn new(id: i64) -> Self {
        VersionId(id)
    }

    /// Returns the raw id.
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for VersionId {
    fn from(id: i64) -> Self {
        VersionId(id)
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One version of a category's configuration document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationVersion {
    /// Store-assigned id
    pub id: VersionId,
    /// The JSONC document text
    pub contents: String,
    /// When the version was inserted
    pub created_at: DateTime<Utc>,
    /// When the version was inserted (versions are never updated)
    pub updated_at: DateTime<Utc>,
}

/// Result of a compare-and-swap write.
///
/// `latest` is always the authoritative latest version after the operation:
/// the newly inserted row when `accepted`, the unchanged existing row
/// otherwise.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteOutcome {
    /// The latest version once the write completed
    pub latest: ConfigurationVersion,
    /// Whether the caller's contents were stored
    pub accepted: bool,
}

impl WriteOutcome {
    /// Returns true if the write was rejected because the caller was stale.
    pub fn is_conflict(&self) -> bool {
        !self.accepted
    }
}

/// One category write in a multi-category compare-and-swap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CategoryWrite<'a> {
    /// The category to write
    pub category: Category,
    /// The id the writer last read
    pub last_id: Option<VersionId>,
    /// The new JSONC document
    pub contents: &'a str,
}
