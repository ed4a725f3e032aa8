// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON file configuration source adapter.
//!
//! This module provides a source that keeps the whole unified snapshot in a
//! single JSON file, for deployments without a database.

use crate::domain::{validate_document, Category, Result, StoreError, UnifiedConfiguration};
use crate::ports::ConfigurationSource;
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// Maximum allowed size of the snapshot file (10MB)
const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

const SOURCE_NAME: &str = "file";

/// Configuration source backed by a JSON file.
///
/// The file holds a serialized [`UnifiedConfiguration`]:
///
/// ```json
/// {"core": "{}", "site": "{}", "deployment": {"gitServers": []}}
/// ```
///
/// Both documents are validated as JSONC on read and on write. Writes go to a
/// sibling temporary file that is then renamed over the original, so readers
/// never observe a partially written file.
///
/// # Examples
///
/// ```rust,no_run
/// use cfgstore::adapters::JsonFileSource;
/// use cfgstore::ports::ConfigurationSource;
///
/// let source = JsonFileSource::new("/etc/myapp/configuration.json");
/// let snapshot = source.read().unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    /// Path to the snapshot file
    file_path: PathBuf,
}

impl JsonFileSource {
    /// Creates a source for the given file path. The file need not exist
    /// until the first read.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: path.into(),
        }
    }

    /// Creates a source in the default OS-appropriate configuration directory.
    ///
    /// # Arguments
    ///
    /// * `app_name` - The application name (e.g., "myapp")
    /// * `qualifier` - The organization/qualifier (e.g., "com.example")
    pub fn from_default_location(app_name: &str, qualifier: &str) -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from(qualifier, "", app_name).ok_or_else(|| StoreError::SourceError {
                source_name: SOURCE_NAME.to_string(),
                message: "Failed to determine project directories".to_string(),
                source: None,
            })?;

        Ok(Self::new(proj_dirs.config_dir().join("configuration.json")))
    }

    /// Returns the path to the snapshot file.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn display_name(&self) -> &str {
        self.file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("<unknown>")
    }

    fn source_error(&self, message: String, err: std::io::Error) -> StoreError {
        StoreError::SourceError {
            source_name: SOURCE_NAME.to_string(),
            message,
            source: Some(Box::new(err)),
        }
    }
}

fn validate_snapshot(snapshot: &UnifiedConfiguration) -> Result<()> {
    validate_document(Category::Core, &snapshot.core)?;
    validate_document(Category::Site, &snapshot.site)
}

impl ConfigurationSource for JsonFileSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn read(&self) -> Result<UnifiedConfiguration> {
        let metadata = fs::metadata(&self.file_path).map_err(|e| {
            self.source_error(
                format!("Failed to read file metadata: {}", self.display_name()),
                e,
            )
        })?;

        if metadata.len() > MAX_FILE_SIZE {
            return Err(StoreError::SourceError {
                source_name: SOURCE_NAME.to_string(),
                message: format!(
                    "Configuration file too large: {} bytes (max {} bytes)",
                    metadata.len(),
                    MAX_FILE_SIZE
                ),
                source: None,
            });
        }

        let content = fs::read_to_string(&self.file_path).map_err(|e| {
            self.source_error(
                format!("Failed to read configuration file: {}", self.display_name()),
                e,
            )
        })?;

        let snapshot: UnifiedConfiguration =
            serde_json::from_str(&content).map_err(|e| StoreError::SourceError {
                source_name: SOURCE_NAME.to_string(),
                message: format!("Failed to parse {}: {}", self.display_name(), e),
                source: Some(Box::new(e)),
            })?;
        validate_snapshot(&snapshot)?;

        tracing::debug!("Read configuration snapshot from {}", self.file_path.display());
        Ok(snapshot)
    }

    fn write(&self, input: &UnifiedConfiguration) -> Result<()> {
        validate_snapshot(input)?;

        let content = serde_json::to_string_pretty(input).map_err(|e| StoreError::SourceError {
            source_name: SOURCE_NAME.to_string(),
            message: format!("Failed to serialize configuration: {}", e),
            source: Some(Box::new(e)),
        })?;

        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self.file_path.with_extension("json.tmp");
        fs::write(&tmp_path, content).map_err(|e| {
            self.source_error(
                format!("Failed to write configuration file: {}", self.display_name()),
                e,
            )
        })?;
        fs::rename(&tmp_path, &self.file_path).map_err(|e| {
            self.source_error(
                format!("Failed to replace configuration file: {}", self.display_name()),
                e,
            )
        })?;

        tracing::debug!("Wrote configuration snapshot to {}", self.file_path.display());
        Ok(())
    }
}
