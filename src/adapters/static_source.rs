// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory configuration source.
//!
//! A stand-in for services that do not own persistent configuration, and a
//! convenient fixture in tests.

use crate::domain::{
    validate_document, Category, DeployType, Result, StoreError, UnifiedConfiguration,
};
use crate::ports::ConfigurationSource;
use std::sync::RwLock;

const SOURCE_NAME: &str = "static";

/// A configuration source holding its snapshot in memory.
///
/// # Examples
///
/// ```rust
/// use cfgstore::adapters::StaticSource;
/// use cfgstore::domain::DeployType;
/// use cfgstore::ports::ConfigurationSource;
///
/// let source = StaticSource::for_deploy_type(DeployType::Dev);
/// assert_eq!(source.read().unwrap().site, "{}");
/// ```
#[derive(Debug)]
pub struct StaticSource {
    current: RwLock<UnifiedConfiguration>,
}

impl StaticSource {
    /// Creates a source that initially returns `snapshot`.
    pub fn new(snapshot: UnifiedConfiguration) -> Self {
        Self {
            current: RwLock::new(snapshot),
        }
    }

    /// Creates a source holding the built-in defaults for a deployment type.
    pub fn for_deploy_type(deploy_type: DeployType) -> Self {
        Self::new(UnifiedConfiguration::default_for(deploy_type))
    }
}

fn poisoned() -> StoreError {
    StoreError::SourceError {
        source_name: SOURCE_NAME.to_string(),
        message: "lock poisoned".to_string(),
        source: None,
    }
}

impl ConfigurationSource for StaticSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn read(&self) -> Result<UnifiedConfiguration> {
        let current = self.current.read().map_err(|_| poisoned())?;
        Ok(current.clone())
    }

    fn write(&self, input: &UnifiedConfiguration) -> Result<()> {
        validate_document(Category::Core, &input.core)?;
        validate_document(Category::Site, &input.site)?;
        let mut current = self.current.write().map_err(|_| poisoned())?;
        *current = input.clone();
        Ok(())
    }
}
