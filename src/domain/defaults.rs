// SPDX-License-Identifier: MIT OR Apache-2.0

//! Default documents seeded into empty categories.
//!
//! Defaults are chosen once at process start. [`DefaultConfigurations`] is the
//! immutable value handed to [`CategoryStore`](crate::service::CategoryStore);
//! [`DefaultsCell`] is the process-owned slot that enforces the
//! set-exactly-once contract.

use crate::domain::{validate_document, Category, DeployType, Result, UnifiedConfiguration};
use once_cell::sync::OnceCell;

/// The default core and site documents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DefaultConfigurations {
    core: String,
    site: String,
}

impl DefaultConfigurations {
    /// Creates the defaults, validating both documents.
    ///
    /// # Examples
    ///
    /// ```
    /// use cfgstore::domain::{Category, DefaultConfigurations};
    ///
    /// let defaults = DefaultConfigurations::new("{}", "{\"title\": \"x\"}").unwrap();
    /// assert_eq!(defaults.get(Category::Core), "{}");
    /// assert!(DefaultConfigurations::new("{", "{}").is_err());
    /// ```
    pub fn new(core: impl Into<String>, site: impl Into<String>) -> Result<Self> {
        let core = core.into();
        let site = site.into();
        validate_document(Category::Core, &core)?;
        validate_document(Category::Site, &site)?;
        Ok(Self { core, site })
    }

    /// Returns the built-in defaults for a deployment type.
    pub fn for_deploy_type(deploy_type: DeployType) -> Self {
        let defaults = UnifiedConfiguration::default_for(deploy_type);
        Self {
            core: defaults.core,
            site: defaults.site,
        }
    }

    /// Returns the default document for a category.
    pub fn get(&self, category: Category) -> &str {
        match category {
            Category::Core => &self.core,
            Category::Site => &self.site,
        }
    }
}

/// A set-once holder for the process's default configurations.
///
/// The owning process sets it exactly once during startup. A second `set` is
/// a programming error and panics, because categories may already have been
/// seeded from the first value.
#[derive(Debug, Default)]
pub struct DefaultsCell {
    inner: OnceCell<DefaultConfigurations>,
}

impl DefaultsCell {
    /// Creates an empty cell.
    pub const fn new() -> Self {
        Self {
            inner: OnceCell::new(),
        }
    }

    /// Stores the defaults.
    ///
    /// # Panics
    ///
    /// Panics if the defaults were already set.
    pub fn set(&self, defaults: DefaultConfigurations) -> &DefaultConfigurations {
        let mut stored_now = false;
        let stored = self.inner.get_or_init(|| {
            stored_now = true;
            defaults
        });
        if !stored_now {
            panic!("default configurations may not be set twice");
        }
        tracing::debug!("Default configurations set");
        stored
    }

    /// Returns the defaults if they have been set.
    pub fn get(&self) -> Option<&DefaultConfigurations> {
        self.inner.get()
    }

    /// Returns true once the defaults have been set.
    pub fn is_set(&self) -> bool {
        self.inner.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_per_category() {
        let defaults = DefaultConfigurations::new(r#"{"c": 1}"#, r#"{"s": 1}"#).unwrap();
        assert_eq!(defaults.get(Category::Core), r#"{"c": 1}"#);
        assert_eq!(defaults.get(Category::Site), r#"{"s": 1}"#);
    }

    #[test]
    fn test_defaults_reject_malformed() {
        let err = DefaultConfigurations::new("{}", "{\"a\":").unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_defaults_for_deploy_type() {
        let defaults = DefaultConfigurations::for_deploy_type(DeployType::Cluster);
        assert_eq!(defaults.get(Category::Core), "{}");
        assert_eq!(defaults.get(Category::Site), "{}");
    }

    #[test]
    fn test_cell_set_once() {
        let cell = DefaultsCell::new();
        assert!(!cell.is_set());

        let defaults = cell.set(DefaultConfigurations::for_deploy_type(DeployType::Dev));
        assert_eq!(defaults.get(Category::Site), "{}");
        assert!(cell.is_set());
    }

    #[test]
    #[should_panic(expected = "may not be set twice")]
    fn test_cell_set_twice_panics() {
        let cell = DefaultsCell::new();
        cell.set(DefaultConfigurations::for_deploy_type(DeployType::Dev));
        cell.set(DefaultConfigurations::for_deploy_type(DeployType::Cluster));
    }
}
