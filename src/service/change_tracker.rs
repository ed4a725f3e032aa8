// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot change detection over a configuration source.

use crate::domain::{Result, UnifiedConfiguration};
use crate::ports::ConfigurationSource;

/// Remembers the last snapshot read from a source and reports new ones.
///
/// There is no background loop: callers decide when to [`poll`](Self::poll).
///
/// # Examples
///
/// ```rust
/// use cfgstore::adapters::StaticSource;
/// use cfgstore::domain::DeployType;
/// use cfgstore::service::ChangeTracker;
///
/// # fn main() -> cfgstore::domain::Result<()> {
/// let mut tracker = ChangeTracker::new(StaticSource::for_deploy_type(DeployType::Dev));
/// assert!(tracker.poll()?.is_some()); // first observation
/// assert!(tracker.poll()?.is_none()); // nothing changed
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ChangeTracker<S> {
    source: S,
    last: Option<UnifiedConfiguration>,
}

impl<S: ConfigurationSource> ChangeTracker<S> {
    /// Creates a tracker that has not observed anything yet.
    pub fn new(source: S) -> Self {
        Self { source, last: None }
    }

    /// Reads the source and returns the snapshot if it differs from the last
    /// one observed.
    pub fn poll(&mut self) -> Result<Option<UnifiedConfiguration>> {
        let current = self.source.read()?;
        if self.last.as_ref() == Some(&current) {
            return Ok(None);
        }

        tracing::debug!("Configuration from source '{}' changed", self.source.name());
        self.last = Some(current.clone());
        Ok(Some(current))
    }

    /// Returns the last snapshot observed, if any.
    pub fn last(&self) -> Option<&UnifiedConfiguration> {
        self.last.as_ref()
    }

    /// Returns the underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }
}
