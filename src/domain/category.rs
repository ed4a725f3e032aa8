// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration categories.
//!
//! Each category owns an independent, append-only version history. Categories
//! never share rows or version numbers.

use std::fmt;

/// A named, independently versioned configuration document stream.
///
/// # Examples
///
/// ```
/// use cfgstore::domain::Category;
///
/// assert_eq!(Category::Site.as_str(), "site");
/// assert_eq!(Category::Core.table_name(), "core_configuration_files");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// Core configuration (deployment-critical settings).
    Core,
    /// Site configuration (everything editable by site administrators).
    Site,
}

impl Category {
    /// Every category, in storage order.
    pub const ALL: [Category; 2] = [Category::Core, Category::Site];

    /// Returns the short category name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Core => "core",
            Category::Site => "site",
        }
    }

    /// Returns the name of the relation holding this category's history.
    pub fn table_name(&self) -> &'static str {
        match self {
            Category::Core => "core_configuration_files",
            Category::Site => "site_configuration_files",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
