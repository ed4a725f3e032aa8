// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service layer containing the store's orchestration logic.
//!
//! `ConfigVersionTable` implements bootstrap and compare-and-swap for one
//! category, `CategoryStore` pairs the core and site tables, and
//! `ChangeTracker` detects snapshot changes for callers that poll.

pub mod category_store;
pub mod change_tracker;
pub mod version_table;

// Re-export commonly used types
pub use category_store::CategoryStore;
pub use change_tracker::ChangeTracker;
pub use version_table::ConfigVersionTable;
