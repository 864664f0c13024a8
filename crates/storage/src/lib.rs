// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! rill-storage: changelog-backed tables for Rill
//!
//! Tables write every mutation to a changelog before updating their store,
//! so a table can always be rebuilt by replaying its changelog.

pub mod changelog;
pub mod memory;
pub mod store;
pub mod table;
pub mod wrapper;

pub use changelog::{
    Changelog, ChangelogCorruption, ChangelogEntry, ChangelogError, ChangelogReader,
    ChangelogTopic, ChangelogValidation, FileChangelog, MemoryChangelog,
};
pub use memory::MemoryStore;
pub use store::{Store, StoreError};
pub use table::{Table, TableBuilder, TableError, TableKey, TableValue};
pub use wrapper::WindowWrapper;
