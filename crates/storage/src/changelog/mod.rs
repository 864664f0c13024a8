// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Table changelogs
//!
//! Every table mutation is appended here before the table's store changes.
//! Replaying a changelog in order (last write wins per key) rebuilds the
//! table.
//!
//! ```text
//! Table::set/del → ChangelogEntry → Changelog::append → memory | disk (*.jsonl)
//!                                                          ↓
//!                                    Changelog::entries → Store::apply_changelog_batch
//! ```
//!
//! The file changelog follows write-ahead-log rules: every append is
//! fsync'd before returning, entries carry a CRC32 checksum, and readers
//! stop at the first corrupt or truncated line.

pub mod entry;
pub mod memory;
pub mod reader;
pub mod writer;

pub use entry::ChangelogEntry;
pub use memory::MemoryChangelog;
pub use reader::{ChangelogCorruption, ChangelogEntryIter, ChangelogReader, ChangelogValidation};
pub use writer::FileChangelog;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors from changelog reads and writes
#[derive(Debug, Error)]
pub enum ChangelogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("corrupted entry at line {line}: {reason}")]
    Corrupted { line: u64, reason: String },
    #[error("checksum mismatch at line {line}")]
    ChecksumMismatch { line: u64 },
}

/// Append-only sink for table mutations
pub trait Changelog: Send {
    /// Append one mutation; `None` is a tombstone
    ///
    /// Returns the assigned sequence number once the entry is recorded.
    fn append(
        &mut self,
        topic: &str,
        partition: u32,
        key: Value,
        value: Option<Value>,
    ) -> Result<u64, ChangelogError>;

    /// Every valid entry, in append order
    fn entries(&self) -> Result<Vec<ChangelogEntry>, ChangelogError>;
}

/// Configuration of the topic a table's changelog is published to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelogTopic {
    pub name: String,
    /// Keep only the latest entry per key
    pub compacting: bool,
    /// Drop entries older than `retention`
    pub deleting: bool,
    pub retention: Option<Duration>,
}

impl ChangelogTopic {
    /// A compacted topic named `{app_id}-{table}-changelog`
    pub fn for_table(app_id: &str, table: &str) -> Self {
        Self {
            name: format!("{}-{}-changelog", app_id, table),
            compacting: true,
            deleting: false,
            retention: None,
        }
    }

    /// Compacting and deleting, retaining entries for `retention`
    pub fn windowed(self, retention: Option<Duration>) -> Self {
        Self {
            compacting: true,
            deleting: true,
            retention,
            ..self
        }
    }
}

#[cfg(test)]
#[path = "topic_tests.rs"]
mod tests;
