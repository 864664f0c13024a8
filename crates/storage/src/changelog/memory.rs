// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory changelog
//!
//! Clones share the same log, so a test can hand one clone to a table and
//! inspect the other.

use super::{Changelog, ChangelogEntry, ChangelogError};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Default)]
pub struct MemoryChangelog {
    entries: Arc<Mutex<Vec<ChangelogEntry>>>,
}

impl MemoryChangelog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ChangelogEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Changelog for MemoryChangelog {
    fn append(
        &mut self,
        topic: &str,
        partition: u32,
        key: Value,
        value: Option<Value>,
    ) -> Result<u64, ChangelogError> {
        let mut entries = self.lock();
        let sequence = entries.len() as u64;
        entries.push(ChangelogEntry::new(sequence, topic, partition, key, value));
        Ok(sequence)
    }

    fn entries(&self) -> Result<Vec<ChangelogEntry>, ChangelogError> {
        Ok(self.lock().clone())
    }
}
