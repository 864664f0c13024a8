// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store backends
//!
//! A store holds a table's visible state. It never writes the changelog
//! itself; it only applies changelog batches during recovery.

use crate::changelog::ChangelogEntry;
use rill_core::TopicPartition;
use serde_json::Value;
use thiserror::Error;

/// Errors from applying changelog entries to a store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot decode changelog key at sequence {sequence}: {reason}")]
    Key { sequence: u64, reason: String },
    #[error("cannot decode changelog value at sequence {sequence}: {reason}")]
    Value { sequence: u64, reason: String },
}

/// Converts a raw changelog key or value into its structured form
pub type Convert<'a, T> = &'a dyn Fn(&Value) -> Result<T, String>;

/// Key/value backend for a table
pub trait Store<K, V>: Send {
    /// Establish an empty mapping
    fn on_init(&mut self) {
        self.clear();
    }

    fn get(&self, key: &K) -> Option<V>;

    fn set(&mut self, key: K, value: V);

    fn del(&mut self, key: &K) -> Option<V>;

    fn contains(&self, key: &K) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every entry in key order
    fn items(&self) -> Vec<(K, V)>;

    fn clear(&mut self);

    /// Apply changelog entries in order
    ///
    /// Last write wins per key and tombstones remove the key, so applying
    /// the same batch twice leaves the same state. Returns the number of
    /// entries applied.
    fn apply_changelog_batch(
        &mut self,
        entries: &[ChangelogEntry],
        to_key: Convert<'_, K>,
        to_value: Convert<'_, V>,
    ) -> Result<usize, StoreError> {
        for entry in entries {
            let key = to_key(&entry.key).map_err(|reason| StoreError::Key {
                sequence: entry.sequence,
                reason,
            })?;
            match &entry.value {
                Some(raw) => {
                    let value = to_value(raw).map_err(|reason| StoreError::Value {
                        sequence: entry.sequence,
                        reason,
                    })?;
                    self.set(key, value);
                }
                None => {
                    self.del(&key);
                }
            }
        }
        Ok(entries.len())
    }

    /// Last transport offset known to be durable in this store
    ///
    /// `None` when the backend does not track durability.
    fn persisted_offset(&self, _tp: &TopicPartition) -> Option<u64> {
        None
    }

    /// Wipe any state the backend keeps outside the process
    fn reset_state(&mut self) {}
}
