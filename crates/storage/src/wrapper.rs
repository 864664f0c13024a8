// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Windowed view of a table
//!
//! Maps flat access by `key` onto the underlying table's `(key, bucket)`
//! entries. The timestamp of an access is the current event's record
//! timestamp when one is in scope, otherwise the table clock's wall time.

use crate::memory::MemoryStore;
use crate::store::Store;
use crate::table::{Table, TableError, TableKey, TableValue};
use rill_core::context;
use rill_core::{Timestamp, WindowPolicy, WindowRange};
use std::time::Duration;

/// A table bucketed by a window policy
pub struct WindowWrapper<K, V, S = MemoryStore<(K, i64), V>> {
    table: Table<(K, i64), V, S>,
    policy: WindowPolicy,
}

impl<K, V, S> WindowWrapper<K, V, S>
where
    K: TableKey,
    V: TableValue,
    S: Store<(K, i64), V>,
{
    pub(crate) fn new(table: Table<(K, i64), V, S>, policy: WindowPolicy) -> Self {
        Self { table, policy }
    }

    pub fn table(&self) -> &Table<(K, i64), V, S> {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut Table<(K, i64), V, S> {
        &mut self.table
    }

    pub fn policy(&self) -> &WindowPolicy {
        &self.policy
    }

    /// Timestamp used for accesses made now
    pub fn timestamp(&self) -> Timestamp {
        context::current_message()
            .and_then(|message| message.timestamp_ms)
            .unwrap_or_else(|| self.table.clock().wall_millis())
    }

    /// Write `value` into every bucket containing the current timestamp
    pub fn set(&mut self, key: K, value: V) -> Result<(), TableError> {
        self.set_at(key, value, self.timestamp())
    }

    pub fn set_at(&mut self, key: K, value: V, timestamp: Timestamp) -> Result<(), TableError> {
        for bucket in self.policy.buckets(timestamp) {
            self.table.set((key.clone(), bucket), value.clone())?;
        }
        Ok(())
    }

    /// Apply `f` in every bucket containing the current timestamp
    ///
    /// Missing buckets start from the table default. Returns the value of
    /// the current bucket.
    pub fn update(&mut self, key: K, f: impl Fn(V) -> V) -> Result<V, TableError> {
        self.update_at(key, f, self.timestamp())
    }

    pub fn update_at(
        &mut self,
        key: K,
        f: impl Fn(V) -> V,
        timestamp: Timestamp,
    ) -> Result<V, TableError> {
        let current = self.policy.current(timestamp);
        let mut result = None;
        for bucket in self.policy.buckets(timestamp) {
            let updated = self.table.update((key.clone(), bucket), &f)?;
            if bucket == current {
                result = Some(updated);
            }
        }
        match result {
            Some(value) => Ok(value),
            None => self.table.get(&(key, current)),
        }
    }

    /// Value in the most recent bucket for the current timestamp
    pub fn current(&self, key: &K) -> Result<V, TableError> {
        let bucket = self.policy.current(self.timestamp());
        self.table.get(&(key.clone(), bucket))
    }

    /// Value in the most recent bucket for the wall clock, ignoring events
    pub fn now(&self, key: &K) -> Result<V, TableError> {
        let bucket = self.policy.current(self.table.clock().wall_millis());
        self.table.get(&(key.clone(), bucket))
    }

    /// Value in the bucket that was current `delta` ago
    pub fn delta(&self, key: &K, delta: Duration) -> Result<V, TableError> {
        let bucket = self.policy.delta(self.timestamp(), delta);
        self.table.get(&(key.clone(), bucket))
    }

    /// Remove `key` from every bucket containing the current timestamp
    ///
    /// Buckets that hold no value for `key` are skipped. Returns how many
    /// entries were removed.
    pub fn del(&mut self, key: &K) -> Result<usize, TableError> {
        let mut removed = 0;
        for bucket in self.policy.buckets(self.timestamp()) {
            let windowed = (key.clone(), bucket);
            if self.table.contains(&windowed) {
                self.table.del(&windowed)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Every stored bucket for `key`, oldest first
    pub fn values(&self, key: &K) -> Vec<(WindowRange, V)> {
        self.table
            .items()
            .into_iter()
            .filter(|((k, _), _)| k == key)
            .map(|((_, bucket), value)| (self.policy.range(bucket), value))
            .collect()
    }

    /// Stored buckets past their retention at `now`
    ///
    /// Retention is enforced by the changelog topic; this only reports.
    pub fn expired(&self, now: Timestamp) -> Vec<(K, WindowRange)> {
        self.table
            .keys()
            .into_iter()
            .map(|(key, bucket)| (key, self.policy.range(bucket)))
            .filter(|(_, range)| self.policy.is_expired(range, now))
            .collect()
    }
}

#[cfg(test)]
#[path = "wrapper_tests.rs"]
mod tests;
