// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Changelog-backed tables
//!
//! A [`Table`] is a key/value mapping whose every mutation is appended to a
//! changelog before the store reflects it. Keys and values are JSON-encoded
//! for the changelog, so replaying it into a fresh store rebuilds the same
//! visible state.

use crate::changelog::{Changelog, ChangelogEntry, ChangelogError, ChangelogTopic, MemoryChangelog};
use crate::memory::MemoryStore;
use crate::store::{Store, StoreError};
use crate::wrapper::WindowWrapper;
use rill_core::{Clock, SystemClock, TableSensor, TopicPartition, WindowError, WindowPolicy};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{self, Debug};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Bound for table keys
pub trait TableKey: Serialize + DeserializeOwned + Ord + Clone + Debug + Send + 'static {}

impl<T: Serialize + DeserializeOwned + Ord + Clone + Debug + Send + 'static> TableKey for T {}

/// Bound for table values
pub trait TableValue: Serialize + DeserializeOwned + Clone + Debug + Send + 'static {}

impl<T: Serialize + DeserializeOwned + Clone + Debug + Send + 'static> TableValue for T {}

/// Errors from table operations
#[derive(Debug, Error)]
pub enum TableError {
    #[error("key not found in table {table}: {key}")]
    KeyNotFound { table: String, key: String },
    #[error("cannot encode entry for table {table}: {reason}")]
    Encode { table: String, reason: String },
    #[error("changelog error: {0}")]
    Changelog(#[from] ChangelogError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("window error: {0}")]
    Window(#[from] WindowError),
}

type DefaultFactory<V> = Box<dyn Fn() -> V + Send + Sync>;

/// Builder for [`Table`]
pub struct TableBuilder<K, V, S> {
    app_id: String,
    name: String,
    store: S,
    changelog: Option<Box<dyn Changelog>>,
    default: Option<DefaultFactory<V>>,
    ttl: Option<Duration>,
    clock: Arc<dyn Clock>,
    sensors: Vec<Arc<dyn TableSensor>>,
    partition: u32,
    _key: std::marker::PhantomData<fn() -> K>,
}

impl<K: TableKey, V: TableValue, S: Store<K, V>> TableBuilder<K, V, S> {
    /// Use a different store backend
    pub fn store<S2: Store<K, V>>(self, store: S2) -> TableBuilder<K, V, S2> {
        TableBuilder {
            app_id: self.app_id,
            name: self.name,
            store,
            changelog: self.changelog,
            default: self.default,
            ttl: self.ttl,
            clock: self.clock,
            sensors: self.sensors,
            partition: self.partition,
            _key: std::marker::PhantomData,
        }
    }

    pub fn changelog(mut self, changelog: impl Changelog + 'static) -> Self {
        self.changelog = Some(Box::new(changelog));
        self
    }

    /// Value returned for missing keys instead of an error
    pub fn default(mut self, factory: impl Fn() -> V + Send + Sync + 'static) -> Self {
        self.default = Some(Box::new(factory));
        self
    }

    /// Expire keys this long after their last write
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn sensor(mut self, sensor: Arc<dyn TableSensor>) -> Self {
        self.sensors.push(sensor);
        self
    }

    /// Partition recorded on changelog entries
    pub fn partition(mut self, partition: u32) -> Self {
        self.partition = partition;
        self
    }

    pub fn build(self) -> Table<K, V, S> {
        let mut store = self.store;
        store.on_init();
        Table {
            topic: ChangelogTopic::for_table(&self.app_id, &self.name),
            name: self.name,
            partition: self.partition,
            store,
            changelog: self
                .changelog
                .unwrap_or_else(|| Box::new(MemoryChangelog::new())),
            default: self.default,
            ttl: self.ttl,
            deadlines: BTreeMap::new(),
            clock: self.clock,
            sensors: self.sensors,
            window: None,
        }
    }
}

/// A recoverable, observable key/value mapping
pub struct Table<K, V, S = MemoryStore<K, V>> {
    name: String,
    topic: ChangelogTopic,
    partition: u32,
    store: S,
    changelog: Box<dyn Changelog>,
    default: Option<DefaultFactory<V>>,
    ttl: Option<Duration>,
    deadlines: BTreeMap<K, Instant>,
    clock: Arc<dyn Clock>,
    sensors: Vec<Arc<dyn TableSensor>>,
    window: Option<WindowPolicy>,
}

impl<K: TableKey, V: TableValue> Table<K, V> {
    /// A table on an in-memory store and changelog
    pub fn builder(app_id: &str, name: &str) -> TableBuilder<K, V, MemoryStore<K, V>> {
        TableBuilder {
            app_id: app_id.to_string(),
            name: name.to_string(),
            store: MemoryStore::new(),
            changelog: None,
            default: None,
            ttl: None,
            clock: Arc::new(SystemClock),
            sensors: Vec::new(),
            partition: 0,
            _key: std::marker::PhantomData,
        }
    }
}

impl<K: TableKey, V: TableValue, S: Store<K, V>> Table<K, V, S> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configuration of the changelog topic
    pub fn topic(&self) -> &ChangelogTopic {
        &self.topic
    }

    pub fn partition(&self) -> u32 {
        self.partition
    }

    /// Window policy bound by [`using_window`](Table::using_window)
    pub fn window(&self) -> Option<&WindowPolicy> {
        self.window.as_ref()
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn contains(&self, key: &K) -> bool {
        self.store.contains(key)
    }

    /// Look up a key, falling back to the default factory
    pub fn get(&self, key: &K) -> Result<V, TableError> {
        for sensor in &self.sensors {
            sensor.on_get(&self.name, key);
        }
        match self.store.get(key) {
            Some(value) => Ok(value),
            None => self.missing(key),
        }
    }

    /// Look up a key, storing the default value if it is missing
    pub fn get_or_default(&mut self, key: K) -> Result<V, TableError> {
        if let Some(value) = self.store.get(&key) {
            for sensor in &self.sensors {
                sensor.on_get(&self.name, &key);
            }
            return Ok(value);
        }
        let value = self.missing(&key)?;
        self.set(key, value.clone())?;
        Ok(value)
    }

    fn missing(&self, key: &K) -> Result<V, TableError> {
        match &self.default {
            Some(factory) => Ok(factory()),
            None => Err(TableError::KeyNotFound {
                table: self.name.clone(),
                key: format!("{:?}", key),
            }),
        }
    }

    /// Write a value
    ///
    /// The changelog append happens first; the store is untouched if it
    /// fails.
    pub fn set(&mut self, key: K, value: V) -> Result<(), TableError> {
        let raw_key = self.encode(&key)?;
        let raw_value = self.encode(&value)?;
        let sequence = self
            .changelog
            .append(&self.topic.name, self.partition, raw_key, Some(raw_value))?;
        tracing::trace!(table = %self.name, sequence, key = ?key, "set");

        self.store.set(key.clone(), value.clone());
        if let Some(ttl) = self.ttl {
            self.deadlines.insert(key.clone(), self.clock.now() + ttl);
        }
        for sensor in &self.sensors {
            sensor.on_set(&self.name, &key, &value);
        }
        Ok(())
    }

    /// Remove a key, recording a tombstone
    pub fn del(&mut self, key: &K) -> Result<V, TableError> {
        if !self.store.contains(key) {
            return Err(TableError::KeyNotFound {
                table: self.name.clone(),
                key: format!("{:?}", key),
            });
        }
        let raw_key = self.encode(key)?;
        let sequence = self
            .changelog
            .append(&self.topic.name, self.partition, raw_key, None)?;
        tracing::trace!(table = %self.name, sequence, key = ?key, "del");

        let removed = self.store.del(key);
        self.deadlines.remove(key);
        for sensor in &self.sensors {
            sensor.on_del(&self.name, key);
        }
        removed.ok_or_else(|| TableError::KeyNotFound {
            table: self.name.clone(),
            key: format!("{:?}", key),
        })
    }

    /// Replace a value with `f(current)`, starting from the default
    pub fn update(&mut self, key: K, f: impl FnOnce(V) -> V) -> Result<V, TableError> {
        let current = self.get(&key)?;
        let updated = f(current);
        self.set(key, updated.clone())?;
        Ok(updated)
    }

    /// Every entry in key order
    pub fn items(&self) -> Vec<(K, V)> {
        self.store.items()
    }

    pub fn keys(&self) -> Vec<K> {
        self.store.items().into_iter().map(|(k, _)| k).collect()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Apply changelog entries for this table's topic to the store
    ///
    /// Entries for other topics are ignored. Recovered keys get a fresh
    /// TTL deadline. Returns the number of entries applied.
    pub fn recover(&mut self, entries: &[ChangelogEntry]) -> Result<usize, TableError> {
        let ours: Vec<ChangelogEntry> = entries
            .iter()
            .filter(|entry| entry.topic == self.topic.name)
            .cloned()
            .collect();
        let applied = self
            .store
            .apply_changelog_batch(&ours, &decode::<K>, &decode::<V>)?;

        if let Some(ttl) = self.ttl {
            let deadline = self.clock.now() + ttl;
            self.deadlines = self
                .store
                .items()
                .into_iter()
                .map(|(k, _)| (k, deadline))
                .collect();
        }
        tracing::debug!(table = %self.name, applied, "recovered from changelog");
        Ok(applied)
    }

    /// Rebuild the store from this table's own changelog
    pub fn restore(&mut self) -> Result<usize, TableError> {
        let entries = self.changelog.entries()?;
        self.store.on_init();
        self.recover(&entries)
    }

    /// Every entry this table has appended, in order
    pub fn changelog_entries(&self) -> Result<Vec<ChangelogEntry>, TableError> {
        Ok(self.changelog.entries()?)
    }

    /// Last durable transport offset reported by the store
    pub fn persisted_offset(&self, tp: &TopicPartition) -> Option<u64> {
        self.store.persisted_offset(tp)
    }

    /// Keys whose TTL deadline has passed
    pub fn expired_keys(&self) -> Vec<K> {
        let now = self.clock.now();
        self.deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Delete every expired key; each deletion is a changelog tombstone
    pub fn purge_expired(&mut self) -> Result<Vec<K>, TableError> {
        let expired = self.expired_keys();
        for key in &expired {
            self.del(key)?;
        }
        if !expired.is_empty() {
            tracing::debug!(table = %self.name, purged = expired.len(), "purged expired keys");
        }
        Ok(expired)
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Value, TableError> {
        serde_json::to_value(value).map_err(|e| TableError::Encode {
            table: self.name.clone(),
            reason: e.to_string(),
        })
    }
}

fn decode<T: DeserializeOwned>(raw: &Value) -> Result<T, String> {
    T::deserialize(raw).map_err(|e| e.to_string())
}

impl<K, V, S> Table<(K, i64), V, S>
where
    K: TableKey,
    V: TableValue,
    S: Store<(K, i64), V>,
{
    /// Bucket this table by `policy`
    ///
    /// The changelog topic becomes compacting and deleting, retaining
    /// entries for the policy's expiry.
    pub fn using_window(mut self, policy: WindowPolicy) -> WindowWrapper<K, V, S> {
        self.window = Some(policy);
        self.topic = self.topic.clone().windowed(policy.expires());
        WindowWrapper::new(self, policy)
    }

    pub fn hopping(
        self,
        size: Duration,
        step: Duration,
        expires: Option<Duration>,
    ) -> Result<WindowWrapper<K, V, S>, TableError> {
        Ok(self.using_window(WindowPolicy::hopping(size, step, expires)?))
    }

    pub fn tumbling(
        self,
        size: Duration,
        expires: Option<Duration>,
    ) -> Result<WindowWrapper<K, V, S>, TableError> {
        Ok(self.using_window(WindowPolicy::tumbling(size, expires)?))
    }
}

impl<K, V, S> fmt::Debug for Table<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("topic", &self.topic)
            .field("partition", &self.partition)
            .field("ttl", &self.ttl)
            .field("window", &self.window)
            .finish()
    }
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
