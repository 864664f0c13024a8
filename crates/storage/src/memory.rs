// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory reference store

use crate::store::Store;
use std::collections::BTreeMap;

/// Store backed by an ordered map
///
/// Holds no durability marker, so recovery always replays the full
/// changelog.
#[derive(Debug, Clone)]
pub struct MemoryStore<K, V> {
    data: BTreeMap<K, V>,
}

impl<K: Ord, V> MemoryStore<K, V> {
    pub fn new() -> Self {
        Self {
            data: BTreeMap::new(),
        }
    }
}

impl<K: Ord, V> Default for MemoryStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Store<K, V> for MemoryStore<K, V>
where
    K: Ord + Clone + Send,
    V: Clone + Send,
{
    fn on_init(&mut self) {
        self.data = BTreeMap::new();
    }

    fn get(&self, key: &K) -> Option<V> {
        self.data.get(key).cloned()
    }

    fn set(&mut self, key: K, value: V) {
        self.data.insert(key, value);
    }

    fn del(&mut self, key: &K) -> Option<V> {
        self.data.remove(key)
    }

    fn contains(&self, key: &K) -> bool {
        self.data.contains_key(key)
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn items(&self) -> Vec<(K, V)> {
        self.data
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn clear(&mut self) {
        self.data.clear();
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
