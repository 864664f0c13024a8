// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Changelog entry structure with checksum verification
//!
//! Each entry records one table mutation: the JSON-encoded key and either
//! the JSON-encoded value or, for a deletion, no `value` field at all. A
//! stored value of JSON `null` is written as `"value":null` and stays a
//! value.

use super::ChangelogError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

/// A single mutation in a table's changelog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangelogEntry {
    /// Monotonically increasing sequence number
    pub sequence: u64,
    /// Microseconds since Unix epoch
    pub timestamp_micros: u64,
    pub topic: String,
    pub partition: u32,
    pub key: Value,
    /// `None` marks a deletion
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_value"
    )]
    pub value: Option<Value>,
    /// CRC32 checksum of the serialized mutation
    pub checksum: u32,
}

impl ChangelogEntry {
    /// Create an entry stamped with the current time
    pub fn new(
        sequence: u64,
        topic: &str,
        partition: u32,
        key: Value,
        value: Option<Value>,
    ) -> Self {
        let timestamp_micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or(0);
        Self::new_with_timestamp(sequence, timestamp_micros, topic, partition, key, value)
    }

    /// Create an entry with a specific timestamp (for testing)
    pub fn new_with_timestamp(
        sequence: u64,
        timestamp_micros: u64,
        topic: &str,
        partition: u32,
        key: Value,
        value: Option<Value>,
    ) -> Self {
        let checksum = Self::calculate_checksum(topic, partition, &key, value.as_ref());
        Self {
            sequence,
            timestamp_micros,
            topic: topic.to_string(),
            partition,
            key,
            value,
            checksum,
        }
    }

    pub fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }

    fn calculate_checksum(topic: &str, partition: u32, key: &Value, value: Option<&Value>) -> u32 {
        // Values are already JSON, so serialization cannot fail
        let json = serde_json::to_string(&(topic, partition, key, value.is_none(), value))
            .unwrap_or_default();
        crc32fast::hash(json.as_bytes())
    }

    /// Verify the checksum matches the mutation
    pub fn verify(&self) -> bool {
        self.checksum
            == Self::calculate_checksum(&self.topic, self.partition, &self.key, self.value.as_ref())
    }

    /// Serialize to newline-delimited JSON (one line)
    pub fn to_line(&self) -> Result<String, ChangelogError> {
        serde_json::to_string(self).map_err(ChangelogError::from)
    }

    /// Parse from a single line of JSON
    pub fn from_line(line: &str) -> Result<Self, ChangelogError> {
        serde_json::from_str(line).map_err(ChangelogError::from)
    }
}

/// A `value` field that is present is a value, even when it is `null`
fn present_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

#[cfg(test)]
#[path = "entry_tests.rs"]
mod tests;
