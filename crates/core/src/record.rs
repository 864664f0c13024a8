// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Raw transport records
//!
//! A [`Message`] is the undecoded unit handed over by the transport. It is
//! shared as `Arc<Message>` between every [`Event`](crate::Event) decoded
//! from it, and carries an explicit reference count: the transport is only
//! acknowledged once every holder has released its reference.

use crate::message::Attachment;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// A topic and partition pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TopicPartition {
    pub topic: String,
    pub partition: u32,
}

impl TopicPartition {
    pub fn new(topic: impl Into<String>, partition: u32) -> Self {
        Self {
            topic: topic.into(),
            partition,
        }
    }
}

impl fmt::Display for TopicPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.topic, self.partition)
    }
}

/// Metadata describing where a sent record landed
///
/// Every field is `None` when the record was published into an
/// in-process channel rather than a transport-backed topic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub topic: Option<String>,
    pub partition: Option<u32>,
    pub offset: Option<u64>,
    pub timestamp_ms: Option<i64>,
}

impl RecordMetadata {
    /// Metadata for a record that never left the process
    pub fn in_process() -> Self {
        Self::default()
    }

    pub fn is_in_process(&self) -> bool {
        self.topic.is_none() && self.offset.is_none()
    }
}

/// An undecoded record received from the transport
pub struct Message {
    pub tp: TopicPartition,
    pub offset: u64,
    /// Milliseconds since the Unix epoch, when the transport supplies one
    pub timestamp_ms: Option<i64>,
    pub key: Option<Vec<u8>>,
    pub value: Option<Vec<u8>>,
    refcount: AtomicUsize,
    acked: AtomicBool,
    attachments: Mutex<Vec<Box<dyn Attachment>>>,
}

impl Message {
    /// Create a record holding a single reference
    pub fn new(
        tp: TopicPartition,
        offset: u64,
        key: Option<Vec<u8>>,
        value: Option<Vec<u8>>,
    ) -> Self {
        Self {
            tp,
            offset,
            timestamp_ms: None,
            key,
            value,
            refcount: AtomicUsize::new(1),
            acked: AtomicBool::new(false),
            attachments: Mutex::new(Vec::new()),
        }
    }

    pub fn with_timestamp(mut self, timestamp_ms: i64) -> Self {
        self.timestamp_ms = Some(timestamp_ms);
        self
    }

    /// Set the number of consumers that must release this record
    pub fn with_refcount(self, refcount: usize) -> Self {
        self.refcount.store(refcount, Ordering::SeqCst);
        self
    }

    /// Add a reference (one more consumer of this record)
    pub fn incref(&self) {
        self.refcount.fetch_add(1, Ordering::SeqCst);
    }

    /// Release one reference
    ///
    /// Returns the remaining count, or `None` if the record was already
    /// fully released. The count never wraps below zero.
    pub fn decref(&self) -> Option<usize> {
        self.refcount
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .ok()
            .map(|previous| previous - 1)
    }

    pub fn refcount(&self) -> usize {
        self.refcount.load(Ordering::SeqCst)
    }

    /// Latch the acknowledgment; returns true only for the first caller
    pub fn mark_acked(&self) -> bool {
        !self.acked.swap(true, Ordering::SeqCst)
    }

    pub fn is_acked(&self) -> bool {
        self.acked.load(Ordering::SeqCst)
    }

    /// Attach an outbound send to be flushed before this record is acked
    ///
    /// Hands the attachment back if the record has already been released,
    /// so the caller can publish it directly instead of losing it.
    pub fn attach(&self, attachment: Box<dyn Attachment>) -> Result<(), Box<dyn Attachment>> {
        let mut attachments = self.attachments.lock().unwrap_or_else(|e| e.into_inner());
        if self.refcount() == 0 || self.is_acked() {
            return Err(attachment);
        }
        attachments.push(attachment);
        Ok(())
    }

    /// Number of sends waiting on this record
    pub fn attachment_count(&self) -> usize {
        self.attachments
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Drain attached sends in attach order
    pub fn take_attachments(&self) -> Vec<Box<dyn Attachment>> {
        std::mem::take(&mut *self.attachments.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("tp", &self.tp)
            .field("offset", &self.offset)
            .field("timestamp_ms", &self.timestamp_ms)
            .field("key", &self.key.as_ref().map(Vec::len))
            .field("value", &self.value.as_ref().map(Vec::len))
            .field("refcount", &self.refcount())
            .field("acked", &self.is_acked())
            .finish()
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
