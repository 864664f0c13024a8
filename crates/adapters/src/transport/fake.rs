// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake transport for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use async_trait::async_trait;
use rill_core::{Acknowledger, Message, Producer, RecordMetadata, TopicPartition, TransportError};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

/// Recorded transport call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    Ack {
        tp: TopicPartition,
        offset: u64,
    },
    Send {
        topic: String,
        partition: u32,
        key: Option<Vec<u8>>,
        value: Option<Vec<u8>>,
    },
}

/// A record accepted by the fake producer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentRecord {
    pub topic: String,
    pub partition: u32,
    pub offset: u64,
    pub key: Option<Vec<u8>>,
    pub value: Option<Vec<u8>>,
}

impl SentRecord {
    /// The record as a consumer would receive it
    pub fn to_message(&self) -> Arc<Message> {
        Arc::new(Message::new(
            TopicPartition::new(self.topic.clone(), self.partition),
            self.offset,
            self.key.clone(),
            self.value.clone(),
        ))
    }
}

#[derive(Default)]
struct FakeTransportState {
    calls: Vec<TransportCall>,
    sent: Vec<SentRecord>,
    next_offsets: HashMap<(String, u32), u64>,
    topics: Option<BTreeSet<String>>,
    fail_sends: Option<String>,
    fail_acks: Option<String>,
}

/// Fake transport that records acks and sends in memory
///
/// Sends are assigned consecutive offsets per topic partition.
#[derive(Clone, Default)]
pub struct FakeTransport {
    inner: Arc<Mutex<FakeTransportState>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept sends to these topics
    pub fn with_topics(self, topics: &[&str]) -> Self {
        self.lock().topics = Some(topics.iter().map(|t| t.to_string()).collect());
        self
    }

    /// Make subsequent sends fail with `reason`
    pub fn fail_sends(&self, reason: &str) {
        self.lock().fail_sends = Some(reason.to_string());
    }

    /// Make subsequent acks fail with `reason`
    pub fn fail_acks(&self, reason: &str) {
        self.lock().fail_acks = Some(reason.to_string());
    }

    /// Clear injected failures
    pub fn heal(&self) {
        let mut state = self.lock();
        state.fail_sends = None;
        state.fail_acks = None;
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<TransportCall> {
        self.lock().calls.clone()
    }

    /// Acknowledged records, in ack order
    pub fn acks(&self) -> Vec<(TopicPartition, u64)> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                TransportCall::Ack { tp, offset } => Some((tp.clone(), *offset)),
                TransportCall::Send { .. } => None,
            })
            .collect()
    }

    /// Records accepted by the producer, in send order
    pub fn sent(&self) -> Vec<SentRecord> {
        self.lock().sent.clone()
    }

    pub fn sent_to(&self, topic: &str) -> Vec<SentRecord> {
        self.lock()
            .sent
            .iter()
            .filter(|record| record.topic == topic)
            .cloned()
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeTransportState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Acknowledger for FakeTransport {
    async fn ack(&self, message: &Message) -> Result<(), TransportError> {
        let mut state = self.lock();
        state.calls.push(TransportCall::Ack {
            tp: message.tp.clone(),
            offset: message.offset,
        });
        match &state.fail_acks {
            Some(reason) => Err(TransportError::AckFailed {
                tp: message.tp.to_string(),
                offset: message.offset,
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Producer for FakeTransport {
    async fn send(
        &self,
        topic: &str,
        partition: Option<u32>,
        key: Option<Vec<u8>>,
        value: Option<Vec<u8>>,
    ) -> Result<RecordMetadata, TransportError> {
        let mut state = self.lock();
        let partition = partition.unwrap_or(0);
        state.calls.push(TransportCall::Send {
            topic: topic.to_string(),
            partition,
            key: key.clone(),
            value: value.clone(),
        });

        if let Some(topics) = &state.topics {
            if !topics.contains(topic) {
                return Err(TransportError::UnknownTopic(topic.to_string()));
            }
        }
        if let Some(reason) = &state.fail_sends {
            return Err(TransportError::SendFailed {
                topic: topic.to_string(),
                reason: reason.clone(),
            });
        }

        let next = state
            .next_offsets
            .entry((topic.to_string(), partition))
            .or_insert(0);
        let offset = *next;
        *next += 1;
        state.sent.push(SentRecord {
            topic: topic.to_string(),
            partition,
            offset,
            key,
            value,
        });

        Ok(RecordMetadata {
            topic: Some(topic.to_string()),
            partition: Some(partition),
            offset: Some(offset),
            timestamp_ms: None,
        })
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
