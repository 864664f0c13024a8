// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recording transport doubles for unit tests

use crate::record::{Message, RecordMetadata, TopicPartition};
use crate::transport::{Acknowledger, Producer, TransportError};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Everything the transport saw, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seen {
    Ack { offset: u64 },
    Send { topic: String, key: Option<Vec<u8>>, value: Option<Vec<u8>> },
}

#[derive(Clone, Default)]
pub struct RecordingTransport {
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl RecordingTransport {
    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    pub fn acks(&self) -> usize {
        self.seen()
            .iter()
            .filter(|s| matches!(s, Seen::Ack { .. }))
            .count()
    }

    pub fn sends(&self) -> usize {
        self.seen()
            .iter()
            .filter(|s| matches!(s, Seen::Send { .. }))
            .count()
    }
}

#[async_trait]
impl Acknowledger for RecordingTransport {
    async fn ack(&self, message: &Message) -> Result<(), TransportError> {
        self.seen.lock().unwrap().push(Seen::Ack {
            offset: message.offset,
        });
        Ok(())
    }
}

#[async_trait]
impl Producer for RecordingTransport {
    async fn send(
        &self,
        topic: &str,
        partition: Option<u32>,
        key: Option<Vec<u8>>,
        value: Option<Vec<u8>>,
    ) -> Result<RecordMetadata, TransportError> {
        let mut seen = self.seen.lock().unwrap();
        seen.push(Seen::Send {
            topic: topic.to_string(),
            key,
            value,
        });
        Ok(RecordMetadata {
            topic: Some(topic.to_string()),
            partition: Some(partition.unwrap_or(0)),
            offset: Some(seen.len() as u64),
            timestamp_ms: None,
        })
    }
}

pub fn record(offset: u64, key: &str, value: &str) -> Arc<Message> {
    Arc::new(Message::new(
        TopicPartition::new("input", 0),
        offset,
        Some(key.as_bytes().to_vec()),
        Some(value.as_bytes().to_vec()),
    ))
}

/// Let spawned tasks run until they block
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
