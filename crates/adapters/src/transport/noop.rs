// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op transport for pipelines that never leave the process.

use async_trait::async_trait;
use rill_core::{Acknowledger, Message, Producer, RecordMetadata, TransportError};

/// Transport that accepts everything and stores nothing.
///
/// Sends resolve with the topic and partition but no offset.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpTransport;

impl NoOpTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Acknowledger for NoOpTransport {
    async fn ack(&self, _message: &Message) -> Result<(), TransportError> {
        Ok(())
    }
}

#[async_trait]
impl Producer for NoOpTransport {
    async fn send(
        &self,
        topic: &str,
        partition: Option<u32>,
        _key: Option<Vec<u8>>,
        _value: Option<Vec<u8>>,
    ) -> Result<RecordMetadata, TransportError> {
        Ok(RecordMetadata {
            topic: Some(topic.to_string()),
            partition: Some(partition.unwrap_or(0)),
            offset: None,
            timestamp_ms: None,
        })
    }
}
