// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transport boundary
//!
//! Channels never talk to a broker directly. Acknowledgment of consumed
//! records and publication of outbound records go through these traits;
//! real and fake implementations live in `rill-adapters`.

use crate::record::{Message, RecordMetadata};
use async_trait::async_trait;
use thiserror::Error;

/// Errors reported by a transport
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("unknown topic: {0}")]
    UnknownTopic(String),
    #[error("send to {topic} failed: {reason}")]
    SendFailed { topic: String, reason: String },
    #[error("ack of {tp}@{offset} failed: {reason}")]
    AckFailed {
        tp: String,
        offset: u64,
        reason: String,
    },
}

// =============================================================================
// Consumer side
// =============================================================================

/// Marks consumed records as processed
#[async_trait]
pub trait Acknowledger: Send + Sync + 'static {
    /// Acknowledge one record; called at most once per record
    async fn ack(&self, message: &Message) -> Result<(), TransportError>;
}

/// Acknowledger for records that never came from a transport
#[derive(Debug, Clone, Copy, Default)]
pub struct InProcessAck;

#[async_trait]
impl Acknowledger for InProcessAck {
    async fn ack(&self, _message: &Message) -> Result<(), TransportError> {
        Ok(())
    }
}

// =============================================================================
// Producer side
// =============================================================================

/// Publishes encoded records to a topic
#[async_trait]
pub trait Producer: Send + Sync + 'static {
    async fn send(
        &self,
        topic: &str,
        partition: Option<u32>,
        key: Option<Vec<u8>>,
        value: Option<Vec<u8>>,
    ) -> Result<RecordMetadata, TransportError>;
}
