// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced transport wrapper for consistent observability

use async_trait::async_trait;
use rill_core::{Acknowledger, Message, Producer, RecordMetadata, TransportError};
use tracing::Instrument;

/// Wrapper that adds tracing to any transport
#[derive(Clone)]
pub struct TracedTransport<T> {
    inner: T,
}

impl<T> TracedTransport<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait]
impl<T: Acknowledger> Acknowledger for TracedTransport<T> {
    async fn ack(&self, message: &Message) -> Result<(), TransportError> {
        let span = tracing::info_span!("transport.ack", tp = %message.tp, offset = message.offset);

        let result = self.inner.ack(message).instrument(span.clone()).await;
        let _guard = span.enter();
        match &result {
            Ok(()) => tracing::debug!("acked"),
            Err(e) => tracing::error!(error = %e, "ack failed"),
        }

        result
    }
}

#[async_trait]
impl<T: Producer> Producer for TracedTransport<T> {
    async fn send(
        &self,
        topic: &str,
        partition: Option<u32>,
        key: Option<Vec<u8>>,
        value: Option<Vec<u8>>,
    ) -> Result<RecordMetadata, TransportError> {
        let span = tracing::info_span!("transport.send", topic, partition = ?partition);
        span.in_scope(|| {
            tracing::info!(
                key_len = key.as_ref().map(Vec::len),
                value_len = value.as_ref().map(Vec::len),
                "starting"
            )
        });

        let start = std::time::Instant::now();
        let result = self
            .inner
            .send(topic, partition, key, value)
            .instrument(span.clone())
            .await;
        let elapsed = start.elapsed();

        let _guard = span.enter();
        match &result {
            Ok(metadata) => tracing::info!(
                offset = ?metadata.offset,
                elapsed_ms = elapsed.as_millis() as u64,
                "record sent"
            ),
            Err(e) => tracing::error!(
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "send failed"
            ),
        }

        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
