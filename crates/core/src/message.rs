// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound sends
//!
//! A [`PendingMessage`] is fixed at construction: serializers are applied
//! before any asynchronous handoff. Wrapping it in a [`FutureMessage`]
//! pairs it with the oneshot that a caller's [`SendHandle`] waits on.

use crate::channel::{Channel, Data};
use crate::codec::Codec;
use crate::record::RecordMetadata;
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::oneshot;

/// Why a send did not produce record metadata
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("transport rejected send to {topic}: {reason}")]
    Transport { topic: String, reason: String },
    #[error("cannot decode forwarded {field}: {reason}")]
    Decode { field: &'static str, reason: String },
    #[error("cannot encode {field}: {reason}")]
    Encode { field: &'static str, reason: String },
    #[error("channel rejected send: {0}")]
    Rejected(String),
    #[error("send was dropped before it completed")]
    Dropped,
}

/// Resolution of a send
pub type SendResult = Result<RecordMetadata, SendError>;

/// Invoked once a send resolves, successfully or not
pub type MessageSentCallback = Box<dyn FnOnce(SendResult) -> BoxFuture<'static, ()> + Send>;

/// A key or value on its way out
#[derive(Clone, PartialEq, Eq)]
pub enum Payload<T> {
    /// A structured value, encoded by the target channel if needed
    Typed(T),
    /// Bytes already in wire form; published without re-encoding
    Raw(Option<Vec<u8>>),
}

impl<T: fmt::Debug> fmt::Debug for Payload<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Typed(value) => write!(f, "Typed({:?})", value),
            Self::Raw(bytes) => write!(f, "Raw({:?} bytes)", bytes.as_ref().map(Vec::len)),
        }
    }
}

/// Optional parameters of a send
pub struct SendOptions<K, V> {
    pub partition: Option<u32>,
    pub key_serializer: Option<Arc<dyn Codec<K>>>,
    pub value_serializer: Option<Arc<dyn Codec<V>>>,
    pub callback: Option<MessageSentCallback>,
    /// Publish immediately even while an event is being processed
    pub force: bool,
}

impl<K, V> SendOptions<K, V> {
    pub fn new() -> Self {
        Self {
            partition: None,
            key_serializer: None,
            value_serializer: None,
            callback: None,
            force: false,
        }
    }

    pub fn partition(mut self, partition: u32) -> Self {
        self.partition = Some(partition);
        self
    }

    pub fn key_serializer(mut self, codec: impl Codec<K> + 'static) -> Self {
        self.key_serializer = Some(Arc::new(codec));
        self
    }

    pub fn value_serializer(mut self, codec: impl Codec<V> + 'static) -> Self {
        self.value_serializer = Some(Arc::new(codec));
        self
    }

    pub fn callback<F, Fut>(mut self, callback: F) -> Self
    where
        F: FnOnce(SendResult) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.callback = Some(Box::new(move |result| callback(result).boxed()));
        self
    }

    pub fn force(mut self) -> Self {
        self.force = true;
        self
    }
}

impl<K, V> Default for SendOptions<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// An outbound send whose payload is fixed
pub struct PendingMessage<K, V> {
    pub channel: Channel<K, V>,
    pub key: Payload<K>,
    pub value: Payload<V>,
    pub partition: Option<u32>,
    pub key_serializer: Option<Arc<dyn Codec<K>>>,
    pub value_serializer: Option<Arc<dyn Codec<V>>>,
    pub callback: Option<MessageSentCallback>,
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for PendingMessage<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingMessage")
            .field("channel", &self.channel.label())
            .field("key", &self.key)
            .field("value", &self.value)
            .field("partition", &self.partition)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

/// A pending message paired with the sender half of its result
pub struct FutureMessage<K, V> {
    pub message: PendingMessage<K, V>,
    result_tx: oneshot::Sender<SendResult>,
}

impl<K, V> FutureMessage<K, V> {
    pub fn new(message: PendingMessage<K, V>) -> (Self, SendHandle) {
        let (result_tx, result_rx) = oneshot::channel();
        (Self { message, result_tx }, SendHandle { result_rx })
    }

    pub(crate) fn into_parts(self) -> (PendingMessage<K, V>, ResultSlot) {
        (self.message, ResultSlot(self.result_tx))
    }
}

/// Where a publisher writes the outcome of a send
pub(crate) struct ResultSlot(oneshot::Sender<SendResult>);

impl ResultSlot {
    /// Store the result, then run the callback with it
    pub(crate) async fn resolve(
        self,
        result: SendResult,
        callback: Option<MessageSentCallback>,
    ) -> SendResult {
        // The handle may have been dropped; the callback still runs
        let _ = self.0.send(result.clone());
        if let Some(callback) = callback {
            callback(result.clone()).await;
        }
        result
    }
}

/// Awaitable outcome of a send
#[derive(Debug)]
pub struct SendHandle {
    result_rx: oneshot::Receiver<SendResult>,
}

impl SendHandle {
    /// A handle that has already failed; runs the callback first
    pub(crate) async fn failed(error: SendError, callback: Option<MessageSentCallback>) -> Self {
        let (result_tx, result_rx) = oneshot::channel();
        // The outcome stays readable through the returned handle
        let _ = ResultSlot(result_tx).resolve(Err(error), callback).await;
        Self { result_rx }
    }

    /// The result, if the send has already resolved
    pub fn try_result(&mut self) -> Option<SendResult> {
        match self.result_rx.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(SendError::Dropped)),
        }
    }
}

impl Future for SendHandle {
    type Output = SendResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.result_rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(SendError::Dropped)))
    }
}

/// A send deferred until its triggering record is released
#[async_trait]
pub trait Attachment: Send {
    /// Publish now; the outcome goes to the send's own handle
    async fn publish(self: Box<Self>);

    fn describe(&self) -> String;
}

#[async_trait]
impl<K: Data, V: Data> Attachment for FutureMessage<K, V> {
    async fn publish(self: Box<Self>) {
        let channel = self.message.channel.clone();
        let result = channel.publish_message(*self).await;
        if let Err(e) = result {
            tracing::warn!(channel = %channel.label(), error = %e, "attached send failed");
        }
    }

    fn describe(&self) -> String {
        format!("send to {}", self.message.channel.label())
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
