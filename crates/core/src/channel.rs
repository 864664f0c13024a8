// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Channels
//!
//! A channel connects the transport to application logic: inbound records
//! are decoded into [`Event`]s and queued, and outbound sends are either
//! queued locally (in-process channels) or handed to a [`Producer`]
//! (topic-backed channels).
//!
//! A channel exists in two roles. The declaration form is what application
//! code holds and sends to; the iterator form consumes the queue. Both are
//! the same type, distinguished by [`Channel::is_iterator`].

use crate::codec::{Codec, DecodeError, Serializers};
use crate::context;
use crate::event::{self, Event};
use crate::message::{FutureMessage, Payload, PendingMessage, SendError, SendHandle, SendOptions, SendResult};
use crate::queue::{FlowControlQueue, DEFAULT_CAPACITY};
use crate::record::{Message, RecordMetadata, TopicPartition};
use crate::transport::{Acknowledger, InProcessAck, Producer};
use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Bound for keys and values carried by channels
pub trait Data: Clone + fmt::Debug + Send + Sync + 'static {}

impl<T: Clone + fmt::Debug + Send + Sync + 'static> Data for T {}

/// Usage errors; fatal to the calling operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("cannot put on {0} before iterating it")]
    NotIterable(String),
    #[error("{0} is not an iterator; call iter() first")]
    NotIterator(String),
    #[error("cannot inherit decoded {field}: target channel expects {expected}")]
    InheritMismatch {
        field: &'static str,
        expected: &'static str,
    },
}

/// What happens to a record whose key or value cannot be decoded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeErrorPolicy {
    /// Release the record's reference so the transport offset can advance
    #[default]
    Skip,
    /// Leave the record unacknowledged for external recovery
    Hold,
}

/// Channel tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub capacity: usize,
    pub clone_shares_queue: bool,
    pub clear_on_resume: bool,
    pub decode_error_policy: DecodeErrorPolicy,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            clone_shares_queue: true,
            clear_on_resume: true,
            decode_error_policy: DecodeErrorPolicy::default(),
        }
    }
}

/// Decode failure handling
///
/// Failures never propagate past the channel. The defaults log and move on
/// to the next record.
#[async_trait]
pub trait ChannelHooks: Send + Sync + 'static {
    async fn on_key_decode_error(&self, error: &DecodeError, message: &Message) {
        tracing::error!(
            tp = %message.tp,
            offset = message.offset,
            key = ?message.key,
            error = %error,
            "cannot decode key"
        );
    }

    async fn on_value_decode_error(&self, error: &DecodeError, message: &Message) {
        tracing::error!(
            tp = %message.tp,
            offset = message.offset,
            key = ?message.key,
            value = ?message.value,
            error = %error,
            "cannot decode value"
        );
    }
}

/// Default hooks: log through `tracing` and swallow
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDecodeErrors;

impl ChannelHooks for LogDecodeErrors {}

/// Where published records go
#[derive(Clone)]
pub enum Backing {
    /// Published records are queued on this channel
    InProcess,
    /// Published records are encoded and handed to a producer
    Topic {
        name: String,
        producer: Arc<dyn Producer>,
    },
}

impl fmt::Debug for Backing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InProcess => write!(f, "InProcess"),
            Self::Topic { name, .. } => write!(f, "Topic({})", name),
        }
    }
}

struct ChannelShared<K, V> {
    serializers: Serializers<K, V>,
    acker: Arc<dyn Acknowledger>,
    hooks: Arc<dyn ChannelHooks>,
    backing: Backing,
    config: ChannelConfig,
    local_offset: AtomicU64,
}

/// Builder for [`Channel`]
pub struct ChannelBuilder<K, V> {
    serializers: Serializers<K, V>,
    acker: Arc<dyn Acknowledger>,
    hooks: Arc<dyn ChannelHooks>,
    backing: Backing,
    config: ChannelConfig,
}

impl<K: Data, V: Data> ChannelBuilder<K, V> {
    pub fn config(mut self, config: ChannelConfig) -> Self {
        self.config = config;
        self
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    pub fn clone_shares_queue(mut self, shares: bool) -> Self {
        self.config.clone_shares_queue = shares;
        self
    }

    pub fn clear_on_resume(mut self, clear: bool) -> Self {
        self.config.clear_on_resume = clear;
        self
    }

    pub fn decode_error_policy(mut self, policy: DecodeErrorPolicy) -> Self {
        self.config.decode_error_policy = policy;
        self
    }

    pub fn acknowledger(mut self, acker: Arc<dyn Acknowledger>) -> Self {
        self.acker = acker;
        self
    }

    pub fn hooks(mut self, hooks: impl ChannelHooks) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    /// Back the channel with a transport topic
    pub fn topic(mut self, name: impl Into<String>, producer: Arc<dyn Producer>) -> Self {
        self.backing = Backing::Topic {
            name: name.into(),
            producer,
        };
        self
    }

    pub fn build(self) -> Channel<K, V> {
        let queue = FlowControlQueue::with_options(self.config.capacity, self.config.clear_on_resume);
        Channel {
            id: Uuid::new_v4(),
            is_iterator: false,
            queue: Arc::new(queue),
            shared: Arc::new(ChannelShared {
                serializers: self.serializers,
                acker: self.acker,
                hooks: self.hooks,
                backing: self.backing,
                config: self.config,
                local_offset: AtomicU64::new(0),
            }),
        }
    }
}

/// Queue of decoded events plus the logic to publish into it
pub struct Channel<K, V> {
    id: Uuid,
    is_iterator: bool,
    queue: Arc<FlowControlQueue<Event<K, V>>>,
    shared: Arc<ChannelShared<K, V>>,
}

impl<K, V> Channel<K, V> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn label(&self) -> String {
        format!("Channel: {}", self.id)
    }

    pub fn is_iterator(&self) -> bool {
        self.is_iterator
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.shared.config
    }

    pub fn backing(&self) -> &Backing {
        &self.shared.backing
    }

    pub fn serializers(&self) -> &Serializers<K, V> {
        &self.shared.serializers
    }
}

impl<K: Data, V: Data> Channel<K, V> {
    /// An in-process declaration channel with default settings
    pub fn new(serializers: Serializers<K, V>) -> Self {
        Self::builder(serializers).build()
    }

    pub fn builder(serializers: Serializers<K, V>) -> ChannelBuilder<K, V> {
        ChannelBuilder {
            serializers,
            acker: Arc::new(InProcessAck),
            hooks: Arc::new(LogDecodeErrors),
            backing: Backing::InProcess,
            config: ChannelConfig::default(),
        }
    }

    /// New channel sharing this one's configuration
    ///
    /// The queue is shared when `clone_shares_queue` is set, otherwise the
    /// clone gets a fresh, empty one. `is_iterator` defaults to this
    /// channel's role.
    pub fn clone_channel(&self, is_iterator: Option<bool>) -> Self {
        let queue = if self.shared.config.clone_shares_queue {
            Arc::clone(&self.queue)
        } else {
            Arc::new(FlowControlQueue::with_options(
                self.shared.config.capacity,
                self.shared.config.clear_on_resume,
            ))
        };
        Self {
            id: Uuid::new_v4(),
            is_iterator: is_iterator.unwrap_or(self.is_iterator),
            queue,
            shared: Arc::clone(&self.shared),
        }
    }

    // -------------------------------------------------------------------------
    // Inbound
    // -------------------------------------------------------------------------

    /// Decode a record and enqueue the resulting event
    ///
    /// Waits while the queue is full. Records that fail to decode go to the
    /// hooks and produce no event.
    pub async fn deliver(&self, message: Arc<Message>) {
        if let Some(event) = self.decode(message).await {
            tracing::trace!(channel = %self.label(), offset = event.message().offset, "delivering");
            self.queue.put(event).await;
        }
    }

    /// Decode a record into an event without enqueueing it
    pub async fn decode(&self, message: Arc<Message>) -> Option<Event<K, V>> {
        let serializers = &self.shared.serializers;
        let key = match serializers.loads_key(message.key.as_deref()).await {
            Ok(key) => key,
            Err(e) => {
                self.shared.hooks.on_key_decode_error(&e, &message).await;
                self.after_decode_error(&message).await;
                return None;
            }
        };
        let value = match serializers.loads_value(message.value.as_deref()).await {
            Ok(value) => value,
            Err(e) => {
                self.shared.hooks.on_value_decode_error(&e, &message).await;
                self.after_decode_error(&message).await;
                return None;
            }
        };
        Some(Event::new(key, value, message, Arc::clone(&self.shared.acker)))
    }

    async fn after_decode_error(&self, message: &Arc<Message>) {
        match self.shared.config.decode_error_policy {
            DecodeErrorPolicy::Skip => {
                if let Err(e) = event::release(message, self.shared.acker.as_ref()).await {
                    tracing::warn!(tp = %message.tp, offset = message.offset, error = %e, "ack of undecodable record failed");
                }
            }
            DecodeErrorPolicy::Hold => {
                tracing::debug!(tp = %message.tp, offset = message.offset, "holding undecodable record");
            }
        }
    }

    // -------------------------------------------------------------------------
    // Outbound
    // -------------------------------------------------------------------------

    /// Send a record to this channel
    ///
    /// Unless `options.force` is set, a send made while an event is being
    /// processed on this task is attached to that event and published when
    /// it is released. Failures are reported through the returned handle.
    pub async fn send(
        &self,
        key: Payload<K>,
        value: Payload<V>,
        mut options: SendOptions<K, V>,
    ) -> SendHandle {
        let force = options.force;
        let callback = options.callback.take();
        match self.as_future_message(key, value, options) {
            Ok((mut fut, handle)) => {
                fut.message.callback = callback;
                self.dispatch(fut, force).await;
                handle
            }
            Err(e) => SendHandle::failed(e, callback).await,
        }
    }

    /// Build a future message with its payloads prepared
    pub fn as_future_message(
        &self,
        key: Payload<K>,
        value: Payload<V>,
        options: SendOptions<K, V>,
    ) -> Result<(FutureMessage<K, V>, SendHandle), SendError> {
        let key = self.prepare_key(key, options.key_serializer.as_ref())?;
        let value = self.prepare_value(value, options.value_serializer.as_ref())?;
        Ok(FutureMessage::new(PendingMessage {
            channel: self.clone(),
            key,
            value,
            partition: options.partition,
            key_serializer: options.key_serializer,
            value_serializer: options.value_serializer,
            callback: options.callback,
        }))
    }

    /// Identity in-process; topic-backed channels encode to wire bytes
    fn prepare_key(
        &self,
        key: Payload<K>,
        codec: Option<&Arc<dyn Codec<K>>>,
    ) -> Result<Payload<K>, SendError> {
        match (&self.shared.backing, key) {
            (Backing::Topic { .. }, Payload::Typed(key)) => {
                let codec = codec.unwrap_or(self.shared.serializers.key_codec());
                codec
                    .dumps(&key)
                    .map(|bytes| Payload::Raw(Some(bytes)))
                    .map_err(|e| SendError::Encode {
                        field: "key",
                        reason: e.to_string(),
                    })
            }
            (_, key) => Ok(key),
        }
    }

    fn prepare_value(
        &self,
        value: Payload<V>,
        codec: Option<&Arc<dyn Codec<V>>>,
    ) -> Result<Payload<V>, SendError> {
        match (&self.shared.backing, value) {
            (Backing::Topic { .. }, Payload::Typed(value)) => {
                let codec = codec.unwrap_or(self.shared.serializers.value_codec());
                codec
                    .dumps(&value)
                    .map(|bytes| Payload::Raw(Some(bytes)))
                    .map_err(|e| SendError::Encode {
                        field: "value",
                        reason: e.to_string(),
                    })
            }
            (_, value) => Ok(value),
        }
    }

    /// Attach to the current event unless forced, else publish now
    async fn dispatch(&self, fut: FutureMessage<K, V>, force: bool) {
        if !force {
            if let Some(current) = context::current_message() {
                match current.attach(Box::new(fut)) {
                    Ok(()) => {
                        tracing::trace!(
                            channel = %self.label(),
                            tp = %current.tp,
                            offset = current.offset,
                            "send attached to current event"
                        );
                    }
                    Err(attachment) => {
                        tracing::debug!(channel = %self.label(), "current event already released, publishing now");
                        attachment.publish().await;
                    }
                }
                return;
            }
        }
        // The outcome is delivered through the handle
        let _ = self.publish_message(fut).await;
    }

    /// Publish a future message and resolve it
    pub async fn publish_message(&self, fut: FutureMessage<K, V>) -> SendResult {
        let (message, slot) = fut.into_parts();
        let PendingMessage {
            key,
            value,
            partition,
            key_serializer,
            value_serializer,
            callback,
            ..
        } = message;

        let result = match &self.shared.backing {
            Backing::InProcess => {
                self.publish_local(key, value, key_serializer, value_serializer)
                    .await
            }
            Backing::Topic { name, producer } => {
                let key = self.prepare_key(key, key_serializer.as_ref());
                let value = self.prepare_value(value, value_serializer.as_ref());
                match (key, value) {
                    (Ok(key), Ok(value)) => {
                        producer
                            .send(name, partition, raw_bytes(key), raw_bytes(value))
                            .await
                            .map_err(|e| SendError::Transport {
                                topic: name.clone(),
                                reason: e.to_string(),
                            })
                    }
                    (Err(e), _) | (_, Err(e)) => Err(e),
                }
            }
        };

        if let Err(e) = &result {
            tracing::warn!(channel = %self.label(), error = %e, "send failed");
        }
        slot.resolve(result, callback).await
    }

    /// Queue a published record on this channel as a fresh event
    async fn publish_local(
        &self,
        key: Payload<K>,
        value: Payload<V>,
        key_codec: Option<Arc<dyn Codec<K>>>,
        value_codec: Option<Arc<dyn Codec<V>>>,
    ) -> SendResult {
        let key_codec = key_codec.unwrap_or_else(|| Arc::clone(self.shared.serializers.key_codec()));
        let value_codec =
            value_codec.unwrap_or_else(|| Arc::clone(self.shared.serializers.value_codec()));

        let (key, raw_key) = materialize(key, key_codec.as_ref(), "key").await?;
        let (value, raw_value) = materialize(value, value_codec.as_ref(), "value").await?;

        let offset = self.shared.local_offset.fetch_add(1, Ordering::SeqCst);
        let message = Message::new(TopicPartition::new(self.label(), 0), offset, raw_key, raw_value);
        let event = Event::new(key, value, Arc::new(message), Arc::new(InProcessAck));

        self.put(event)
            .await
            .map_err(|e| SendError::Rejected(e.to_string()))?;
        Ok(RecordMetadata::in_process())
    }

    // -------------------------------------------------------------------------
    // Queue access
    // -------------------------------------------------------------------------

    /// Enqueue an event directly
    pub async fn put(&self, event: Event<K, V>) -> Result<(), ChannelError> {
        if !self.is_iterator && !self.shared.config.clone_shares_queue {
            return Err(ChannelError::NotIterable(self.label()));
        }
        self.queue.put(event).await;
        Ok(())
    }

    /// Dequeue the oldest event, waiting until one is available
    pub async fn get(&self) -> Event<K, V> {
        self.queue.get().await
    }

    /// The iterator form of this channel
    pub fn iter(&self) -> Self {
        if self.is_iterator {
            self.clone()
        } else {
            self.clone_channel(Some(true))
        }
    }

    /// Advance an iterator-form channel
    pub async fn next_event(&self) -> Result<Event<K, V>, ChannelError> {
        if !self.is_iterator {
            return Err(ChannelError::NotIterator(self.label()));
        }
        Ok(self.queue.get().await)
    }

    /// Consume events as a stream; never ends on its own
    pub fn into_stream(self) -> impl Stream<Item = Event<K, V>> {
        futures::stream::unfold(self.iter(), |channel| async move {
            let event = channel.queue.get().await;
            Some((event, channel))
        })
    }

    /// Stop accepting events until [`resume_flow`](Self::resume_flow)
    pub fn suspend_flow(&self) {
        self.queue.suspend();
    }

    pub fn resume_flow(&self) {
        self.queue.resume();
    }

    pub fn is_flow_suspended(&self) -> bool {
        self.queue.is_suspended()
    }

    pub fn clear(&self) {
        self.queue.clear();
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// A typed value plus its wire form
async fn materialize<T>(
    payload: Payload<T>,
    codec: &dyn Codec<T>,
    field: &'static str,
) -> Result<(T, Option<Vec<u8>>), SendError> {
    match payload {
        Payload::Typed(value) => {
            let bytes = codec.dumps(&value).map_err(|e| SendError::Encode {
                field,
                reason: e.to_string(),
            })?;
            Ok((value, Some(bytes)))
        }
        Payload::Raw(bytes) => {
            let value = codec
                .loads(bytes.as_deref())
                .await
                .map_err(|e| SendError::Decode {
                    field,
                    reason: e.to_string(),
                })?;
            Ok((value, bytes))
        }
    }
}

fn raw_bytes<T>(payload: Payload<T>) -> Option<Vec<u8>> {
    match payload {
        Payload::Raw(bytes) => bytes,
        // prepare_* leaves no typed payloads on topic-backed channels
        Payload::Typed(_) => None,
    }
}

impl<K, V> Clone for Channel<K, V> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            is_iterator: self.is_iterator,
            queue: Arc::clone(&self.queue),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<K, V> fmt::Debug for Channel<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.id)
            .field("is_iterator", &self.is_iterator)
            .field("backing", &self.shared.backing)
            .field("queued", &self.queue.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
