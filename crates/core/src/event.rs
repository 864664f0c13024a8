// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Decoded events
//!
//! An [`Event`] is the application-facing unit produced by a channel. It
//! shares its source [`Message`] with any other events decoded from the
//! same record; the transport is acknowledged when the last of them calls
//! [`Event::ack`], after every send attached to the record has been
//! published.

use crate::channel::{Channel, ChannelError, Data};
use crate::context;
use crate::message::{Payload, SendHandle, SendOptions};
use crate::record::Message;
use crate::transport::{Acknowledger, TransportError};
use futures::FutureExt;
use std::any::{type_name, Any};
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Source of an outbound key or value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Field<T> {
    Explicit(T),
    /// This event's decoded key or value
    #[default]
    InheritDecoded,
    /// The source record's raw bytes, published without re-encoding
    InheritRaw,
}

/// A decoded record
pub struct Event<K, V> {
    key: K,
    value: V,
    message: Arc<Message>,
    acker: Arc<dyn Acknowledger>,
}

impl<K, V> Event<K, V> {
    pub fn new(key: K, value: V, message: Arc<Message>, acker: Arc<dyn Acknowledger>) -> Self {
        Self {
            key,
            value,
            message,
            acker,
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    /// The source record
    pub fn message(&self) -> &Arc<Message> {
        &self.message
    }

    /// The record of the event being processed on this task, if any
    pub fn current_message() -> Option<Arc<Message>> {
        context::current_message()
    }
}

impl<K: Data, V: Data> Event<K, V> {
    /// Send a record derived from this event
    ///
    /// `InheritDecoded` fields reuse this event's key or value and fail
    /// with [`ChannelError::InheritMismatch`] when the target channel has
    /// different types.
    pub async fn send<K2: Data, V2: Data>(
        &self,
        channel: &Channel<K2, V2>,
        key: Field<K2>,
        value: Field<V2>,
        options: SendOptions<K2, V2>,
    ) -> Result<SendHandle, ChannelError> {
        let key = resolve(key, &self.key, &self.message.key, "key")?;
        let value = resolve(value, &self.value, &self.message.value, "value")?;
        Ok(channel.send(key, value, options).await)
    }

    /// Republish the source record's raw key and value
    pub async fn forward<K2: Data, V2: Data>(
        &self,
        channel: &Channel<K2, V2>,
        options: SendOptions<K2, V2>,
    ) -> Result<SendHandle, ChannelError> {
        self.send(channel, Field::InheritRaw, Field::InheritRaw, options)
            .await
    }

    /// Release this event's reference to its source record
    ///
    /// Returns true when this call acknowledged the record. Calls beyond
    /// the record's reference count are logged and ignored.
    pub async fn ack(&self) -> Result<bool, TransportError> {
        release(&self.message, self.acker.as_ref()).await
    }

    /// Process this event and acknowledge it on every exit path
    ///
    /// While `f` runs, the event is the current event for this task, so
    /// unforced sends attach to it. The ack happens exactly once whether
    /// `f` succeeds, fails or panics; a panic resumes after the ack. The
    /// panic path needs unwinding, so builds must not set `panic = "abort"`.
    pub async fn scope<T, E, F, Fut>(self, f: F) -> Result<T, E>
    where
        F: FnOnce(Arc<Self>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<TransportError>,
    {
        let event = Arc::new(self);
        let message = Arc::clone(&event.message);
        let outcome =
            context::scope(message, AssertUnwindSafe(f(Arc::clone(&event))).catch_unwind()).await;
        let acked = event.ack().await;

        match outcome {
            Ok(Ok(value)) => {
                acked?;
                Ok(value)
            }
            Ok(Err(e)) => {
                if let Err(ack_error) = acked {
                    tracing::warn!(error = %ack_error, "ack failed after processing error");
                }
                Err(e)
            }
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

/// Drop one reference to `message`, acknowledging it at zero
///
/// Attached sends are published in attach order before the transport ack.
pub(crate) async fn release(
    message: &Arc<Message>,
    acker: &dyn Acknowledger,
) -> Result<bool, TransportError> {
    match message.decref() {
        None => {
            tracing::warn!(tp = %message.tp, offset = message.offset, "ack beyond reference count ignored");
            Ok(false)
        }
        Some(remaining) if remaining > 0 => {
            tracing::trace!(tp = %message.tp, offset = message.offset, remaining, "reference released");
            Ok(false)
        }
        Some(_) => {
            let attachments = message.take_attachments();
            if !attachments.is_empty() {
                tracing::debug!(
                    tp = %message.tp,
                    offset = message.offset,
                    count = attachments.len(),
                    "flushing attached sends"
                );
            }
            for attachment in attachments {
                attachment.publish().await;
            }
            if !message.mark_acked() {
                return Ok(false);
            }
            acker.ack(message).await?;
            tracing::trace!(tp = %message.tp, offset = message.offset, "acknowledged");
            Ok(true)
        }
    }
}

fn resolve<T: Data, S: Data>(
    field: Field<T>,
    decoded: &S,
    raw: &Option<Vec<u8>>,
    name: &'static str,
) -> Result<Payload<T>, ChannelError> {
    match field {
        Field::Explicit(value) => Ok(Payload::Typed(value)),
        Field::InheritRaw => Ok(Payload::Raw(raw.clone())),
        Field::InheritDecoded => (decoded as &dyn Any)
            .downcast_ref::<T>()
            .cloned()
            .map(Payload::Typed)
            .ok_or(ChannelError::InheritMismatch {
                field: name,
                expected: type_name::<T>(),
            }),
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Event<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("tp", &self.message.tp)
            .field("offset", &self.message.offset)
            .finish()
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
