// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! rill-core: event-delivery pipeline for the Rill stream processor
//!
//! This crate provides:
//! - Raw transport records with explicit reference counting
//! - Channels that decode records into events under backpressure
//! - Events with scoped acknowledgment and attached (co-committed) sends
//! - Window policies mapping timestamps to buckets
//! - Boundary traits for the transport and for table sensors

pub mod clock;
pub mod codec;
pub mod context;
pub mod record;
pub mod sensor;
pub mod transport;
pub mod window;

// Pipeline (order matters for dependencies)
pub mod queue;
pub mod message;
pub mod event;
pub mod channel;

#[cfg(test)]
mod test_support;

// Re-exports
pub use channel::{
    Backing, Channel, ChannelBuilder, ChannelConfig, ChannelError, ChannelHooks, Data,
    DecodeErrorPolicy, LogDecodeErrors,
};
pub use clock::{Clock, FakeClock, SystemClock};
pub use codec::{Codec, CodecError, DecodeError, JsonCodec, RawCodec, Serializers, StrCodec};
pub use event::{Event, Field};
pub use message::{
    Attachment, FutureMessage, MessageSentCallback, Payload, PendingMessage, SendError,
    SendHandle, SendOptions, SendResult,
};
pub use queue::FlowControlQueue;
pub use record::{Message, RecordMetadata, TopicPartition};
pub use sensor::TableSensor;
pub use transport::{Acknowledger, InProcessAck, Producer, TransportError};
pub use window::{Timestamp, WindowError, WindowPolicy, WindowRange, WindowSpec};
