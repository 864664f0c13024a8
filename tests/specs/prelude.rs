//! Shared fixtures for the behavioral specs

#![allow(dead_code)]

pub use rill_adapters::{FakeTransport, TransportCall};
pub use rill_core::{
    Channel, DecodeErrorPolicy, Event, Field, Message, Payload, SendOptions, Serializers,
    StrCodec, TopicPartition,
};
pub use std::sync::Arc;

pub type SpecError = Box<dyn std::error::Error + Send + Sync>;

/// Input channel reading UTF-8 keys and values from the `input` topic
pub fn input_channel(transport: &FakeTransport, capacity: usize) -> Channel<String, String> {
    Channel::builder(Serializers::new(StrCodec, StrCodec))
        .capacity(capacity)
        .acknowledger(Arc::new(transport.clone()))
        .build()
}

/// Output channel publishing JSON to `topic`
pub fn output_channel<V>(transport: &FakeTransport, topic: &str) -> Channel<String, V>
where
    V: serde::Serialize + serde::de::DeserializeOwned + Clone + std::fmt::Debug + Send + Sync + 'static,
{
    Channel::builder(Serializers::json())
        .topic(topic, Arc::new(transport.clone()))
        .build()
}

pub fn record(offset: u64, key: &str, value: &str) -> Arc<Message> {
    Arc::new(Message::new(
        TopicPartition::new("input", 0),
        offset,
        Some(key.as_bytes().to_vec()),
        Some(value.as_bytes().to_vec()),
    ))
}

/// Compact view of transport traffic: "send:<topic>" and "ack:<offset>"
pub fn traffic(transport: &FakeTransport) -> Vec<String> {
    transport
        .calls()
        .into_iter()
        .map(|call| match call {
            TransportCall::Send { topic, .. } => format!("send:{}", topic),
            TransportCall::Ack { offset, .. } => format!("ack:{}", offset),
        })
        .collect()
}
