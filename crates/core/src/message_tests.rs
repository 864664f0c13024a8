// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::codec::{Serializers, StrCodec};

fn pending(channel: &Channel<String, String>) -> PendingMessage<String, String> {
    PendingMessage {
        channel: channel.clone(),
        key: Payload::Typed("k".into()),
        value: Payload::Raw(None),
        partition: Some(1),
        key_serializer: None,
        value_serializer: None,
        callback: None,
    }
}

#[tokio::test]
async fn handle_resolves_with_slot_result() {
    let channel = Channel::new(Serializers::new(StrCodec, StrCodec));
    let (fut, mut handle) = FutureMessage::new(pending(&channel));
    assert!(handle.try_result().is_none());

    let (_, slot) = fut.into_parts();
    let resolved = slot.resolve(Ok(RecordMetadata::in_process()), None).await;
    assert!(resolved.is_ok());
    assert_eq!(handle.await, Ok(RecordMetadata::in_process()));
}

#[tokio::test]
async fn dropped_future_message_resolves_as_dropped() {
    let channel = Channel::new(Serializers::new(StrCodec, StrCodec));
    let (fut, handle) = FutureMessage::new(pending(&channel));
    drop(fut);
    assert_eq!(handle.await, Err(SendError::Dropped));
}

#[tokio::test]
async fn callback_runs_even_when_handle_is_gone() {
    let channel = Channel::new(Serializers::new(StrCodec, StrCodec));
    let (fut, handle) = FutureMessage::new(pending(&channel));
    drop(handle);

    let (tx, rx) = oneshot::channel();
    let options = SendOptions::<String, String>::new().callback(move |result| async move {
        let _ = tx.send(result.is_ok());
    });
    let (_, slot) = fut.into_parts();
    let _ = slot
        .resolve(Ok(RecordMetadata::in_process()), options.callback)
        .await;

    assert_eq!(rx.await, Ok(true));
}

#[tokio::test]
async fn failed_handle_carries_error_after_callback() {
    let (tx, rx) = oneshot::channel();
    let options = SendOptions::<String, String>::new().callback(move |result| async move {
        let _ = tx.send(result);
    });

    let mut handle = SendHandle::failed(SendError::Rejected("closed".into()), options.callback).await;

    assert_eq!(rx.await, Ok(Err(SendError::Rejected("closed".into()))));
    assert_eq!(
        handle.try_result(),
        Some(Err(SendError::Rejected("closed".into())))
    );
}

#[test]
fn options_builder_sets_fields() {
    let options = SendOptions::<String, String>::new()
        .partition(4)
        .key_serializer(StrCodec)
        .force();
    assert_eq!(options.partition, Some(4));
    assert!(options.key_serializer.is_some());
    assert!(options.value_serializer.is_none());
    assert!(options.force);
}

#[test]
fn raw_payload_debug_shows_length_only() {
    let payload: Payload<String> = Payload::Raw(Some(vec![1, 2, 3]));
    assert_eq!(format!("{:?}", payload), "Raw(Some(3) bytes)");
}

#[test]
fn attachment_describes_its_target() {
    let channel = Channel::new(Serializers::new(StrCodec, StrCodec));
    let (fut, _handle) = FutureMessage::new(pending(&channel));
    assert_eq!(fut.describe(), format!("send to {}", channel.label()));
}
