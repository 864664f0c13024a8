// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn sample() -> Message {
    Message::new(
        TopicPartition::new("orders", 2),
        17,
        Some(b"k".to_vec()),
        Some(b"v".to_vec()),
    )
}

#[test]
fn new_message_holds_one_reference() {
    let message = sample();
    assert_eq!(message.refcount(), 1);
    assert!(!message.is_acked());
}

#[test]
fn decref_reports_remaining_references() {
    let message = sample().with_refcount(3);
    assert_eq!(message.decref(), Some(2));
    assert_eq!(message.decref(), Some(1));
    assert_eq!(message.decref(), Some(0));
}

#[test]
fn decref_past_zero_does_not_wrap() {
    let message = sample();
    assert_eq!(message.decref(), Some(0));
    assert_eq!(message.decref(), None);
    assert_eq!(message.refcount(), 0);
}

#[test]
fn incref_adds_a_reference() {
    let message = sample();
    message.incref();
    assert_eq!(message.refcount(), 2);
}

#[test]
fn mark_acked_latches_once() {
    let message = sample();
    assert!(message.mark_acked());
    assert!(!message.mark_acked());
    assert!(message.is_acked());
}

#[test]
fn topic_partition_display() {
    assert_eq!(TopicPartition::new("orders", 2).to_string(), "orders:2");
}

#[test]
fn in_process_metadata_is_empty() {
    let meta = RecordMetadata::in_process();
    assert!(meta.is_in_process());
    assert_eq!(meta.partition, None);
    assert_eq!(meta.timestamp_ms, None);
}

#[test]
fn debug_hides_payload_bytes() {
    let rendered = format!("{:?}", sample());
    assert!(rendered.contains("offset: 17"));
    assert!(rendered.contains("refcount: 1"));
}
