//! Channel and event specs
//!
//! Records flow in through a channel, are processed inside an event scope,
//! and produce sends that reach the transport before the source record is
//! acknowledged.

use crate::prelude::*;
use rill_core::SendError;
use rill_storage::{MemoryChangelog, Table};

#[tokio::test]
async fn word_count_publishes_before_acknowledging() {
    let transport = FakeTransport::new();
    let input = input_channel(&transport, 8);
    let counts_topic = output_channel::<u64>(&transport, "counts");
    let mut counts: Table<String, u64> = Table::builder("wc", "counts")
        .default(|| 0)
        .changelog(MemoryChangelog::new())
        .build();

    for (offset, word) in ["a", "b", "a"].into_iter().enumerate() {
        input.deliver(record(offset as u64, word, "")).await;
    }

    let mut handles = Vec::new();
    for _ in 0..3 {
        let event = input.get().await;
        let table = &mut counts;
        let topic = &counts_topic;
        let handle = event
            .scope(move |ev| async move {
                let word = ev.key().clone();
                let count = table.update(word.clone(), |n| n + 1)?;
                let handle = ev
                    .send(topic, Field::Explicit(word), Field::Explicit(count), SendOptions::new())
                    .await?;
                // attached: nothing is published until the scope ends
                Ok::<_, SpecError>(handle)
            })
            .await
            .unwrap();
        handles.push(handle);
    }

    for handle in handles {
        assert!(handle.await.is_ok());
    }
    assert_eq!(
        traffic(&transport),
        vec!["send:counts", "ack:0", "send:counts", "ack:1", "send:counts", "ack:2"]
    );
    let published: Vec<String> = transport
        .sent_to("counts")
        .iter()
        .map(|r| String::from_utf8(r.value.clone().unwrap()).unwrap())
        .collect();
    assert_eq!(published, vec!["1", "1", "2"]);
    assert_eq!(counts.items(), vec![("a".into(), 2), ("b".into(), 1)]);
}

#[tokio::test]
async fn shared_record_is_acknowledged_once_after_every_consumer() {
    let transport = FakeTransport::new();
    let left = input_channel(&transport, 4);
    let right = input_channel(&transport, 4);
    let out = output_channel::<String>(&transport, "audit");

    let message = Arc::new(
        Message::new(
            TopicPartition::new("input", 0),
            9,
            Some(b"k".to_vec()),
            Some(b"v".to_vec()),
        )
        .with_refcount(2),
    );
    left.deliver(Arc::clone(&message)).await;
    right.deliver(message).await;

    let first = left.get().await;
    let second = right.get().await;

    let h1 = first
        .scope(|ev| async move {
            Ok::<_, SpecError>(ev.forward(&out, SendOptions::new()).await?)
        })
        .await
        .unwrap();
    assert_eq!(traffic(&transport), Vec::<String>::new());

    let out2 = output_channel::<String>(&transport, "audit");
    let h2 = second
        .scope(|ev| async move {
            Ok::<_, SpecError>(ev.forward(&out2, SendOptions::new()).await?)
        })
        .await
        .unwrap();

    assert!(h1.await.is_ok() && h2.await.is_ok());
    assert_eq!(traffic(&transport), vec!["send:audit", "send:audit", "ack:9"]);
    // forwarded bytes are the source record's, unchanged
    assert_eq!(transport.sent_to("audit")[0].value, Some(b"v".to_vec()));
}

#[tokio::test]
async fn failed_send_resolves_handle_and_still_acknowledges() {
    let transport = FakeTransport::new();
    transport.fail_sends("broker unavailable");
    let input = input_channel(&transport, 1);
    let out = output_channel::<String>(&transport, "out");

    input.deliver(record(0, "k", "v")).await;
    let event = input.get().await;
    let handle = event
        .scope(|ev| async move {
            Ok::<_, SpecError>(
                ev.send(
                    &out,
                    Field::InheritDecoded,
                    Field::InheritDecoded,
                    SendOptions::new(),
                )
                .await?,
            )
        })
        .await
        .unwrap();

    match handle.await {
        Err(SendError::Transport { topic, reason }) => {
            assert_eq!(topic, "out");
            assert!(reason.contains("broker unavailable"), "reason: {}", reason);
        }
        other => panic!("expected transport failure, got {:?}", other),
    }
    assert_eq!(transport.acks(), vec![(TopicPartition::new("input", 0), 0)]);
}

#[tokio::test]
async fn processing_error_still_acknowledges() {
    let transport = FakeTransport::new();
    let input = input_channel(&transport, 1);

    input.deliver(record(3, "k", "v")).await;
    let event = input.get().await;
    let result: Result<(), SpecError> = event
        .scope(|_ev| async { Err("handler failed".into()) })
        .await;

    assert!(result.is_err());
    assert_eq!(traffic(&transport), vec!["ack:3"]);
}

#[tokio::test]
async fn undecodable_record_is_skipped_and_acknowledged() {
    let transport = FakeTransport::new();
    let input = input_channel(&transport, 2);

    let bad = Arc::new(Message::new(
        TopicPartition::new("input", 0),
        0,
        Some(vec![0xff, 0xfe]),
        Some(b"v".to_vec()),
    ));
    input.deliver(bad).await;
    input.deliver(record(1, "k", "v")).await;

    assert_eq!(input.len(), 1);
    assert_eq!(input.get().await.message().offset, 1);
    assert_eq!(traffic(&transport), vec!["ack:0"]);
}

#[tokio::test]
async fn held_undecodable_record_is_not_acknowledged() {
    let transport = FakeTransport::new();
    let input: Channel<String, String> = Channel::builder(Serializers::new(StrCodec, StrCodec))
        .decode_error_policy(DecodeErrorPolicy::Hold)
        .acknowledger(Arc::new(transport.clone()))
        .build();

    input
        .deliver(Arc::new(Message::new(
            TopicPartition::new("input", 0),
            0,
            None,
            None,
        )))
        .await;

    assert!(input.is_empty());
    assert!(transport.calls().is_empty());
}
