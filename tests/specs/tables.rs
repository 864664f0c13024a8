//! Table specs
//!
//! Tables write through a changelog; replaying that changelog after a
//! restart rebuilds the same state.

use crate::prelude::*;
use rill_core::FakeClock;
use rill_storage::{ChangelogReader, FileChangelog, Table, WindowWrapper};
use similar_asserts::assert_eq;
use std::time::Duration;

fn page_views(path: &std::path::Path, clock: &FakeClock) -> WindowWrapper<String, u64> {
    Table::builder("site", "views")
        .changelog(FileChangelog::open(path).unwrap())
        .default(|| 0)
        .clock(Arc::new(clock.clone()))
        .build()
        .hopping(
            Duration::from_secs(60),
            Duration::from_secs(30),
            Some(Duration::from_secs(600)),
        )
        .unwrap()
}

#[test]
fn windowed_table_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("views.changelog");
    let clock = FakeClock::at_millis(45_000);

    let before = {
        let mut views = page_views(&path, &clock);
        views.update("/home".into(), |n| n + 1).unwrap();
        views.update("/home".into(), |n| n + 1).unwrap();
        views.update_at("/about".into(), |n| n + 1, 70_000).unwrap();
        views.table().items()
    };

    let mut restarted = page_views(&path, &clock);
    assert!(restarted.table().is_empty());
    restarted.table_mut().restore().unwrap();

    assert_eq!(restarted.table().items(), before);
    assert_eq!(restarted.current(&"/home".into()).unwrap(), 2);
    assert_eq!(restarted.values(&"/about".into()).len(), 2);
}

#[test]
fn changelog_file_is_valid_json_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("views.changelog");
    let clock = FakeClock::at_millis(0);

    let mut views = page_views(&path, &clock);
    views.set("/home".into(), 5).unwrap();
    views.table_mut().del(&("/home".to_string(), 0)).unwrap();

    let validation = ChangelogReader::open(&path).unwrap().validate().unwrap();
    assert!(validation.corruption.is_none());
    // timestamp 0 falls in buckets -1 and 0, then one tombstone
    assert_eq!(validation.valid_entries, 3);

    let entries = ChangelogReader::open(&path).unwrap().valid_entries().unwrap();
    assert!(entries.iter().all(|e| e.topic == "site-views-changelog"));
    assert!(entries[2].is_tombstone());
}

#[tokio::test]
async fn table_updates_follow_event_timestamps() {
    let transport = FakeTransport::new();
    let input = input_channel(&transport, 4);
    let clock = FakeClock::at_millis(1_000_000);
    let mut clicks: WindowWrapper<String, u64> = Table::builder("site", "clicks")
        .default(|| 0)
        .clock(Arc::new(clock.clone()))
        .build()
        .tumbling(Duration::from_secs(10), None)
        .unwrap();

    for (offset, ts) in [(0u64, 1_000i64), (1, 2_000), (2, 15_000)] {
        let message = Message::new(
            TopicPartition::new("input", 0),
            offset,
            Some(b"user".to_vec()),
            Some(b"click".to_vec()),
        )
        .with_timestamp(ts);
        input.deliver(Arc::new(message)).await;

        let event = input.get().await;
        let table = &mut clicks;
        event
            .scope(move |ev| async move {
                table.update(ev.key().clone(), |n| n + 1)?;
                Ok::<_, SpecError>(())
            })
            .await
            .unwrap();
    }

    let counts: Vec<u64> = clicks
        .values(&"user".into())
        .into_iter()
        .map(|(_, count)| count)
        .collect();
    assert_eq!(counts, vec![2, 1]);
    assert_eq!(transport.acks().len(), 3);
}
