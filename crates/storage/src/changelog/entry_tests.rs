// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

fn sample() -> ChangelogEntry {
    ChangelogEntry::new_with_timestamp(3, 1_000, "app-counts-changelog", 0, json!("k"), Some(json!(2)))
}

#[test]
fn entry_roundtrips_through_a_line() {
    let entry = sample();
    let line = entry.to_line().unwrap();
    assert!(!line.contains('\n'));

    let parsed = ChangelogEntry::from_line(&line).unwrap();
    assert_eq!(parsed, entry);
    assert!(parsed.verify());
}

#[test]
fn tampered_value_fails_verification() {
    let mut entry = sample();
    entry.value = Some(json!(3));
    assert!(!entry.verify());
}

#[test]
fn tombstone_omits_value_field() {
    let entry = ChangelogEntry::new_with_timestamp(0, 0, "t", 0, json!("k"), None);
    assert!(entry.is_tombstone());

    let line: serde_json::Value = serde_json::from_str(&entry.to_line().unwrap()).unwrap();
    assert!(line.get("value").is_none());

    let parsed = ChangelogEntry::from_line(&entry.to_line().unwrap()).unwrap();
    assert!(parsed.is_tombstone());
    assert!(parsed.verify());
}

#[test]
fn null_value_survives_a_line_round_trip() {
    let entry = ChangelogEntry::new_with_timestamp(0, 0, "t", 0, json!("k"), Some(json!(null)));
    let line = entry.to_line().unwrap();
    assert!(line.contains("\"value\":null"));

    let parsed = ChangelogEntry::from_line(&line).unwrap();
    assert!(!parsed.is_tombstone());
    assert_eq!(parsed.value, Some(serde_json::Value::Null));
    assert!(parsed.verify());
}

#[test]
fn null_value_and_tombstone_checksums_differ() {
    let tombstone = ChangelogEntry::new_with_timestamp(0, 0, "t", 0, json!("k"), None);
    let null = ChangelogEntry::new_with_timestamp(0, 0, "t", 0, json!("k"), Some(json!(null)));
    assert_ne!(tombstone.checksum, null.checksum);
}

#[test]
fn new_stamps_current_time() {
    let entry = ChangelogEntry::new(0, "t", 0, json!(1), None);
    assert!(entry.timestamp_micros > 0);
}
