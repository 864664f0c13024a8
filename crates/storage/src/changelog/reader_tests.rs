// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::changelog::{Changelog, FileChangelog};
use serde_json::json;
use tempfile::TempDir;

fn temp_changelog_path() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("counts.jsonl");
    (dir, path)
}

fn write_entries(path: &Path, count: u64) {
    let mut changelog = FileChangelog::open(path).unwrap();
    for i in 0..count {
        changelog.append("t", 0, json!(format!("k{}", i)), Some(json!(i))).unwrap();
    }
}

#[test]
fn reader_reads_all_entries() {
    let (_dir, path) = temp_changelog_path();
    write_entries(&path, 5);

    let reader = ChangelogReader::open(&path).unwrap();
    let entries: Vec<_> = reader.entries().unwrap().collect();

    assert_eq!(entries.len(), 5);
    for (i, entry_result) in entries.iter().enumerate() {
        assert_eq!(entry_result.as_ref().unwrap().sequence, i as u64);
    }
}

#[test]
fn open_fails_for_missing_file() {
    let (_dir, path) = temp_changelog_path();
    assert!(matches!(ChangelogReader::open(&path), Err(ChangelogError::Io(_))));
}

#[test]
fn missing_file_reads_as_empty_when_allowed() {
    let (_dir, path) = temp_changelog_path();
    let reader = ChangelogReader::open_or_empty(&path);
    assert!(reader.valid_entries().unwrap().is_empty());
    assert_eq!(reader.last_sequence().unwrap(), None);
}

#[test]
fn reader_skips_empty_lines() {
    let (_dir, path) = temp_changelog_path();
    let entry0 = ChangelogEntry::new(0, "t", 0, json!("a"), Some(json!(1)));
    let entry1 = ChangelogEntry::new(1, "t", 0, json!("b"), None);
    let content = format!(
        "{}\n\n{}\n\n",
        entry0.to_line().unwrap(),
        entry1.to_line().unwrap()
    );
    std::fs::write(&path, content).unwrap();

    let entries = ChangelogReader::open(&path).unwrap().valid_entries().unwrap();
    assert_eq!(entries, vec![entry0, entry1]);
}

#[test]
fn reader_stops_at_truncated_line() {
    let (_dir, path) = temp_changelog_path();
    write_entries(&path, 3);
    let mut content = std::fs::read_to_string(&path).unwrap();
    content.push_str("{\"sequence\":3,\"timest");
    std::fs::write(&path, content).unwrap();

    let reader = ChangelogReader::open(&path).unwrap();
    assert_eq!(reader.valid_entries().unwrap().len(), 3);

    let validation = reader.validate().unwrap();
    assert_eq!(validation.valid_entries, 3);
    assert_eq!(validation.last_valid_sequence, Some(2));
    assert_eq!(validation.corruption.unwrap().line, 4);
}

#[test]
fn reader_stops_at_checksum_mismatch() {
    let (_dir, path) = temp_changelog_path();
    let good = ChangelogEntry::new(0, "t", 0, json!("a"), Some(json!(1)));
    let mut bad = ChangelogEntry::new(1, "t", 0, json!("b"), Some(json!(2)));
    bad.value = Some(json!(99));
    let after = ChangelogEntry::new(2, "t", 0, json!("c"), Some(json!(3)));
    let content = format!(
        "{}\n{}\n{}\n",
        good.to_line().unwrap(),
        bad.to_line().unwrap(),
        after.to_line().unwrap()
    );
    std::fs::write(&path, content).unwrap();

    let reader = ChangelogReader::open(&path).unwrap();
    let results: Vec<_> = reader.entries().unwrap().collect();
    assert_eq!(results.len(), 2);
    assert!(matches!(results[1], Err(ChangelogError::ChecksumMismatch { line: 2 })));

    let validation = reader.validate().unwrap();
    assert_eq!(
        validation.corruption,
        Some(ChangelogCorruption {
            line: 2,
            reason: "checksum mismatch".to_string()
        })
    );
}

#[test]
fn validate_reports_length_of_readable_prefix() {
    let (_dir, path) = temp_changelog_path();
    let entry = ChangelogEntry::new(0, "t", 0, json!("a"), Some(json!(1)));
    let first = format!("{}\n", entry.to_line().unwrap());
    std::fs::write(&path, format!("{first}{{\"sequence\":1,\"timest")).unwrap();

    let validation = ChangelogReader::open(&path).unwrap().validate().unwrap();
    assert_eq!(validation.valid_entries, 1);
    assert_eq!(validation.valid_bytes, first.len() as u64);
    assert!(matches!(validation.corruption, Some(ChangelogCorruption { line: 2, .. })));
}

#[test]
fn invalid_utf8_is_corruption_not_io_error() {
    let (_dir, path) = temp_changelog_path();
    let entry = ChangelogEntry::new(0, "t", 0, json!("a"), Some(json!(1)));
    let first = format!("{}\n", entry.to_line().unwrap());
    let mut bytes = first.clone().into_bytes();
    bytes.extend_from_slice(b"{\"key\":\"\xe2\x82");
    std::fs::write(&path, bytes).unwrap();

    let validation = ChangelogReader::open(&path).unwrap().validate().unwrap();
    assert_eq!(validation.valid_entries, 1);
    assert_eq!(validation.valid_bytes, first.len() as u64);
    assert!(validation.corruption.is_some());
}
