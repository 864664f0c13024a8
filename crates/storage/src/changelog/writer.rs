// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable changelog file
//!
//! Appends are fsync'd before returning, so an entry reported as appended
//! survives a crash. Opening a file cuts off anything after its last valid
//! entry, so a torn tail never swallows later appends.

use super::reader::ChangelogReader;
use super::{Changelog, ChangelogEntry, ChangelogError};
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Append-only JSONL changelog on disk
pub struct FileChangelog {
    path: PathBuf,
    file: File,
    next_sequence: u64,
    bytes_written: u64,
}

impl FileChangelog {
    /// Open or create a changelog file
    ///
    /// If the file exists, scans it to find the next sequence number and
    /// truncates it to the end of its last valid entry.
    pub fn open(path: &Path) -> Result<Self, ChangelogError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let validation = ChangelogReader::open_or_empty(path).validate()?;
        let next_sequence = validation
            .last_valid_sequence
            .map(|s| s + 1)
            .unwrap_or(0);

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;
        Self::repair_tail(&mut file, path, validation.valid_bytes)?;

        tracing::debug!(path = %path.display(), next_sequence, "opened changelog");
        Ok(Self {
            path: path.to_path_buf(),
            file,
            next_sequence,
            bytes_written: 0,
        })
    }

    /// Drop bytes past `valid_bytes` and end the last entry with a newline
    fn repair_tail(file: &mut File, path: &Path, valid_bytes: u64) -> Result<(), ChangelogError> {
        let len = file.metadata()?.len();
        let mut repaired = false;
        if len > valid_bytes {
            tracing::warn!(
                path = %path.display(),
                valid_bytes,
                dropped_bytes = len - valid_bytes,
                "truncating changelog after last valid entry"
            );
            file.set_len(valid_bytes)?;
            repaired = true;
        }

        if valid_bytes > 0 {
            let mut last = [0u8; 1];
            file.seek(SeekFrom::Start(valid_bytes - 1))?;
            file.read_exact(&mut last)?;
            if last[0] != b'\n' {
                file.write_all(b"\n")?;
                repaired = true;
            }
        }

        if repaired {
            file.sync_all()?;
        }
        Ok(())
    }

    fn write_entry(&mut self, entry: &ChangelogEntry) -> Result<(), ChangelogError> {
        let line = entry.to_line()?;
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;

        // Critical: sync to ensure durability before returning
        self.file.sync_all()?;

        self.bytes_written += line.len() as u64 + 1;
        Ok(())
    }

    /// Append with a specific timestamp (for testing)
    pub fn append_with_timestamp(
        &mut self,
        topic: &str,
        partition: u32,
        key: Value,
        value: Option<Value>,
        timestamp_micros: u64,
    ) -> Result<u64, ChangelogError> {
        let sequence = self.next_sequence;
        let entry =
            ChangelogEntry::new_with_timestamp(sequence, timestamp_micros, topic, partition, key, value);
        self.write_entry(&entry)?;
        self.next_sequence += 1;
        Ok(sequence)
    }

    /// Get current sequence number (next to be assigned)
    pub fn sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Get bytes written since open
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Changelog for FileChangelog {
    fn append(
        &mut self,
        topic: &str,
        partition: u32,
        key: Value,
        value: Option<Value>,
    ) -> Result<u64, ChangelogError> {
        let sequence = self.next_sequence;
        let entry = ChangelogEntry::new(sequence, topic, partition, key, value);
        self.write_entry(&entry)?;
        // Only advance once the entry is durable
        self.next_sequence += 1;
        Ok(sequence)
    }

    fn entries(&self) -> Result<Vec<ChangelogEntry>, ChangelogError> {
        ChangelogReader::open_or_empty(&self.path).valid_entries()
    }
}

#[cfg(test)]
#[path = "writer_tests.rs"]
mod tests;
