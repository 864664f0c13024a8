// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Changelog reader for iterating and validating entries
//!
//! Invalid entries (checksum mismatch or parse errors) mark the truncation
//! point; nothing after them is trusted.

use super::{ChangelogEntry, ChangelogError};
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Reader over a changelog file
pub struct ChangelogReader {
    path: PathBuf,
}

impl ChangelogReader {
    /// Open a changelog file for reading
    pub fn open(path: &Path) -> Result<Self, ChangelogError> {
        if !path.exists() {
            return Err(ChangelogError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("changelog not found: {}", path.display()),
            )));
        }
        Ok(Self::open_or_empty(path))
    }

    /// Create a reader that treats a missing file as empty
    pub fn open_or_empty(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Iterate over entries; the first error ends the valid prefix
    pub fn entries(&self) -> Result<ChangelogEntryIter, ChangelogError> {
        ChangelogEntryIter::new(&self.path)
    }

    /// Every entry before the first corrupt line
    pub fn valid_entries(&self) -> Result<Vec<ChangelogEntry>, ChangelogError> {
        let mut valid = Vec::new();
        for entry_result in self.entries()? {
            match entry_result {
                Ok(entry) => valid.push(entry),
                Err(ChangelogError::Io(e)) => return Err(ChangelogError::Io(e)),
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "changelog truncated at corrupt entry");
                    break;
                }
            }
        }
        Ok(valid)
    }

    /// Get the last valid sequence number
    pub fn last_sequence(&self) -> Result<Option<u64>, ChangelogError> {
        Ok(self.validate()?.last_valid_sequence)
    }

    /// Validate a changelog file and describe its contents
    pub fn validate(&self) -> Result<ChangelogValidation, ChangelogError> {
        let mut valid_entries = 0u64;
        let mut last_valid_sequence = None;
        let mut corruption = None;

        let mut entries = self.entries()?;
        for entry_result in entries.by_ref() {
            match entry_result {
                Ok(entry) => {
                    valid_entries += 1;
                    last_valid_sequence = Some(entry.sequence);
                }
                Err(ChangelogError::Corrupted { line, reason }) => {
                    corruption = Some(ChangelogCorruption { line, reason });
                    break;
                }
                Err(ChangelogError::ChecksumMismatch { line }) => {
                    corruption = Some(ChangelogCorruption {
                        line,
                        reason: "checksum mismatch".to_string(),
                    });
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(ChangelogValidation {
            valid_entries,
            last_valid_sequence,
            valid_bytes: entries.last_valid_position(),
            corruption,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Iterator over changelog entries
pub struct ChangelogEntryIter {
    reader: Option<BufReader<File>>,
    line_number: u64,
    failed: bool,
    /// Byte offset just past the last valid entry
    last_valid_position: u64,
    /// Byte offset of the next unread line
    current_position: u64,
}

impl ChangelogEntryIter {
    fn new(path: &Path) -> Result<Self, ChangelogError> {
        let reader = if path.exists() {
            Some(BufReader::new(File::open(path)?))
        } else {
            None
        };
        Ok(Self {
            reader,
            line_number: 0,
            failed: false,
            last_valid_position: 0,
            current_position: 0,
        })
    }

    /// Byte offset just past the last valid entry read so far
    pub fn last_valid_position(&self) -> u64 {
        self.last_valid_position
    }
}

impl Iterator for ChangelogEntryIter {
    type Item = Result<ChangelogEntry, ChangelogError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let reader = self.reader.as_mut()?;

        loop {
            let mut bytes = Vec::new();
            let result = match reader.read_until(b'\n', &mut bytes) {
                Ok(0) => return None,
                Ok(bytes_read) => {
                    self.line_number += 1;
                    self.current_position += bytes_read as u64;
                    // A torn write can split a multi-byte character
                    let line = match std::str::from_utf8(&bytes) {
                        Ok(line) => line,
                        Err(e) => {
                            self.failed = true;
                            return Some(Err(ChangelogError::Corrupted {
                                line: self.line_number,
                                reason: e.to_string(),
                            }));
                        }
                    };
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    match ChangelogEntry::from_line(trimmed) {
                        Ok(entry) if entry.verify() => {
                            self.last_valid_position = self.current_position;
                            Ok(entry)
                        }
                        Ok(_) => Err(ChangelogError::ChecksumMismatch {
                            line: self.line_number,
                        }),
                        Err(e) => Err(ChangelogError::Corrupted {
                            line: self.line_number,
                            reason: e.to_string(),
                        }),
                    }
                }
                Err(e) => Err(ChangelogError::Io(e)),
            };
            self.failed = result.is_err();
            return Some(result);
        }
    }
}

/// Summary of a changelog file
#[derive(Debug, Serialize)]
pub struct ChangelogValidation {
    pub valid_entries: u64,
    pub last_valid_sequence: Option<u64>,
    /// Length of the readable prefix of the file
    pub valid_bytes: u64,
    pub corruption: Option<ChangelogCorruption>,
}

/// Where and why a changelog file stops being readable
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangelogCorruption {
    pub line: u64,
    pub reason: String,
}

#[cfg(test)]
#[path = "reader_tests.rs"]
mod tests;
