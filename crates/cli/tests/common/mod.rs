// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test utilities for CLI integration tests.

#![allow(dead_code)]

use assert_cmd::Command;
use rill_storage::{Changelog, FileChangelog};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A scratch directory holding changelogs and config for one test
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Append `(key, value)` mutations for `topic` to a changelog file
    pub fn changelog(&self, name: &str, topic: &str, entries: &[(Value, Option<Value>)]) -> PathBuf {
        let path = self.dir.path().join(name);
        let mut changelog = FileChangelog::open(&path).expect("Failed to open changelog");
        for (key, value) in entries {
            changelog
                .append(topic, 0, key.clone(), value.clone())
                .expect("Failed to append");
        }
        path
    }

    pub fn file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }

    /// `rill` running in this workspace with logs kept quiet
    pub fn rill(&self) -> Command {
        let mut cmd = Command::cargo_bin("rill").expect("rill binary not built");
        cmd.current_dir(self.dir.path()).env("RUST_LOG", "warn");
        cmd
    }
}

pub fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
