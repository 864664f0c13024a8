// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `rill replay <changelog>` - Rebuild a table from its changelog and print it

use crate::config::Config;
use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use rill_storage::{ChangelogEntry, ChangelogReader, ChangelogTopic, MemoryStore, Store};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Args)]
pub struct ReplayArgs {
    /// Changelog file (JSON lines)
    pub changelog: PathBuf,

    /// Application id (defaults to the config's app_id)
    #[arg(long)]
    pub app_id: Option<String>,

    /// Only replay this table's changelog topic
    #[arg(long)]
    pub table: Option<String>,

    /// Title printed above the table
    #[arg(long)]
    pub title: Option<String>,

    /// Column to sort rows by
    #[arg(long, value_enum, default_value_t = SortBy::Key)]
    pub sort: SortBy,

    /// Reverse the sort order
    #[arg(long)]
    pub reverse: bool,

    /// Keep keys whose configured table TTL has lapsed
    #[arg(long)]
    pub include_expired: bool,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortBy {
    Key,
    Value,
}

/// A replayed table, ready to print
#[derive(Debug, Serialize)]
pub struct Snapshot {
    pub title: String,
    pub entries: usize,
    /// Keys hidden because their TTL lapsed
    pub expired: usize,
    pub rows: Vec<Row>,
}

/// Hide keys whose last write is older than `ttl` at `now_micros`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiry {
    pub ttl: Duration,
    pub now_micros: u64,
}

impl Expiry {
    fn lapsed(&self, written_micros: u64) -> bool {
        let ttl = u64::try_from(self.ttl.as_micros()).unwrap_or(u64::MAX);
        written_micros.saturating_add(ttl) <= self.now_micros
    }
}

#[derive(Debug, Serialize)]
pub struct Row {
    pub key: String,
    pub value: Value,
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| vec![row.key.clone(), render_value(&row.value)])
            .collect();
        write!(
            f,
            "{}",
            output::render_table(&self.title, &["Key", "Value"], &rows).trim_end()
        )
    }
}

pub fn replay(args: ReplayArgs, config: &Config) -> Result<()> {
    let table = args.table.as_deref().or(config.table_name());
    let app_id = args.app_id.as_deref().unwrap_or(config.app_id());
    let topic = table.map(|t| ChangelogTopic::for_table(app_id, t).name);

    let entries = ChangelogReader::open(&args.changelog)
        .and_then(|reader| reader.valid_entries())
        .with_context(|| format!("cannot read changelog {}", args.changelog.display()))?;

    // The TTL belongs to the configured table only
    let expiry = config
        .table
        .as_ref()
        .filter(|configured| table == Some(configured.name.as_str()) && !args.include_expired)
        .and_then(|configured| configured.ttl)
        .map(|ttl| Expiry {
            ttl,
            now_micros: now_micros(),
        });

    let title = args
        .title
        .or_else(|| table.map(str::to_string))
        .unwrap_or_else(|| "changelog".to_string());
    let snapshot = build_snapshot(
        title,
        &entries,
        topic.as_deref(),
        expiry,
        args.sort,
        args.reverse,
    )?;
    tracing::debug!(
        entries = snapshot.entries,
        rows = snapshot.rows.len(),
        expired = snapshot.expired,
        "replayed"
    );

    output::print(&snapshot, args.output)
}

/// Replay `entries` into a fresh store
///
/// With a topic, entries for other topics are skipped. With an expiry,
/// keys last written more than the TTL ago are left out. Keys that are not
/// JSON strings are shown in their JSON form.
pub fn build_snapshot(
    title: String,
    entries: &[ChangelogEntry],
    topic: Option<&str>,
    expiry: Option<Expiry>,
    sort: SortBy,
    reverse: bool,
) -> Result<Snapshot> {
    let selected: Vec<ChangelogEntry> = entries
        .iter()
        .filter(|entry| topic.map_or(true, |t| entry.topic == t))
        .cloned()
        .collect();

    let mut store = MemoryStore::<String, Value>::new();
    store.apply_changelog_batch(&selected, &key_text, &|raw| Ok(raw.clone()))?;

    let mut written: HashMap<String, u64> = HashMap::new();
    for entry in &selected {
        if let Ok(key) = key_text(&entry.key) {
            written.insert(key, entry.timestamp_micros);
        }
    }

    let mut expired = 0;
    let mut rows: Vec<Row> = Vec::new();
    for (key, value) in store.items() {
        let lapsed = match (expiry, written.get(&key)) {
            (Some(expiry), Some(&at)) => expiry.lapsed(at),
            _ => false,
        };
        if lapsed {
            expired += 1;
        } else {
            rows.push(Row { key, value });
        }
    }
    if sort == SortBy::Value {
        rows.sort_by_cached_key(|row| render_value(&row.value));
    }
    if reverse {
        rows.reverse();
    }

    Ok(Snapshot {
        title,
        entries: selected.len(),
        expired,
        rows,
    })
}

fn now_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_micros()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

fn key_text(raw: &Value) -> Result<String, String> {
    Ok(match raw {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "replay_tests.rs"]
mod tests;
