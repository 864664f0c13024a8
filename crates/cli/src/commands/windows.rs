// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `rill windows <timestamp>` - Show the window buckets containing a timestamp

use crate::config::{Config, WindowConfig};
use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use clap::Args;
use humantime_serde::re::humantime;
use rill_core::{Timestamp, WindowPolicy};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

#[derive(Args)]
pub struct WindowsArgs {
    /// Timestamp in milliseconds since the Unix epoch
    #[arg(allow_negative_numbers = true)]
    pub timestamp: Timestamp,

    /// Window size (e.g. "10m"); overrides the config's [window]
    #[arg(long, value_parser = parse_duration)]
    pub size: Option<Duration>,

    /// Hop between windows; makes the window hopping
    #[arg(long, value_parser = parse_duration, requires = "size")]
    pub step: Option<Duration>,

    /// Retention after a window closes
    #[arg(long, value_parser = parse_duration, requires = "size")]
    pub expires: Option<Duration>,

    /// Also report whether each window has expired at this time (ms)
    #[arg(long, allow_negative_numbers = true)]
    pub now: Option<Timestamp>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

fn parse_duration(s: &str) -> Result<Duration, String> {
    humantime::parse_duration(s).map_err(|e| e.to_string())
}

#[derive(Debug, Serialize)]
pub struct Bucket {
    pub bucket: i64,
    pub start: Timestamp,
    pub end: Timestamp,
    pub current: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expired: Option<bool>,
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<8} [{}, {})", self.bucket, self.start, self.end)?;
        if self.current {
            write!(f, " current")?;
        }
        if self.expired == Some(true) {
            write!(f, " expired")?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct Buckets(pub Vec<Bucket>);

impl fmt::Display for Buckets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self.0.iter().map(Bucket::to_string).collect();
        write!(f, "{}", lines.join("\n"))
    }
}

pub fn windows(args: WindowsArgs, config: &Config) -> Result<()> {
    let window = match args.size {
        Some(size) => match args.step {
            Some(step) => WindowConfig::Hopping {
                size,
                step,
                expires: args.expires,
            },
            None => WindowConfig::Tumbling {
                size,
                expires: args.expires,
            },
        },
        None => config
            .window
            .clone()
            .context("no window configured; pass --size or add [window] to rill.toml")?,
    };
    let policy = window.policy()?;

    output::print(&buckets(&policy, args.timestamp, args.now), args.output)
}

/// Every bucket containing `timestamp`, oldest first
pub fn buckets(policy: &WindowPolicy, timestamp: Timestamp, now: Option<Timestamp>) -> Buckets {
    let current = policy.current(timestamp);
    Buckets(
        policy
            .buckets(timestamp)
            .into_iter()
            .map(|bucket| {
                let range = policy.range(bucket);
                Bucket {
                    bucket,
                    start: range.start,
                    end: range.end,
                    current: bucket == current,
                    expired: now.map(|now| policy.is_expired(&range, now)),
                }
            })
            .collect(),
    )
}

#[cfg(test)]
#[path = "windows_tests.rs"]
mod tests;
