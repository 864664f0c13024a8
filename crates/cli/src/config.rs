// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `rill.toml` configuration
//!
//! ```toml
//! app_id = "clicks"
//!
//! [table]
//! name = "counts"
//! ttl = "1h"
//!
//! [window]
//! kind = "hopping"
//! size = "10m"
//! step = "5m"
//! expires = "1d"
//!
//! [channel]
//! capacity = 8
//! ```

use anyhow::{Context, Result};
use rill_core::{ChannelConfig, WindowError, WindowPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG: &str = "rill.toml";

/// Application id used when neither the config nor a flag names one
pub const DEFAULT_APP_ID: &str = "rill";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub app_id: Option<String>,
    /// Selects the changelog topic and TTL for `rill replay`
    pub table: Option<TableConfig>,
    pub window: Option<WindowConfig>,
    /// Channel settings for applications embedding rill-core; the CLI
    /// only validates and prints them
    pub channel: ChannelConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableConfig {
    pub name: String,
    /// Keys not written for this long are hidden by `rill replay`
    #[serde(
        default,
        with = "humantime_serde",
        skip_serializing_if = "Option::is_none"
    )]
    pub ttl: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WindowConfig {
    Tumbling {
        #[serde(with = "humantime_serde")]
        size: Duration,
        #[serde(
            default,
            with = "humantime_serde",
            skip_serializing_if = "Option::is_none"
        )]
        expires: Option<Duration>,
    },
    Hopping {
        #[serde(with = "humantime_serde")]
        size: Duration,
        #[serde(with = "humantime_serde")]
        step: Duration,
        #[serde(
            default,
            with = "humantime_serde",
            skip_serializing_if = "Option::is_none"
        )]
        expires: Option<Duration>,
    },
}

impl WindowConfig {
    pub fn policy(&self) -> Result<WindowPolicy, WindowError> {
        match self {
            Self::Tumbling { size, expires } => WindowPolicy::tumbling(*size, *expires),
            Self::Hopping {
                size,
                step,
                expires,
            } => WindowPolicy::hopping(*size, *step, *expires),
        }
    }
}

impl Config {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("invalid configuration")
    }

    /// Load configuration
    ///
    /// An explicit path must exist. Without one, `rill.toml` in the working
    /// directory is used when present, otherwise the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => {
                let default = Path::new(DEFAULT_CONFIG);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("in config {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn app_id(&self) -> &str {
        self.app_id.as_deref().unwrap_or(DEFAULT_APP_ID)
    }

    pub fn table_name(&self) -> Option<&str> {
        self.table.as_ref().map(|t| t.name.as_str())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
