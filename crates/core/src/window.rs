// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Window policies
//!
//! Pure mappings from a timestamp (milliseconds since the Unix epoch) to
//! the buckets that contain it. Bucket ids are window indexes: a tumbling
//! bucket `b` covers `[b*size, (b+1)*size)` and a hopping bucket `b` covers
//! `[b*step, b*step + size)`.
//!
//! Expiry is a retention hint for the changelog topic; nothing here evicts
//! state on its own.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Milliseconds since the Unix epoch
pub type Timestamp = i64;

/// Errors from window construction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("window size must be at least one millisecond")]
    ZeroSize,
    #[error("window step must be at least one millisecond")]
    ZeroStep,
    #[error("window step ({step_ms}ms) is larger than its size ({size_ms}ms)")]
    StepExceedsSize { size_ms: i64, step_ms: i64 },
}

/// Half-open time range `[start, end)` covered by one bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowRange {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl WindowRange {
    pub fn contains(&self, timestamp: Timestamp) -> bool {
        self.start <= timestamp && timestamp < self.end
    }
}

/// How timestamps are grouped into buckets
///
/// Only constructible through [`WindowPolicy::tumbling`],
/// [`WindowPolicy::hopping`] or deserialization, all of which validate,
/// so sizes and steps are always at least one millisecond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WindowSpec", into = "WindowSpec")]
pub struct WindowPolicy {
    size: Duration,
    /// `None` for tumbling windows
    step: Option<Duration>,
    expires: Option<Duration>,
}

/// Serialized form of a [`WindowPolicy`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WindowSpec {
    /// Non-overlapping, contiguous windows of `size`
    Tumbling {
        size: Duration,
        expires: Option<Duration>,
    },
    /// Windows of `size` starting at every multiple of `step`
    Hopping {
        size: Duration,
        step: Duration,
        expires: Option<Duration>,
    },
}

impl TryFrom<WindowSpec> for WindowPolicy {
    type Error = WindowError;

    fn try_from(spec: WindowSpec) -> Result<Self, Self::Error> {
        match spec {
            WindowSpec::Tumbling { size, expires } => Self::tumbling(size, expires),
            WindowSpec::Hopping {
                size,
                step,
                expires,
            } => Self::hopping(size, step, expires),
        }
    }
}

impl From<WindowPolicy> for WindowSpec {
    fn from(policy: WindowPolicy) -> Self {
        match policy.step {
            None => Self::Tumbling {
                size: policy.size,
                expires: policy.expires,
            },
            Some(step) => Self::Hopping {
                size: policy.size,
                step,
                expires: policy.expires,
            },
        }
    }
}

impl WindowPolicy {
    pub fn tumbling(size: Duration, expires: Option<Duration>) -> Result<Self, WindowError> {
        if millis(size) == 0 {
            return Err(WindowError::ZeroSize);
        }
        Ok(Self {
            size,
            step: None,
            expires,
        })
    }

    pub fn hopping(
        size: Duration,
        step: Duration,
        expires: Option<Duration>,
    ) -> Result<Self, WindowError> {
        let (size_ms, step_ms) = (millis(size), millis(step));
        if size_ms == 0 {
            return Err(WindowError::ZeroSize);
        }
        if step_ms == 0 {
            return Err(WindowError::ZeroStep);
        }
        if step_ms > size_ms {
            return Err(WindowError::StepExceedsSize { size_ms, step_ms });
        }
        Ok(Self {
            size,
            step: Some(step),
            expires,
        })
    }

    pub fn is_hopping(&self) -> bool {
        self.step.is_some()
    }

    pub fn size(&self) -> Duration {
        self.size
    }

    /// Distance between consecutive window starts
    pub fn step(&self) -> Duration {
        self.step.unwrap_or(self.size)
    }

    /// Changelog retention after a window closes
    pub fn expires(&self) -> Option<Duration> {
        self.expires
    }

    /// Every bucket containing `timestamp`, oldest first
    pub fn buckets(&self, timestamp: Timestamp) -> Vec<i64> {
        let (earliest, latest) = self.bucket_bounds(timestamp);
        (earliest..=latest).collect()
    }

    /// Ranges of every bucket containing `timestamp`, oldest first
    pub fn ranges(&self, timestamp: Timestamp) -> Vec<WindowRange> {
        self.buckets(timestamp)
            .into_iter()
            .map(|bucket| self.range(bucket))
            .collect()
    }

    /// The most recently opened bucket containing `timestamp`
    pub fn current(&self, timestamp: Timestamp) -> i64 {
        self.bucket_bounds(timestamp).1
    }

    /// The oldest bucket still containing `timestamp`
    pub fn earliest(&self, timestamp: Timestamp) -> i64 {
        self.bucket_bounds(timestamp).0
    }

    /// The current bucket as of `delta` before `timestamp`
    pub fn delta(&self, timestamp: Timestamp, delta: Duration) -> i64 {
        self.current(timestamp.saturating_sub(millis(delta)))
    }

    /// Time range covered by `bucket`
    pub fn range(&self, bucket: i64) -> WindowRange {
        let start = bucket.saturating_mul(millis(self.step()));
        WindowRange {
            start,
            end: start.saturating_add(millis(self.size())),
        }
    }

    /// Number of buckets any timestamp belongs to when `step` divides `size`
    pub fn buckets_per_timestamp(&self) -> usize {
        let (size, step) = (millis(self.size()), millis(self.step()));
        ((size + step - 1) / step) as usize
    }

    /// Whether a bucket's changelog entries may be compacted away at `now`
    ///
    /// Buckets never expire when the policy has no expiry.
    pub fn is_expired(&self, range: &WindowRange, now: Timestamp) -> bool {
        match self.expires() {
            Some(expires) => range.end.saturating_add(millis(expires)) <= now,
            None => false,
        }
    }

    fn bucket_bounds(&self, timestamp: Timestamp) -> (i64, i64) {
        let step = millis(self.step()).max(1);
        let latest = timestamp.div_euclid(step);
        let earliest = timestamp
            .saturating_sub(millis(self.size))
            .div_euclid(step)
            .saturating_add(1)
            .min(latest);
        (earliest, latest)
    }
}

fn millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

#[cfg(test)]
#[path = "window_tests.rs"]
mod tests;
