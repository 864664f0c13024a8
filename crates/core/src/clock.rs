// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for testable time handling
//!
//! Tables read both clocks: the monotonic one for TTL bookkeeping and the
//! wall clock for window timestamps when no event is in scope.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// A clock that provides the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    /// Milliseconds since the Unix epoch
    fn wall_millis(&self) -> i64;
}

/// Real system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }
}

struct FakeTime {
    instant: Instant,
    wall_millis: i64,
}

/// Fake clock for testing with controllable time
///
/// Clones share the same time; advancing one advances all of them.
#[derive(Clone)]
pub struct FakeClock {
    current: Arc<Mutex<FakeTime>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self::at_millis(0)
    }

    /// Start the wall clock at `wall_millis`
    pub fn at_millis(wall_millis: i64) -> Self {
        Self {
            current: Arc::new(Mutex::new(FakeTime {
                instant: Instant::now(),
                wall_millis,
            })),
        }
    }

    /// Advance both clocks by the given duration
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        current.instant += duration;
        current.wall_millis = current
            .wall_millis
            .saturating_add(i64::try_from(duration.as_millis()).unwrap_or(i64::MAX));
    }

    /// Set the wall clock without moving the monotonic clock
    pub fn set_wall_millis(&self, wall_millis: i64) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        current.wall_millis = wall_millis;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.current.lock().unwrap_or_else(|e| e.into_inner()).instant
    }

    fn wall_millis(&self) -> i64 {
        self.current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .wall_millis
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
