// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake table sensor for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use rill_core::TableSensor;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};

/// Recorded sensor call; keys and values are captured with `{:?}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorCall {
    Get { table: String, key: String },
    Set { table: String, key: String, value: String },
    Del { table: String, key: String },
}

/// Fake sensor that records every call
#[derive(Clone, Default)]
pub struct FakeSensor {
    calls: Arc<Mutex<Vec<SensorCall>>>,
}

impl FakeSensor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<SensorCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn record(&self, call: SensorCall) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }
}

impl TableSensor for FakeSensor {
    fn on_get(&self, table: &str, key: &dyn Debug) {
        self.record(SensorCall::Get {
            table: table.to_string(),
            key: format!("{:?}", key),
        });
    }

    fn on_set(&self, table: &str, key: &dyn Debug, value: &dyn Debug) {
        self.record(SensorCall::Set {
            table: table.to_string(),
            key: format!("{:?}", key),
            value: format!("{:?}", value),
        });
    }

    fn on_del(&self, table: &str, key: &dyn Debug) {
        self.record(SensorCall::Del {
            table: table.to_string(),
            key: format!("{:?}", key),
        });
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
