// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use rill_core::TableSensor;
use std::fmt::Debug;

/// Sensor that emits a trace event for every table access
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSensor;

impl LogSensor {
    pub fn new() -> Self {
        Self
    }
}

impl TableSensor for LogSensor {
    fn on_get(&self, table: &str, key: &dyn Debug) {
        tracing::trace!(table, ?key, "table get");
    }

    fn on_set(&self, table: &str, key: &dyn Debug, value: &dyn Debug) {
        tracing::trace!(table, ?key, ?value, "table set");
    }

    fn on_del(&self, table: &str, key: &dyn Debug) {
        tracing::trace!(table, ?key, "table del");
    }
}
