// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Table observation hooks

use std::fmt::Debug;

/// Observer notified of every table access
///
/// Every method defaults to a no-op so sensors implement only what they
/// watch. Calls are synchronous and happen on the caller's task.
pub trait TableSensor: Send + Sync {
    fn on_get(&self, _table: &str, _key: &dyn Debug) {}

    fn on_set(&self, _table: &str, _key: &dyn Debug, _value: &dyn Debug) {}

    fn on_del(&self, _table: &str, _key: &dyn Debug) {}
}
