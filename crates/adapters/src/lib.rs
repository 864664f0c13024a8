// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Transport and sensor adapters for Rill

pub mod sensor;
pub mod traced;
pub mod transport;

pub use sensor::LogSensor;
pub use traced::TracedTransport;
pub use transport::NoOpTransport;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use sensor::{FakeSensor, SensorCall};
#[cfg(any(test, feature = "test-support"))]
pub use transport::{FakeTransport, SentRecord, TransportCall};
