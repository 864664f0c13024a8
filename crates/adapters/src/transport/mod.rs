// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transport adapters
//!
//! Implementations of [`Acknowledger`](rill_core::Acknowledger) and
//! [`Producer`](rill_core::Producer) for channels backed by topics.

mod noop;

pub use noop::NoOpTransport;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeTransport, SentRecord, TransportCall};
