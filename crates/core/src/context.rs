// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Current-event context
//!
//! While an event is being processed its source record is installed in a
//! task-local slot. Sends made from inside that scope attach to the record
//! instead of publishing immediately. The slot is per task, so concurrent
//! tasks each see only their own event.

use crate::record::Message;
use std::future::Future;
use std::sync::Arc;

tokio::task_local! {
    static CURRENT_MESSAGE: Arc<Message>;
}

/// The record currently being processed on this task, if any
pub fn current_message() -> Option<Arc<Message>> {
    CURRENT_MESSAGE.try_with(Arc::clone).ok()
}

/// Run `f` with `message` installed as the current record
pub async fn scope<F: Future>(message: Arc<Message>, f: F) -> F::Output {
    CURRENT_MESSAGE.scope(message, f).await
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
