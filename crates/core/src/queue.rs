// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded flow-control queue
//!
//! The only structure shared between a channel's delivery path and its
//! consumers. `put` suspends while the queue is full or flow is suspended;
//! `get` suspends while it is empty. Both are cancel-safe: dropping a
//! pending `put` enqueues nothing and dropping a pending `get` dequeues
//! nothing.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::Notify;

/// Default capacity: one in-flight item keeps backpressure tight
pub const DEFAULT_CAPACITY: usize = 1;

struct QueueState<T> {
    items: VecDeque<T>,
    suspended: bool,
}

/// FIFO queue with a fixed capacity and a suspend/resume switch
pub struct FlowControlQueue<T> {
    capacity: usize,
    clear_on_resume: bool,
    state: Mutex<QueueState<T>>,
    changed: Notify,
}

impl<T> FlowControlQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self::with_options(capacity, true)
    }

    /// Create a queue; `clear_on_resume` drops queued items when flow resumes
    pub fn with_options(capacity: usize, clear_on_resume: bool) -> Self {
        Self {
            capacity: capacity.max(1),
            clear_on_resume,
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                suspended: false,
            }),
            changed: Notify::new(),
        }
    }

    /// Enqueue, waiting for space and for flow to be active
    pub async fn put(&self, item: T) {
        loop {
            let notified = self.changed.notified();
            tokio::pin!(notified);
            // Register before checking so a concurrent change is not missed
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if !state.suspended && state.items.len() < self.capacity {
                    state.items.push_back(item);
                    drop(state);
                    self.changed.notify_waiters();
                    return;
                }
            }

            notified.await;
        }
    }

    /// Enqueue without waiting; hands the item back when it cannot be queued
    pub fn try_put(&self, item: T) -> Result<(), T> {
        let mut state = self.lock();
        if state.suspended || state.items.len() >= self.capacity {
            return Err(item);
        }
        state.items.push_back(item);
        drop(state);
        self.changed.notify_waiters();
        Ok(())
    }

    /// Dequeue the oldest item, waiting until one is available
    pub async fn get(&self) -> T {
        loop {
            let notified = self.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(item) = self.try_get() {
                return item;
            }

            notified.await;
        }
    }

    /// Dequeue without waiting
    pub fn try_get(&self) -> Option<T> {
        let popped = self.lock().items.pop_front();
        if popped.is_some() {
            self.changed.notify_waiters();
        }
        popped
    }

    /// Stop accepting new items until [`resume`](Self::resume)
    pub fn suspend(&self) {
        self.lock().suspended = true;
        tracing::debug!("queue flow suspended");
    }

    /// Accept items again, dropping queued ones if configured to
    pub fn resume(&self) {
        let dropped = {
            let mut state = self.lock();
            state.suspended = false;
            if self.clear_on_resume {
                let dropped = state.items.len();
                state.items.clear();
                dropped
            } else {
                0
            }
        };
        tracing::debug!(dropped, "queue flow resumed");
        self.changed.notify_waiters();
    }

    pub fn is_suspended(&self) -> bool {
        self.lock().suspended
    }

    /// Drop every queued item
    pub fn clear(&self) {
        self.lock().items.clear();
        self.changed.notify_waiters();
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.lock().items.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
