// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded-concurrency admission gate for worker processes.
//!
//! FIFO: work runs immediately while a slot is free, otherwise it
//! queues and is admitted as slots release. The limit can be changed at
//! runtime; raising it admits queued work immediately.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Snapshot of pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub running: usize,
    pub queued: usize,
    pub max_concurrent: usize,
}

#[derive(Clone)]
pub struct ProcessPool {
    inner: Arc<Mutex<PoolState>>,
}

struct PoolState {
    running: usize,
    max_concurrent: usize,
    waiters: VecDeque<oneshot::Sender<()>>,
}

impl ProcessPool {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(PoolState {
                running: 0,
                max_concurrent: max_concurrent.max(1),
                waiters: VecDeque::new(),
            })),
        }
    }

    /// Run `fut` once a slot is free. The slot is released when the
    /// future finishes, success or failure; its output passes through.
    pub async fn execute<F>(&self, fut: F) -> F::Output
    where
        F: Future,
    {
        let _slot = self.acquire().await;
        fut.await
    }

    pub fn status(&self) -> PoolStatus {
        let state = self.inner.lock();
        PoolStatus {
            running: state.running,
            queued: state.waiters.len(),
            max_concurrent: state.max_concurrent,
        }
    }

    /// Change the concurrency limit, admitting queued work up to it.
    pub fn set_pool_size(&self, max_concurrent: usize) {
        let mut state = self.inner.lock();
        state.max_concurrent = max_concurrent.max(1);
        admit_waiters(&mut state);
    }

    async fn acquire(&self) -> Slot {
        let waiter = {
            let mut state = self.inner.lock();
            if state.running < state.max_concurrent {
                state.running += 1;
                None
            } else {
                let (tx, rx) = oneshot::channel();
                state.waiters.push_back(tx);
                Some(rx)
            }
        };
        if let Some(rx) = waiter {
            // The admitting side increments `running` before signalling.
            let _ = rx.await;
        }
        Slot { pool: self.inner.clone() }
    }
}

/// RAII admission slot: releases on drop and admits the next waiter.
struct Slot {
    pool: Arc<Mutex<PoolState>>,
}

impl Drop for Slot {
    fn drop(&mut self) {
        let mut state = self.pool.lock();
        state.running = state.running.saturating_sub(1);
        admit_waiters(&mut state);
    }
}

fn admit_waiters(state: &mut PoolState) {
    while state.running < state.max_concurrent {
        let Some(tx) = state.waiters.pop_front() else { break };
        // A dead waiter (dropped future) just gets skipped.
        if tx.send(()).is_ok() {
            state.running += 1;
        }
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
