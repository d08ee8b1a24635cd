// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background persistence writer.
//!
//! Hot paths (event ingest, status transitions) must never wait on
//! disk. They enqueue write commands onto a bounded channel consumed by
//! a single writer task; when the queue is full the newest command is
//! dropped with a warning. A disabled handle backs memory-only mode
//! when the base directory could not be initialized.

use crate::records::{PersistedTaskMetadata, TaskResult};
use crate::store::TaskStore;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use warden_core::{SessionId, TaskId, WorkerEvent};

/// Queue capacity. Overflow drops the newest command.
const QUEUE_CAPACITY: usize = 256;

/// One persistence command.
#[derive(Debug)]
pub enum WriteCmd {
    TaskMetadata(Box<PersistedTaskMetadata>),
    AppendEvent { task_id: TaskId, event: Box<WorkerEvent> },
    TaskResult(Box<TaskResult>),
    SessionMapping { session_id: SessionId, task_id: TaskId, created_at: DateTime<Utc> },
    Shutdown,
}

/// Fire-and-forget handle to the writer task.
#[derive(Clone)]
pub struct StoreWriter {
    tx: Option<mpsc::Sender<WriteCmd>>,
}

impl StoreWriter {
    /// Spawn the writer task over an initialized store.
    pub fn spawn(store: TaskStore) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let handle = tokio::spawn(run_writer(store, rx));
        (Self { tx: Some(tx) }, handle)
    }

    /// No-op handle for memory-only mode.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    pub fn save_metadata(&self, meta: PersistedTaskMetadata) {
        self.submit(WriteCmd::TaskMetadata(Box::new(meta)));
    }

    pub fn append_event(&self, task_id: TaskId, event: WorkerEvent) {
        self.submit(WriteCmd::AppendEvent { task_id, event: Box::new(event) });
    }

    pub fn save_result(&self, result: TaskResult) {
        self.submit(WriteCmd::TaskResult(Box::new(result)));
    }

    pub fn save_session_mapping(
        &self,
        session_id: SessionId,
        task_id: TaskId,
        created_at: DateTime<Utc>,
    ) {
        self.submit(WriteCmd::SessionMapping { session_id, task_id, created_at });
    }

    /// Ask the writer to drain its queue and stop. Safe to call twice.
    pub async fn shutdown(&self) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(WriteCmd::Shutdown).await;
        }
    }

    fn submit(&self, cmd: WriteCmd) {
        let Some(tx) = &self.tx else { return };
        match tx.try_send(cmd) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(cmd)) => {
                tracing::warn!(?cmd, "persistence queue full, dropping write");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("persistence writer stopped, dropping write");
            }
        }
    }
}

async fn run_writer(store: TaskStore, mut rx: mpsc::Receiver<WriteCmd>) {
    while let Some(cmd) = rx.recv().await {
        let result = match cmd {
            WriteCmd::TaskMetadata(meta) => store.save_task_metadata(&meta),
            WriteCmd::AppendEvent { task_id, event } => store.append_event(&task_id, &event),
            WriteCmd::TaskResult(result) => store.save_result(&result),
            WriteCmd::SessionMapping { session_id, task_id, created_at } => {
                store.save_session_mapping(&session_id, &task_id, created_at)
            }
            WriteCmd::Shutdown => break,
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "persistence write failed");
        }
    }
}

#[cfg(test)]
#[path = "writer_tests.rs"]
mod tests;
