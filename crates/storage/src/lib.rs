// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! warden-storage: durable records for supervised tasks.
//!
//! Per-task metadata and results are whole-file pretty JSON; the event
//! log is append-only JSONL; the session index is a single versioned
//! JSON file with serialized writers. Hot-path callers go through the
//! [`StoreWriter`] queue so disk latency never blocks event handling —
//! in-memory state stays authoritative during a run and the directory
//! is only read back for recovery-style inspection.

mod records;
mod sessions;
mod store;
mod writer;

pub use records::{
    epoch_ms_to_utc, PersistedTaskMetadata, SessionMapping, SessionsFile, TaskResult,
    SESSIONS_FILE_VERSION,
};
pub use store::{StorageError, TaskStore};
pub use writer::{StoreWriter, WriteCmd};
