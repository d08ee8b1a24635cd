// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted record shapes.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use warden_core::{AgentKind, SessionId, TaskId, TaskMeta, TaskStatus};

/// Schema version of `sessions.json`.
pub const SESSIONS_FILE_VERSION: u32 = 1;

/// Convert epoch milliseconds to UTC for ISO-8601 serialization.
pub fn epoch_ms_to_utc(ms: u64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms as i64).single().unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Durable mirror of a task's metadata (no bulk fields).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedTaskMetadata {
    pub task_id: TaskId,
    pub session_id: SessionId,
    pub title: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentKind>,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_event_at: DateTime<Utc>,
}

impl From<&TaskMeta> for PersistedTaskMetadata {
    fn from(meta: &TaskMeta) -> Self {
        Self {
            task_id: meta.id.clone(),
            session_id: meta.session_id.clone(),
            title: meta.title.clone(),
            model: meta.model.clone(),
            agent: meta.agent,
            status: meta.status,
            status_message: meta.status_message.clone(),
            created_at: epoch_ms_to_utc(meta.created_at_ms),
            last_event_at: epoch_ms_to_utc(meta.last_event_at_ms),
        }
    }
}

/// Final outcome of a task, written once on the terminal transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: TaskId,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    /// Accumulated worker text at the time the task ended.
    pub output: String,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// One session → task binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMapping {
    pub task_id: TaskId,
    pub created_at: DateTime<Utc>,
}

/// Contents of `sessions.json`. Duplicate session keys: last write wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionsFile {
    pub version: u32,
    #[serde(default)]
    pub mappings: HashMap<String, SessionMapping>,
}

impl Default for SessionsFile {
    fn default() -> Self {
        Self { version: SESSIONS_FILE_VERSION, mappings: HashMap::new() }
    }
}

#[cfg(test)]
#[path = "records_tests.rs"]
mod tests;
