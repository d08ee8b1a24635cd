// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk task store.
//!
//! Layout under the base directory:
//!
//! ```text
//! <base>/
//!   tasks/
//!     <taskId>.json          metadata, whole-file write
//!     <taskId>.output.jsonl  append-only event log
//!     <taskId>.result.json   written once on terminal transition
//!   sessions.json            session → task index
//! ```

use crate::records::{PersistedTaskMetadata, SessionsFile, TaskResult};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use warden_core::{TaskId, WorkerEvent};

/// Storage errors. Callers on the hot path log these and move on;
/// in-memory task state is authoritative during a run.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io { path: path.to_path_buf(), source }
    }

    fn json(path: &Path, source: serde_json::Error) -> Self {
        Self::Json { path: path.to_path_buf(), source }
    }
}

/// Handle to the persistence directory. Cheap to clone; the session
/// index mutex is shared across clones so writers serialize.
#[derive(Clone)]
pub struct TaskStore {
    base: PathBuf,
    tasks: PathBuf,
    pub(crate) sessions_mutex: Arc<Mutex<()>>,
}

impl TaskStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        let tasks = base.join("tasks");
        Self { base, tasks, sessions_mutex: Arc::new(Mutex::new(())) }
    }

    /// Create directories and an empty session index if missing. Idempotent.
    pub fn init(&self) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.tasks).map_err(|e| StorageError::io(&self.tasks, e))?;
        let sessions = self.sessions_path();
        if !sessions.exists() {
            self.write_pretty(&sessions, &SessionsFile::default())?;
        }
        Ok(())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    pub fn tasks_dir(&self) -> &Path {
        &self.tasks
    }

    pub(crate) fn sessions_path(&self) -> PathBuf {
        self.base.join("sessions.json")
    }

    fn metadata_path(&self, task_id: &TaskId) -> PathBuf {
        self.tasks.join(format!("{task_id}.json"))
    }

    fn log_path(&self, task_id: &TaskId) -> PathBuf {
        self.tasks.join(format!("{task_id}.output.jsonl"))
    }

    fn result_path(&self, task_id: &TaskId) -> PathBuf {
        self.tasks.join(format!("{task_id}.result.json"))
    }

    pub fn save_task_metadata(&self, meta: &PersistedTaskMetadata) -> Result<(), StorageError> {
        self.write_pretty(&self.metadata_path(&meta.task_id), meta)
    }

    /// `None` when no metadata file exists; other I/O problems error.
    pub fn load_task_metadata(
        &self,
        task_id: &TaskId,
    ) -> Result<Option<PersistedTaskMetadata>, StorageError> {
        self.read_optional(&self.metadata_path(task_id))
    }

    /// Append one event as a single LF-terminated JSONL line.
    pub fn append_event(&self, task_id: &TaskId, event: &WorkerEvent) -> Result<(), StorageError> {
        let path = self.log_path(task_id);
        let mut line =
            serde_json::to_string(event).map_err(|e| StorageError::json(&path, e))?;
        line.push('\n');
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StorageError::io(&path, e))?;
        // One write call per event keeps lines whole.
        file.write_all(line.as_bytes()).map_err(|e| StorageError::io(&path, e))
    }

    /// Read the event log, skipping lines that no longer parse.
    pub fn load_events(&self, task_id: &TaskId) -> Result<Vec<WorkerEvent>, StorageError> {
        let path = self.log_path(task_id);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(&path, e)),
        };
        let mut events = Vec::new();
        for line in raw.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(event) => events.push(event),
                Err(e) => {
                    tracing::warn!(%task_id, error = %e, "skipping unreadable event log line");
                }
            }
        }
        Ok(events)
    }

    pub fn save_result(&self, result: &TaskResult) -> Result<(), StorageError> {
        self.write_pretty(&self.result_path(&result.task_id), result)
    }

    pub fn load_result(&self, task_id: &TaskId) -> Result<Option<TaskResult>, StorageError> {
        self.read_optional(&self.result_path(task_id))
    }

    /// Task IDs derived from artifact filenames, each listed once.
    pub fn list_tasks(&self) -> Result<Vec<TaskId>, StorageError> {
        let entries = match std::fs::read_dir(&self.tasks) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(&self.tasks, e)),
        };
        let mut ids = BTreeSet::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::io(&self.tasks, e))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let stem = name
                .strip_suffix(".output.jsonl")
                .or_else(|| name.strip_suffix(".result.json"))
                .or_else(|| name.strip_suffix(".json"));
            if let Some(stem) = stem {
                if !stem.is_empty() {
                    ids.insert(stem.to_string());
                }
            }
        }
        Ok(ids.into_iter().map(TaskId::from_string).collect())
    }

    /// Remove all artifacts for a task; missing files are fine.
    pub fn delete_task(&self, task_id: &TaskId) -> Result<(), StorageError> {
        for path in
            [self.metadata_path(task_id), self.log_path(task_id), self.result_path(task_id)]
        {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(StorageError::io(&path, e)),
            }
        }
        Ok(())
    }

    pub(crate) fn write_pretty<T: serde::Serialize>(
        &self,
        path: &Path,
        value: &T,
    ) -> Result<(), StorageError> {
        let json =
            serde_json::to_string_pretty(value).map_err(|e| StorageError::json(path, e))?;
        std::fs::write(path, json).map_err(|e| StorageError::io(path, e))
    }

    fn read_optional<T: serde::de::DeserializeOwned>(
        &self,
        path: &Path,
    ) -> Result<Option<T>, StorageError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::io(path, e)),
        };
        serde_json::from_str(&raw).map(Some).map_err(|e| StorageError::json(path, e))
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
