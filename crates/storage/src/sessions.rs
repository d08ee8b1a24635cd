// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session index operations.
//!
//! `sessions.json` is a single shared file mutated read-modify-write.
//! All mutations hold the store's session mutex so concurrent writers
//! cannot lose updates.

use crate::records::{SessionMapping, SessionsFile};
use crate::store::{StorageError, TaskStore};
use chrono::{DateTime, Utc};
use warden_core::{SessionId, TaskId};

impl TaskStore {
    /// Bind a session to a task. Overwrites any previous binding.
    pub fn save_session_mapping(
        &self,
        session_id: &SessionId,
        task_id: &TaskId,
        created_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let _guard = self.sessions_mutex.lock();
        let mut file = self.read_sessions_file();
        file.mappings.insert(
            session_id.as_str().to_string(),
            SessionMapping { task_id: task_id.clone(), created_at },
        );
        self.write_pretty(&self.sessions_path(), &file)
    }

    pub fn get_task_id_by_session(&self, session_id: &SessionId) -> Option<TaskId> {
        let _guard = self.sessions_mutex.lock();
        self.read_sessions_file().mappings.get(session_id.as_str()).map(|m| m.task_id.clone())
    }

    /// Remove a binding; returns whether one existed.
    pub fn remove_session_mapping(&self, session_id: &SessionId) -> Result<bool, StorageError> {
        let _guard = self.sessions_mutex.lock();
        let mut file = self.read_sessions_file();
        let removed = file.mappings.remove(session_id.as_str()).is_some();
        if removed {
            self.write_pretty(&self.sessions_path(), &file)?;
        }
        Ok(removed)
    }

    /// Read the index, starting fresh if the file is missing or corrupt.
    fn read_sessions_file(&self) -> SessionsFile {
        let path = self.sessions_path();
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return SessionsFile::default()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable session index, starting fresh");
                return SessionsFile::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "corrupt session index, starting fresh");
                SessionsFile::default()
            }
        }
    }
}

#[cfg(test)]
#[path = "sessions_tests.rs"]
mod tests;
