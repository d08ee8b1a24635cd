// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The task lifecycle model.
//!
//! A task is one supervised invocation of the worker CLI. Its status
//! moves through a DAG with three absorbing terminal states; all
//! mutation goes through the `TaskManager` in `warden-engine`.

use crate::{SessionId, TaskId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// Hard cap on the accumulated text buffer per task. Text past the cap
/// is discarded; the first discard sets a one-shot overflow flag.
pub const ACCUMULATED_TEXT_CAP: usize = 1024 * 1024;

/// Quiet period after a trailing question before a task is considered
/// to be waiting for user input.
pub const INPUT_REQUIRED_IDLE_THRESHOLD: Duration = Duration::from_secs(30);

/// Terminal tasks older than this are purged from the in-memory
/// registry by the periodic sweep. On-disk artifacts are retained.
pub const COMPLETED_TASK_MAX_AGE: Duration = Duration::from_secs(60 * 60);

/// Worker agent mode for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Explore,
    Plan,
    Build,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Explore => "explore",
            AgentKind::Plan => "plan",
            AgentKind::Build => "build",
        }
    }

    /// Parse a user-supplied agent name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "explore" => Some(AgentKind::Explore),
            "plan" => Some(AgentKind::Plan),
            "build" => Some(AgentKind::Build),
            _ => None,
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task lifecycle status.
///
/// `working → completed` via a stop finish event; `working ⇄
/// input_required` via idle detection; `failed`/`cancelled` from
/// anywhere non-terminal. Terminal statuses are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Working,
    InputRequired,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Working => "working",
            TaskStatus::InputRequired => "input_required",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// In-memory task record. Owned exclusively by the `TaskManager`.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: TaskId,
    /// Write-once: empty until the first worker event arrives.
    pub session_id: SessionId,
    pub title: String,
    pub model: String,
    pub agent: Option<AgentKind>,
    pub created_at_ms: u64,
    /// Monotonically non-decreasing.
    pub last_event_at_ms: u64,
    pub status: TaskStatus,
    /// Present on non-success terminal states.
    pub status_message: Option<String>,
    /// Concatenated text-event payloads, capped at [`ACCUMULATED_TEXT_CAP`].
    pub accumulated_text: String,
    /// Set once when text past the cap was discarded.
    pub text_overflowed: bool,
    pub last_text_at: Option<Instant>,
}

impl Task {
    pub fn new(
        id: TaskId,
        title: impl Into<String>,
        model: impl Into<String>,
        agent: Option<AgentKind>,
        now_ms: u64,
    ) -> Self {
        Self {
            id,
            session_id: SessionId::empty(),
            title: title.into(),
            model: model.into(),
            agent,
            created_at_ms: now_ms,
            last_event_at_ms: now_ms,
            status: TaskStatus::Working,
            status_message: None,
            accumulated_text: String::new(),
            text_overflowed: false,
            last_text_at: None,
        }
    }

    /// Bump `last_event_at_ms`, never moving it backwards.
    pub fn touch(&mut self, now_ms: u64) {
        if now_ms > self.last_event_at_ms {
            self.last_event_at_ms = now_ms;
        }
    }

    /// Append text honouring the buffer cap.
    ///
    /// Text that does not fit is discarded (truncated at a char
    /// boundary); the first discard flips the one-shot overflow flag.
    pub fn append_text(&mut self, text: &str) {
        let available = ACCUMULATED_TEXT_CAP.saturating_sub(self.accumulated_text.len());
        if text.len() <= available {
            self.accumulated_text.push_str(text);
            return;
        }
        let mut end = available;
        while end > 0 && !text.is_char_boundary(end) {
            end -= 1;
        }
        self.accumulated_text.push_str(&text[..end]);
        if !self.text_overflowed {
            self.text_overflowed = true;
            tracing::warn!(task_id = %self.id, "accumulated text cap reached, discarding further output");
        }
    }

    /// True when the trimmed buffer ends with the given prompt suffix.
    pub fn ends_with_prompt(&self, suffix: &str) -> bool {
        !suffix.is_empty() && self.accumulated_text.trim_end().ends_with(suffix)
    }

    /// Copy of the task without its bulk fields.
    pub fn meta(&self) -> TaskMeta {
        TaskMeta {
            id: self.id.clone(),
            session_id: self.session_id.clone(),
            title: self.title.clone(),
            model: self.model.clone(),
            agent: self.agent,
            created_at_ms: self.created_at_ms,
            last_event_at_ms: self.last_event_at_ms,
            status: self.status,
            status_message: self.status_message.clone(),
        }
    }
}

/// Task projection without the accumulated text buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskMeta {
    pub id: TaskId,
    pub session_id: SessionId,
    pub title: String,
    pub model: String,
    pub agent: Option<AgentKind>,
    pub created_at_ms: u64,
    pub last_event_at_ms: u64,
    pub status: TaskStatus,
    pub status_message: Option<String>,
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
