// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canonical in-memory task registry and lifecycle state machine.
//!
//! The manager is the only writer of in-memory task state. Event
//! handling is synchronous with respect to that state; the status sink
//! and persistence run off-path, after the registry lock is released.

use crate::error::ManagerError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use warden_core::{
    AgentKind, Clock, FinishReason, SessionId, SystemClock, Task, TaskId, TaskMeta, TaskStatus,
    WorkerEvent, DEFAULT_PROMPT_SUFFIX, INPUT_REQUIRED_IDLE_THRESHOLD,
};

/// Status message set when idle-input detection fires.
pub const WAITING_FOR_INPUT: &str = "Waiting for user input";

/// Callback invoked once per externally-visible status transition.
///
/// Must not block: it runs on the event path, after manager locks are
/// released. Side effects that can wait belong behind a channel.
pub type StatusSink = Arc<dyn Fn(&TaskId, TaskStatus, Option<&str>) + Send + Sync>;

/// Per-task lifecycle state machine over a shared registry.
#[derive(Clone)]
pub struct TaskManager<C: Clock = SystemClock> {
    inner: Arc<ManagerInner<C>>,
}

struct ManagerInner<C: Clock> {
    // Lock order: `tasks` before `idle_timers`, everywhere.
    tasks: Mutex<HashMap<TaskId, Task>>,
    idle_timers: Mutex<HashMap<TaskId, JoinHandle<()>>>,
    status_sink: Mutex<Option<StatusSink>>,
    prompt_suffix: Mutex<String>,
    clock: C,
}

impl TaskManager<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for TaskManager<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> TaskManager<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                tasks: Mutex::new(HashMap::new()),
                idle_timers: Mutex::new(HashMap::new()),
                status_sink: Mutex::new(None),
                prompt_suffix: Mutex::new(DEFAULT_PROMPT_SUFFIX.to_string()),
                clock,
            }),
        }
    }

    /// Install the status-change callback. Replaces any previous sink.
    pub fn set_status_sink(&self, sink: StatusSink) {
        *self.inner.status_sink.lock() = Some(sink);
    }

    /// Change the punctuation that marks a worker question.
    pub fn set_prompt_suffix(&self, suffix: impl Into<String>) {
        *self.inner.prompt_suffix.lock() = suffix.into();
    }

    /// Register a new task. Starts in `working`; never fails.
    pub fn create_task(
        &self,
        title: impl Into<String>,
        model: impl Into<String>,
        agent: Option<AgentKind>,
    ) -> TaskId {
        let id = TaskId::new();
        let task = Task::new(id.clone(), title, model, agent, self.inner.clock.epoch_ms());
        self.inner.tasks.lock().insert(id.clone(), task);
        tracing::info!(task_id = %id, "task created");
        id
    }

    /// Ingest one worker event for a task.
    ///
    /// Events for terminal tasks are dropped. Otherwise the session id
    /// is bound write-once, the idle timer is disarmed, and the event
    /// drives the state machine.
    pub fn handle_event(
        &self,
        task_id: &TaskId,
        event: &WorkerEvent,
    ) -> Result<(), ManagerError> {
        let mut transitions: Vec<(TaskStatus, Option<String>)> = Vec::new();
        let mut arm_idle = false;
        {
            let mut tasks = self.inner.tasks.lock();
            let task = tasks
                .get_mut(task_id)
                .ok_or_else(|| ManagerError::NotFound(task_id.clone()))?;
            if task.status.is_terminal() {
                tracing::debug!(
                    %task_id,
                    status = %task.status,
                    event = event.type_name(),
                    "dropping event for terminal task"
                );
                return Ok(());
            }

            self.disarm_idle_timer(task_id);

            if task.session_id.is_empty() && !event.session_id().is_empty() {
                task.session_id = SessionId::new(event.session_id());
            }
            task.touch(self.inner.clock.epoch_ms());

            // Any sign of life moves a waiting task back to working.
            if task.status == TaskStatus::InputRequired {
                task.status = TaskStatus::Working;
                task.status_message = None;
                transitions.push((TaskStatus::Working, None));
            }

            match event {
                WorkerEvent::StepStart { .. } | WorkerEvent::ToolUse { .. } => {}
                WorkerEvent::Text { part, .. } => {
                    task.append_text(&part.text);
                    task.last_text_at = Some(self.inner.clock.now());
                    if task.ends_with_prompt(&self.inner.prompt_suffix.lock()) {
                        arm_idle = true;
                    }
                }
                WorkerEvent::StepFinish { part, .. } => {
                    if part.reason == FinishReason::Stop {
                        task.status = TaskStatus::Completed;
                        task.status_message = None;
                        transitions.push((TaskStatus::Completed, None));
                    }
                }
            }
        }

        for (status, message) in &transitions {
            self.notify(task_id, *status, message.as_deref());
        }
        if arm_idle {
            self.arm_idle_timer(task_id);
        }
        Ok(())
    }

    /// Mark a task failed. No-op when already terminal.
    pub fn fail_task(
        &self,
        task_id: &TaskId,
        message: impl Into<String>,
    ) -> Result<(), ManagerError> {
        self.finish(task_id, TaskStatus::Failed, message.into())
    }

    /// Mark a task cancelled. No-op when already terminal.
    pub fn cancel_task(&self, task_id: &TaskId) -> Result<(), ManagerError> {
        self.finish(task_id, TaskStatus::Cancelled, "Task cancelled".to_string())
    }

    pub fn get_task_status(&self, task_id: &TaskId) -> Option<TaskStatus> {
        self.inner.tasks.lock().get(task_id).map(|t| t.status)
    }

    pub fn get_task_meta(&self, task_id: &TaskId) -> Option<TaskMeta> {
        self.inner.tasks.lock().get(task_id).map(Task::meta)
    }

    /// Full defensive copy, accumulated text included.
    pub fn get_task_state(&self, task_id: &TaskId) -> Option<Task> {
        self.inner.tasks.lock().get(task_id).cloned()
    }

    /// Tasks in `working` or `input_required`.
    pub fn list_active_tasks(&self) -> Vec<TaskMeta> {
        self.inner
            .tasks
            .lock()
            .values()
            .filter(|t| !t.status.is_terminal())
            .map(Task::meta)
            .collect()
    }

    pub fn list_all_tasks(&self) -> Vec<TaskMeta> {
        self.inner.tasks.lock().values().map(Task::meta).collect()
    }

    /// Drop a task from the registry, disarming any pending timer.
    pub fn remove_task(&self, task_id: &TaskId) -> bool {
        let removed = self.inner.tasks.lock().remove(task_id).is_some();
        self.disarm_idle_timer(task_id);
        removed
    }

    /// Purge terminal tasks whose last event is older than `max_age`.
    /// Returns how many were removed. On-disk artifacts are untouched.
    pub fn purge_completed(&self, max_age: Duration) -> usize {
        let now_ms = self.inner.clock.epoch_ms();
        let cutoff = max_age.as_millis() as u64;
        let purged: Vec<TaskId> = {
            let mut tasks = self.inner.tasks.lock();
            let expired: Vec<TaskId> = tasks
                .values()
                .filter(|t| {
                    t.status.is_terminal() && now_ms.saturating_sub(t.last_event_at_ms) >= cutoff
                })
                .map(|t| t.id.clone())
                .collect();
            for id in &expired {
                tasks.remove(id);
            }
            expired
        };
        for id in &purged {
            self.disarm_idle_timer(id);
            tracing::debug!(task_id = %id, "purged completed task");
        }
        purged.len()
    }

    /// Disarm every timer and empty the registry. Shutdown and tests.
    pub fn cleanup(&self) {
        let mut timers = self.inner.idle_timers.lock();
        for (_, handle) in timers.drain() {
            handle.abort();
        }
        drop(timers);
        self.inner.tasks.lock().clear();
    }

    fn finish(
        &self,
        task_id: &TaskId,
        status: TaskStatus,
        message: String,
    ) -> Result<(), ManagerError> {
        {
            let mut tasks = self.inner.tasks.lock();
            let task = tasks
                .get_mut(task_id)
                .ok_or_else(|| ManagerError::NotFound(task_id.clone()))?;
            if task.status.is_terminal() {
                tracing::debug!(%task_id, status = %task.status, "already terminal");
                return Ok(());
            }
            self.disarm_idle_timer(task_id);
            task.touch(self.inner.clock.epoch_ms());
            task.status = status;
            task.status_message = Some(message.clone());
        }
        self.notify(task_id, status, Some(&message));
        Ok(())
    }

    fn notify(&self, task_id: &TaskId, status: TaskStatus, message: Option<&str>) {
        tracing::info!(%task_id, %status, status_message = ?message, "status changed");
        let sink = self.inner.status_sink.lock().clone();
        if let Some(sink) = sink {
            sink(task_id, status, message);
        }
    }

    fn arm_idle_timer(&self, task_id: &TaskId) {
        let manager = self.clone();
        let id = task_id.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(INPUT_REQUIRED_IDLE_THRESHOLD).await;
            manager.idle_timer_fired(&id);
        });
        if let Some(previous) = self.inner.idle_timers.lock().insert(task_id.clone(), handle) {
            previous.abort();
        }
    }

    fn disarm_idle_timer(&self, task_id: &TaskId) {
        if let Some(handle) = self.inner.idle_timers.lock().remove(task_id) {
            handle.abort();
        }
    }

    /// One-shot idle check. Fires only when the task is still working,
    /// the buffer still ends with the prompt suffix, and enough quiet
    /// time has passed since the last text event.
    fn idle_timer_fired(&self, task_id: &TaskId) {
        let fired = {
            let mut tasks = self.inner.tasks.lock();
            let Some(task) = tasks.get_mut(task_id) else { return };
            let quiet = task.last_text_at.is_some_and(|at| {
                self.inner.clock.now().duration_since(at) >= INPUT_REQUIRED_IDLE_THRESHOLD
            });
            if task.status == TaskStatus::Working
                && task.ends_with_prompt(&self.inner.prompt_suffix.lock())
                && quiet
            {
                task.status = TaskStatus::InputRequired;
                task.status_message = Some(WAITING_FOR_INPUT.to_string());
                true
            } else {
                false
            }
        };
        self.inner.idle_timers.lock().remove(task_id);
        if fired {
            self.notify(task_id, TaskStatus::InputRequired, Some(WAITING_FOR_INPUT));
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
impl<C: Clock> TaskManager<C> {
    /// Force a status, bypassing the state machine. Test fixtures only.
    pub fn force_status(&self, task_id: &TaskId, status: TaskStatus, message: Option<&str>) {
        if let Some(task) = self.inner.tasks.lock().get_mut(task_id) {
            task.status = status;
            task.status_message = message.map(str::to_string);
        }
    }

    /// Bind a session id directly. Test fixtures only.
    pub fn bind_session(&self, task_id: &TaskId, session_id: &str) {
        if let Some(task) = self.inner.tasks.lock().get_mut(task_id) {
            task.session_id = SessionId::new(session_id);
        }
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
