// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine errors.

use thiserror::Error;
use warden_core::{TaskId, TaskStatus};

/// Errors from [`crate::TaskManager`] operations.
#[derive(Debug, Error, PartialEq)]
pub enum ManagerError {
    #[error("task not found: {0}")]
    NotFound(TaskId),
}

/// Errors from [`crate::WorkerRunner`] preconditions.
///
/// Runtime failures of a running worker are not errors here; they are
/// attributed to the task via `fail_task`.
#[derive(Debug, Error, PartialEq)]
pub enum RunnerError {
    #[error("task not found: {0}")]
    NotFound(TaskId),

    #[error("task {task_id} is {status}, expected working")]
    NotWorking { task_id: TaskId, status: TaskStatus },
}
