// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cancel`: stop a task and its worker.

use super::{parse_args, ToolCtx, ToolError};
use serde::Deserialize;
use serde_json::{json, Value};
use warden_core::TaskId;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CancelArgs {
    task_id: String,
}

pub(super) fn run(ctx: &ToolCtx, args: &Value) -> Result<Value, ToolError> {
    let args: CancelArgs = parse_args(args)?;
    let task_id = TaskId::from_string(&args.task_id);

    let Some(status) = ctx.manager.get_task_status(&task_id) else {
        return Ok(json!({
            "taskId": task_id,
            "status": "failed",
            "message": format!("Task not found: {task_id}"),
        }));
    };
    if status.is_terminal() {
        return Ok(json!({
            "taskId": task_id,
            "status": status,
            "message": format!("Task is already in terminal state {status}"),
        }));
    }

    // Mark cancelled before signalling the child so exit classification
    // can never race the cancel into a `failed` status.
    let _ = ctx.manager.cancel_task(&task_id);
    let killed = ctx.runner.stop(&task_id);

    Ok(json!({
        "taskId": task_id,
        "status": "cancelled",
        "message": if killed {
            "Task cancelled; worker process stopped"
        } else {
            "Task cancelled; no worker process was running"
        },
    }))
}

#[cfg(test)]
#[path = "cancel_tests.rs"]
mod tests;
