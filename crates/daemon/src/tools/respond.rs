// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `respond`: feed user input to a task waiting on a question.

use super::{parse_args, ToolCtx, ToolError};
use serde::Deserialize;
use serde_json::{json, Value};
use warden_core::{TaskId, TaskStatus};

const RESPONSE_MAX_LEN: usize = 50_000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RespondArgs {
    task_id: String,
    response: String,
}

pub(super) fn run(ctx: &ToolCtx, args: &Value) -> Result<Value, ToolError> {
    let args: RespondArgs = parse_args(args)?;
    if args.response.len() > RESPONSE_MAX_LEN {
        return Err(ToolError::Validation(format!(
            "response exceeds {RESPONSE_MAX_LEN} characters"
        )));
    }

    let task_id = TaskId::from_string(&args.task_id);
    let Some(meta) = ctx.manager.get_task_meta(&task_id) else {
        return Ok(json!({
            "taskId": task_id,
            "status": "failed",
            "message": format!("Task not found: {task_id}"),
        }));
    };

    if meta.status != TaskStatus::InputRequired {
        return Ok(json!({
            "taskId": task_id,
            "status": meta.status,
            "message": format!("Task is not waiting for input (status: {})", meta.status),
        }));
    }
    if meta.session_id.is_empty() {
        return Ok(json!({
            "taskId": task_id,
            "status": meta.status,
            "message": "Task has no worker session to continue",
        }));
    }

    ctx.runner
        .continue_session(&task_id, &meta.session_id, &args.response)
        .map_err(|e| ToolError::Internal(e.to_string()))?;

    Ok(json!({
        "taskId": task_id,
        "status": "working",
        "message": "Response sent; the worker session is continuing",
    }))
}

#[cfg(test)]
#[path = "respond_tests.rs"]
mod tests;
