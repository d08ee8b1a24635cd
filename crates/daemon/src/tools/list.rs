// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `list`: recent tasks, most recently active first.

use super::{iso, parse_args, ToolCtx, ToolError};
use serde::Deserialize;
use serde_json::{json, Value};

const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Default, Deserialize)]
struct ListArgs {
    status: Option<String>,
    limit: Option<usize>,
}

pub(super) fn run(ctx: &ToolCtx, args: &Value) -> Result<Value, ToolError> {
    let args: ListArgs = if args.is_null() { ListArgs::default() } else { parse_args(args)? };

    let all = match args.status.as_deref() {
        None | Some("active") => false,
        Some("all") => true,
        Some(other) => {
            return Err(ToolError::Validation(format!(
                "invalid status {other:?}: expected active or all"
            )))
        }
    };
    let limit = args.limit.unwrap_or(DEFAULT_LIMIT);

    let total = ctx.manager.list_all_tasks().len();
    let mut tasks =
        if all { ctx.manager.list_all_tasks() } else { ctx.manager.list_active_tasks() };
    tasks.sort_by(|a, b| b.last_event_at_ms.cmp(&a.last_event_at_ms));
    tasks.truncate(limit);

    let sessions: Vec<Value> = tasks
        .iter()
        .map(|meta| {
            json!({
                "taskId": meta.id,
                "sessionId": meta.session_id,
                "title": meta.title,
                "status": meta.status,
                "model": meta.model,
                "agent": meta.agent,
                "createdAt": iso(meta.created_at_ms),
                "lastEventAt": iso(meta.last_event_at_ms),
            })
        })
        .collect();

    Ok(json!({ "sessions": sessions, "total": total }))
}

#[cfg(test)]
#[path = "list_tests.rs"]
mod tests;
