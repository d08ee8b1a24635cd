// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `start`: create a task and launch its worker.

use super::{is_valid_model, parse_args, ToolCtx, ToolError};
use serde::Deserialize;
use serde_json::{json, Value};
use warden_core::AgentKind;
use warden_engine::StartSpec;
use warden_storage::PersistedTaskMetadata;

const TASK_MAX_LEN: usize = 100_000;
const OUTPUT_GUIDANCE_MAX_LEN: usize = 10_000;
const SESSION_TITLE_MAX_LEN: usize = 256;
const TITLE_SNIPPET_LEN: usize = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartArgs {
    task: String,
    agent: Option<String>,
    model: Option<String>,
    output_guidance: Option<String>,
    session_title: Option<String>,
}

pub(super) fn run(ctx: &ToolCtx, args: &Value) -> Result<Value, ToolError> {
    let args: StartArgs = parse_args(args)?;

    if args.task.trim().is_empty() {
        return Err(ToolError::Validation("task must not be empty".into()));
    }
    if args.task.len() > TASK_MAX_LEN {
        return Err(ToolError::Validation(format!(
            "task exceeds {TASK_MAX_LEN} characters"
        )));
    }
    if let Some(model) = &args.model {
        if !is_valid_model(model) {
            return Err(ToolError::Validation(format!(
                "invalid model {model:?}: expected provider/name"
            )));
        }
    }
    if args.output_guidance.as_ref().is_some_and(|g| g.len() > OUTPUT_GUIDANCE_MAX_LEN) {
        return Err(ToolError::Validation(format!(
            "outputGuidance exceeds {OUTPUT_GUIDANCE_MAX_LEN} characters"
        )));
    }
    if args.session_title.as_ref().is_some_and(|t| t.len() > SESSION_TITLE_MAX_LEN) {
        return Err(ToolError::Validation(format!(
            "sessionTitle exceeds {SESSION_TITLE_MAX_LEN} characters"
        )));
    }
    let agent = match &args.agent {
        None => ctx.config.defaults.agent,
        Some(name) => Some(AgentKind::parse(name).ok_or_else(|| {
            ToolError::Validation(format!(
                "invalid agent {name:?}: expected explore, plan, or build"
            ))
        })?),
    };

    let model = args.model.unwrap_or_else(|| ctx.config.model.clone());
    let title = args.session_title.unwrap_or_else(|| compose_title(&args.task));

    let task_id = ctx.manager.create_task(title, model.clone(), agent);
    if let Some(meta) = ctx.manager.get_task_meta(&task_id) {
        ctx.writer.save_metadata(PersistedTaskMetadata::from(&meta));
    }

    ctx.runner
        .start(
            &task_id,
            StartSpec {
                prompt: args.task,
                model,
                agent,
                output_guidance: args.output_guidance,
            },
        )
        .map_err(|e| ToolError::Internal(e.to_string()))?;

    Ok(json!({
        "taskId": task_id,
        "sessionId": "",
        "status": "working",
    }))
}

/// Default title: the first 50 characters of the task, elided.
fn compose_title(task: &str) -> String {
    let snippet: String = task.chars().take(TITLE_SNIPPET_LEN).collect();
    if task.chars().count() > TITLE_SNIPPET_LEN {
        format!("Task: {snippet}…")
    } else {
        format!("Task: {snippet}")
    }
}

#[cfg(test)]
#[path = "start_tests.rs"]
mod tests;
