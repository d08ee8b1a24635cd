// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `health`: worker CLI availability, config, pool, and task gauges.

use super::{ToolCtx, ToolError};
use serde_json::{json, Map, Value};

pub(super) async fn run(ctx: &ToolCtx) -> Result<Value, ToolError> {
    let probe = ctx.cli.probe().await;
    let pool = ctx.pool.status();

    let mut cli = Map::new();
    cli.insert("available".into(), Value::Bool(probe.available));
    if let Some(version) = probe.version {
        cli.insert("version".into(), Value::String(version));
    }
    if let Some(error) = probe.error {
        cli.insert("error".into(), Value::String(error));
    }

    let mut config = Map::new();
    config.insert("primaryModel".into(), Value::String(ctx.config.model.clone()));
    if let Some(fallback) = &ctx.config.fallback_model {
        config.insert("fallbackModel".into(), Value::String(fallback.clone()));
    }
    if let Some(agent) = ctx.config.defaults.agent {
        config.insert("defaultAgent".into(), Value::String(agent.as_str().to_string()));
    }

    Ok(json!({
        "cli": cli,
        "config": config,
        "pool": {
            "running": pool.running,
            "queued": pool.queued,
            "maxConcurrent": pool.max_concurrent,
        },
        "tasks": {
            "active": ctx.manager.list_active_tasks().len(),
            "total": ctx.manager.list_all_tasks().len(),
            "activeProcesses": ctx.runner.active_count(),
            "activeRespondProcesses": ctx.runner.active_respond_count(),
        },
    }))
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
