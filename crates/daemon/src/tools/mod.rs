// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control tools: thin adapters from external requests to the engine.
//!
//! Each tool receives its collaborators through [`ToolCtx`] — there are
//! no module-level singletons, so tests construct fully isolated
//! instances.

mod cancel;
mod health;
mod list;
mod respond;
mod start;

use chrono::SecondsFormat;
use serde_json::Value;
use thiserror::Error;
use warden_core::WardenConfig;
use warden_engine::{ProcessPool, TaskManager, WorkerCli, WorkerRunner};
use warden_storage::StoreWriter;

/// Collaborators shared by every tool invocation.
pub struct ToolCtx {
    pub manager: TaskManager,
    pub runner: WorkerRunner,
    pub pool: ProcessPool,
    pub writer: StoreWriter,
    pub cli: WorkerCli,
    pub config: WardenConfig,
}

/// Tool-level failures, surfaced as error responses. Precondition
/// violations on respond/cancel are *not* errors; those tools answer
/// with a JSON document describing the state.
#[derive(Debug, Error, PartialEq)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("{0}")]
    Validation(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Route one request to its tool.
pub async fn dispatch(ctx: &ToolCtx, tool: &str, args: &Value) -> Result<Value, ToolError> {
    match tool {
        "start" => start::run(ctx, args),
        "list" => list::run(ctx, args),
        "respond" => respond::run(ctx, args),
        "cancel" => cancel::run(ctx, args),
        "health" => health::run(ctx).await,
        other => Err(ToolError::UnknownTool(other.to_string())),
    }
}

/// Parse a tool's argument object, mapping serde errors to validation
/// failures.
fn parse_args<T: serde::de::DeserializeOwned>(args: &Value) -> Result<T, ToolError> {
    serde_json::from_value(args.clone()).map_err(|e| ToolError::Validation(format!("invalid arguments: {e}")))
}

/// Epoch milliseconds as an ISO-8601 string.
fn iso(ms: u64) -> String {
    warden_storage::epoch_ms_to_utc(ms).to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Validate a `provider/name` model identifier.
///
/// Head: `[A-Za-z0-9_-]+`; tail: `[A-Za-z0-9._/-]+` (nested segments
/// allowed); total length ≤ 128.
fn is_valid_model(model: &str) -> bool {
    if model.is_empty() || model.len() > 128 {
        return false;
    }
    let Some((provider, name)) = model.split_once('/') else {
        return false;
    };
    !provider.is_empty()
        && provider.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        && !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '/' | '-'))
}

#[cfg(test)]
pub(crate) mod test_ctx;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
