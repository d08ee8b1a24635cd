// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request type for invoking a control tool.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One tool invocation from the client.
///
/// `args` defaults to `null` when omitted; individual tools validate
/// their own argument shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRequest {
    /// Caller-chosen correlation id, echoed on the response.
    #[serde(default)]
    pub id: u64,
    pub tool: String,
    #[serde(default)]
    pub args: Value,
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
