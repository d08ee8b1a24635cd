// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Response type returned for every tool invocation.

use serde::{Deserialize, Serialize};

/// Result of a tool invocation.
///
/// `content` is itself a JSON document rendered to a string, mirroring
/// the content-block shape dispatch layers expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub id: u64,
    pub content: String,
    #[serde(rename = "isError")]
    pub is_error: bool,
}

impl ToolResponse {
    pub fn ok(id: u64, content: impl Into<String>) -> Self {
        Self { id, content: content.into(), is_error: false }
    }

    pub fn error(id: u64, content: impl Into<String>) -> Self {
        Self { id, content: content.into(), is_error: true }
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
