// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker event stream: typed events and the NDJSON line codec.
//!
//! The worker CLI emits one JSON object per stdout line. Four event
//! types are understood; everything else is dropped with a warning.
//! Unknown fields on known events are tolerated and preserved so that
//! persisted logs round-trip what the worker actually said.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One event emitted by the worker CLI.
///
/// Serializes as `{"type": "...", "timestamp": n, "sessionID": "...",
/// "part": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkerEvent {
    #[serde(rename = "step_start")]
    StepStart {
        timestamp: f64,
        #[serde(rename = "sessionID")]
        session_id: String,
        part: StepStartPart,
        #[serde(flatten, skip_serializing_if = "Map::is_empty")]
        extra: Map<String, Value>,
    },

    #[serde(rename = "text")]
    Text {
        timestamp: f64,
        #[serde(rename = "sessionID")]
        session_id: String,
        part: TextPart,
        #[serde(flatten, skip_serializing_if = "Map::is_empty")]
        extra: Map<String, Value>,
    },

    #[serde(rename = "tool_use")]
    ToolUse {
        timestamp: f64,
        #[serde(rename = "sessionID")]
        session_id: String,
        part: ToolUsePart,
        #[serde(flatten, skip_serializing_if = "Map::is_empty")]
        extra: Map<String, Value>,
    },

    #[serde(rename = "step_finish")]
    StepFinish {
        timestamp: f64,
        #[serde(rename = "sessionID")]
        session_id: String,
        part: StepFinishPart,
        #[serde(flatten, skip_serializing_if = "Map::is_empty")]
        extra: Map<String, Value>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepStartPart {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub snapshot: String,
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextPart {
    #[serde(default)]
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub time: TimeRange,
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    #[serde(default)]
    pub start: i64,
    #[serde(default)]
    pub end: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolUsePart {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub tool: String,
    #[serde(rename = "callID", default)]
    pub call_id: String,
    #[serde(default)]
    pub state: ToolUseState,
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolUseState {
    #[serde(default)]
    pub status: ToolStatus,
    #[serde(default)]
    pub input: Map<String, Value>,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub metadata: ToolMetadata,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Completed,
    #[default]
    Pending,
    Error,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit: Option<i32>,
    #[serde(default)]
    pub truncated: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepFinishPart {
    #[serde(default)]
    pub id: String,
    pub reason: FinishReason,
    #[serde(default)]
    pub tokens: TokenUsage,
    #[serde(default)]
    pub cost: f64,
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

/// Why a worker step finished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinishReason {
    #[default]
    #[serde(rename = "stop")]
    Stop,
    #[serde(rename = "tool-calls")]
    ToolCalls,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub input: u64,
    #[serde(default)]
    pub output: u64,
    #[serde(default)]
    pub reasoning: u64,
}

impl WorkerEvent {
    pub fn type_name(&self) -> &'static str {
        match self {
            WorkerEvent::StepStart { .. } => "step_start",
            WorkerEvent::Text { .. } => "text",
            WorkerEvent::ToolUse { .. } => "tool_use",
            WorkerEvent::StepFinish { .. } => "step_finish",
        }
    }

    pub fn session_id(&self) -> &str {
        match self {
            WorkerEvent::StepStart { session_id, .. }
            | WorkerEvent::Text { session_id, .. }
            | WorkerEvent::ToolUse { session_id, .. }
            | WorkerEvent::StepFinish { session_id, .. } => session_id,
        }
    }

    pub fn timestamp(&self) -> f64 {
        match self {
            WorkerEvent::StepStart { timestamp, .. }
            | WorkerEvent::Text { timestamp, .. }
            | WorkerEvent::ToolUse { timestamp, .. }
            | WorkerEvent::StepFinish { timestamp, .. } => *timestamp,
        }
    }

    /// True for the `step_finish { reason: stop }` completion event.
    pub fn is_completion(&self) -> bool {
        matches!(
            self,
            WorkerEvent::StepFinish { part, .. } if part.reason == FinishReason::Stop
        )
    }

    /// Text payload, for text events.
    pub fn text(&self) -> Option<&str> {
        match self {
            WorkerEvent::Text { part, .. } => Some(&part.text),
            _ => None,
        }
    }

    /// Token usage, for finish events.
    pub fn token_usage(&self) -> Option<&TokenUsage> {
        match self {
            WorkerEvent::StepFinish { part, .. } => Some(&part.tokens),
            _ => None,
        }
    }
}

const KNOWN_TYPES: [&str; 4] = ["step_start", "text", "tool_use", "step_finish"];

/// Parse one NDJSON line into a typed event.
///
/// Returns `None` for empty lines (silently) and for anything
/// malformed or unknown (logged at warn). Never errors to the caller.
pub fn parse_line(line: &str) -> Option<WorkerEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let value: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "dropping unparseable event line");
            return None;
        }
    };

    let Some(obj) = value.as_object() else {
        tracing::warn!("dropping non-object event line");
        return None;
    };

    let Some(event_type) = obj.get("type").and_then(Value::as_str).map(str::to_owned) else {
        tracing::warn!("dropping event line without string `type`");
        return None;
    };
    let event_type = event_type.as_str();
    if !obj.get("timestamp").is_some_and(Value::is_number) {
        tracing::warn!(event_type, "dropping event without numeric `timestamp`");
        return None;
    }
    if !obj.get("sessionID").is_some_and(|v| v.is_string()) {
        tracing::warn!(event_type, "dropping event without string `sessionID`");
        return None;
    }
    if !obj.get("part").is_some_and(Value::is_object) {
        tracing::warn!(event_type, "dropping event without object `part`");
        return None;
    }
    if !KNOWN_TYPES.contains(&event_type) {
        tracing::warn!(event_type, "dropping event of unknown type");
        return None;
    }

    match serde_json::from_value(value) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!(event_type, error = %e, "dropping event with malformed part");
            None
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
