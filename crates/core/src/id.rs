// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task identifier generation.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Length of the random suffix appended to the type prefix.
const SUFFIX_LEN: usize = 19;

/// Unique identifier for a supervised task.
///
/// Format is `tsk-{nanoid}`: a 4-character type prefix followed by a
/// 19-character random ID, 23 bytes total. `from_string` accepts any
/// string so IDs read back from disk round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub const PREFIX: &'static str = "tsk-";

    /// Generate a new random task ID.
    pub fn new() -> Self {
        Self(format!("{}{}", Self::PREFIX, nanoid::nanoid!(SUFFIX_LEN)))
    }

    /// Create an ID from an existing string (parsing / deserialization).
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The ID without its type prefix.
    pub fn suffix(&self) -> &str {
        self.0.strip_prefix(Self::PREFIX).unwrap_or(&self.0)
    }

    /// Suffix truncated to at most `n` characters, for log lines.
    pub fn short(&self, n: usize) -> &str {
        let suffix = self.suffix();
        &suffix[..n.min(suffix.len())]
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self::from_string(s)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self::from_string(s)
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for TaskId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for TaskId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Borrow<str> for TaskId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::ops::Deref for TaskId {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
