// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor configuration.
//!
//! Loaded from an optional TOML file under the state directory. A
//! missing file yields defaults; a corrupt file is ignored with a
//! warning. Unknown keys are ignored so older daemons tolerate newer
//! config files.

use crate::task::AgentKind;
use serde::Deserialize;
use std::path::Path;

/// Default cap on concurrently running worker processes.
pub const DEFAULT_MAX_CONCURRENT: usize = 5;

/// Default trailing punctuation that marks a worker question.
pub const DEFAULT_PROMPT_SUFFIX: &str = "?";

const DEFAULT_MODEL: &str = "anthropic/claude-sonnet-4-5";
const DEFAULT_WORKER_BIN: &str = "opencode";

/// Supervisor configuration, as read from `config.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    /// Primary worker model, `provider/name`.
    pub model: String,
    /// Model to report as the fallback; the supervisor never switches
    /// models itself.
    pub fallback_model: Option<String>,
    /// Worker CLI executable name or path.
    pub worker_bin: String,
    pub defaults: Defaults,
    pub pool: PoolConfig,
    pub idle: IdleConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub agent: Option<AgentKind>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub max_concurrent: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdleConfig {
    /// Trailing punctuation that arms the input-required idle timer.
    pub prompt_suffix: String,
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            fallback_model: None,
            worker_bin: DEFAULT_WORKER_BIN.to_string(),
            defaults: Defaults::default(),
            pool: PoolConfig::default(),
            idle: IdleConfig::default(),
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { max_concurrent: DEFAULT_MAX_CONCURRENT }
    }
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self { prompt_suffix: DEFAULT_PROMPT_SUFFIX.to_string() }
    }
}

impl WardenConfig {
    /// Load configuration from `path`, falling back to defaults.
    ///
    /// Missing file is the common case and is silent; unreadable or
    /// unparseable files are reported once at warn.
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read config, using defaults");
                return Self::default();
            }
        };
        match toml::from_str(&raw) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "invalid config, using defaults");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
