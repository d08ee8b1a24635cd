// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker CLI invocation.
//!
//! The worker is an opaque external program; the supervisor only knows
//! its argv conventions. Commands are always assembled as argv vectors
//! and handed to the OS spawn primitive directly — never through a
//! shell.

use std::time::Duration;

pub const MODEL_FLAG: &str = "--model";
pub const FORMAT_FLAG: &str = "--output-format";
pub const FORMAT_JSON: &str = "json";
pub const AGENT_FLAG: &str = "--agent";
pub const RUN_SUBCOMMAND: &str = "run";
pub const SESSION_FLAG: &str = "--session";
pub const VERSION_FLAG: &str = "--version";

/// How long the health probe waits for `--version`.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Argv builder for the worker CLI.
#[derive(Debug, Clone)]
pub struct WorkerCli {
    bin: String,
}

/// Outcome of the version probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliProbe {
    pub available: bool,
    pub version: Option<String>,
    pub error: Option<String>,
}

impl WorkerCli {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }

    pub fn bin(&self) -> &str {
        &self.bin
    }

    /// Argv for starting a fresh task.
    ///
    /// `[--model <model>, --output-format json, (--agent <agent>)?, <prompt>]`
    pub fn start_args(
        &self,
        model: &str,
        agent: Option<warden_core::AgentKind>,
        prompt: &str,
        output_guidance: Option<&str>,
    ) -> Vec<String> {
        let mut args = vec![
            MODEL_FLAG.to_string(),
            model.to_string(),
            FORMAT_FLAG.to_string(),
            FORMAT_JSON.to_string(),
        ];
        if let Some(agent) = agent {
            args.push(AGENT_FLAG.to_string());
            args.push(agent.as_str().to_string());
        }
        args.push(compose_prompt(prompt, output_guidance));
        args
    }

    /// Argv for continuing an existing worker session.
    ///
    /// `[run, --session <id>, --output-format json, <response>]`
    pub fn continue_args(&self, session_id: &str, response: &str) -> Vec<String> {
        vec![
            RUN_SUBCOMMAND.to_string(),
            SESSION_FLAG.to_string(),
            session_id.to_string(),
            FORMAT_FLAG.to_string(),
            FORMAT_JSON.to_string(),
            response.to_string(),
        ]
    }

    /// Probe the worker binary with its version flag.
    pub async fn probe(&self) -> CliProbe {
        let mut cmd = tokio::process::Command::new(&self.bin);
        cmd.arg(VERSION_FLAG)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());

        let output = match tokio::time::timeout(PROBE_TIMEOUT, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return CliProbe {
                    available: false,
                    version: None,
                    error: Some(format!("failed to execute {}: {e}", self.bin)),
                }
            }
            Err(_) => {
                return CliProbe {
                    available: false,
                    version: None,
                    error: Some(format!(
                        "{} did not answer within {}s",
                        self.bin,
                        PROBE_TIMEOUT.as_secs()
                    )),
                }
            }
        };

        if output.status.success() {
            let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
            CliProbe {
                available: true,
                version: (!version.is_empty()).then_some(version),
                error: None,
            }
        } else {
            CliProbe {
                available: false,
                version: None,
                error: Some(format!("{} exited with {}", self.bin, output.status)),
            }
        }
    }
}

fn compose_prompt(prompt: &str, output_guidance: Option<&str>) -> String {
    match output_guidance {
        Some(guidance) => format!("{prompt}\n\nOutput guidance: {guidance}"),
        None => prompt.to_string(),
    }
}

#[cfg(test)]
#[path = "worker_cli_tests.rs"]
mod tests;
