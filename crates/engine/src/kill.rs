// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Platform-portable child termination.
//!
//! Unix children are spawned in their own process group, so signalling
//! the group reaches descendants. Windows uses the system tree-kill
//! utility. Every failure here is swallowed: the child may simply have
//! exited already.

use std::time::Duration;
use tokio::process::Child;

/// Grace period between SIGTERM and the SIGKILL escalation.
pub const SIGKILL_GRACE: Duration = Duration::from_secs(5);

/// Terminate a child and its descendants.
///
/// Graceful first, forceful afterwards. Returns immediately; the
/// forced kill is scheduled in the background. No-op when the child
/// has already been reaped.
pub fn kill_child(child: &Child) {
    let Some(pid) = child.id() else {
        return;
    };
    kill_pid(pid);
}

/// Terminate by pid, for callers that no longer hold the `Child`.
pub fn kill_pid(pid: u32) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        let pgid = Pid::from_raw(pid as i32);
        if let Err(e) = killpg(pgid, Signal::SIGTERM) {
            tracing::debug!(pid, error = %e, "SIGTERM failed");
            return;
        }
        tokio::spawn(async move {
            tokio::time::sleep(SIGKILL_GRACE).await;
            if let Err(e) = killpg(pgid, Signal::SIGKILL) {
                tracing::debug!(pid, error = %e, "SIGKILL skipped");
            }
        });
    }

    #[cfg(windows)]
    {
        let result = std::process::Command::new("taskkill")
            .args(["/pid", &pid.to_string(), "/T", "/F"])
            .output();
        if let Err(e) = result {
            tracing::debug!(pid, error = %e, "taskkill failed");
        }
    }
}

#[cfg(test)]
#[path = "kill_tests.rs"]
mod tests;
