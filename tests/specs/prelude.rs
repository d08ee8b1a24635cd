//! Shared helpers for the spec suite.

#![allow(dead_code)] // not every spec module uses every helper

use std::path::{Path, PathBuf};
use std::time::Duration;
use warden_core::{parse_line, FakeClock, WorkerEvent};

pub fn step_start(session: &str) -> WorkerEvent {
    event(&format!(
        r#"{{"type":"step_start","timestamp":1.0,"sessionID":"{session}","part":{{"id":"p0","snapshot":""}}}}"#
    ))
}

pub fn text(session: &str, body: &str) -> WorkerEvent {
    event(&format!(
        r#"{{"type":"text","timestamp":2.0,"sessionID":"{session}","part":{{"id":"p1","text":"{body}","time":{{"start":1,"end":2}}}}}}"#
    ))
}

pub fn tool_use(session: &str) -> WorkerEvent {
    event(&format!(
        r#"{{"type":"tool_use","timestamp":3.0,"sessionID":"{session}","part":{{"id":"p2","tool":"bash","callID":"c1","state":{{"status":"completed","input":{{}},"output":"","metadata":{{"truncated":false}}}}}}}}"#
    ))
}

pub fn step_finish(session: &str, reason: &str) -> WorkerEvent {
    event(&format!(
        r#"{{"type":"step_finish","timestamp":4.0,"sessionID":"{session}","part":{{"id":"p3","reason":"{reason}","tokens":{{"input":5,"output":3,"reasoning":0}},"cost":0.001}}}}"#
    ))
}

fn event(line: &str) -> WorkerEvent {
    parse_line(line).unwrap_or_else(|| panic!("helper produced unparseable event: {line}"))
}

/// Advance virtual tokio time and the fake clock together, then let
/// timer tasks run.
pub async fn advance(clock: &FakeClock, duration: Duration) {
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;
    clock.advance(duration);
    tokio::time::advance(duration).await;
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;
}

/// Write an executable stub worker that runs `body` under /bin/sh.
#[cfg(unix)]
pub fn stub_worker(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join("worker.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Shell line emitting one NDJSON event.
pub fn emit(line: &str) -> String {
    format!("printf '%s\\n' '{line}'")
}

/// Poll until `check` passes or five seconds elapse.
pub async fn wait_for(what: &str, mut check: impl FnMut() -> bool) {
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while !check() {
        assert!(std::time::Instant::now() < deadline, "timed out waiting for {what}");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
