//! Full drive of the `wardend` binary over its stdio protocol.

#![cfg(unix)]

use crate::prelude::stub_worker;
use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::time::{Duration, Instant};

struct DaemonUnderTest {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<std::process::ChildStdout>,
}

impl DaemonUnderTest {
    fn spawn(state_dir: &std::path::Path) -> Self {
        let mut child = Command::new(assert_cmd::cargo::cargo_bin("wardend"))
            .env("WARDEN_STATE_DIR", state_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("failed to spawn wardend");
        let stdin = child.stdin.take().unwrap();
        let stdout = BufReader::new(child.stdout.take().unwrap());
        Self { child, stdin, stdout }
    }

    fn request(&mut self, id: u64, tool: &str, args: Value) -> Value {
        let line = json!({"id": id, "tool": tool, "args": args}).to_string();
        writeln!(self.stdin, "{line}").unwrap();
        self.stdin.flush().unwrap();

        let mut response = String::new();
        self.stdout.read_line(&mut response).expect("daemon closed stdout");
        let frame: warden_wire::ToolResponse =
            serde_json::from_str(response.trim()).expect("bad response frame");
        assert_eq!(frame.id, id);
        assert!(!frame.is_error, "unexpected error: {}", frame.content);
        serde_json::from_str(&frame.content).unwrap()
    }

    fn finish(mut self) {
        drop(self.stdin); // EOF ends the request loop
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            match self.child.try_wait().unwrap() {
                Some(status) => {
                    assert!(status.success(), "daemon exited with {status}");
                    return;
                }
                None if Instant::now() > deadline => {
                    self.child.kill().ok();
                    panic!("daemon did not exit after stdin close");
                }
                None => std::thread::sleep(Duration::from_millis(20)),
            }
        }
    }
}

#[test]
fn start_list_health_over_stdio() {
    let dir = tempfile::tempdir().unwrap();
    let state_dir = dir.path().join("state");
    std::fs::create_dir_all(&state_dir).unwrap();

    let worker = stub_worker(
        dir.path(),
        concat!(
            r#"printf '%s\n' '{"type":"step_start","timestamp":1.0,"sessionID":"ses_e2e","part":{"id":"p0","snapshot":""}}'"#,
            "\n",
            r#"printf '%s\n' '{"type":"text","timestamp":2.0,"sessionID":"ses_e2e","part":{"id":"p1","text":"All done."}}'"#,
            "\n",
            r#"printf '%s\n' '{"type":"step_finish","timestamp":3.0,"sessionID":"ses_e2e","part":{"id":"p2","reason":"stop","tokens":{"input":1,"output":1,"reasoning":0},"cost":0.0}}'"#,
        ),
    );
    std::fs::write(
        state_dir.join("config.toml"),
        format!("worker_bin = \"{}\"\n", worker.display()),
    )
    .unwrap();

    let mut daemon = DaemonUnderTest::spawn(&state_dir);

    let health = daemon.request(1, "health", json!({}));
    assert_eq!(health["cli"]["available"], true);
    assert_eq!(health["pool"]["maxConcurrent"], 5);

    let started = daemon.request(2, "start", json!({"task": "run the stub"}));
    assert_eq!(started["status"], "working");
    let task_id = started["taskId"].as_str().unwrap().to_string();

    // Poll list until the stub's completion event lands.
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut request_id = 3;
    loop {
        let listed = daemon.request(request_id, "list", json!({"status": "all"}));
        request_id += 1;
        let session = listed["sessions"]
            .as_array()
            .unwrap()
            .iter()
            .find(|s| s["taskId"] == task_id.as_str())
            .expect("task missing from list");
        if session["status"] == "completed" {
            assert_eq!(session["sessionId"], "ses_e2e");
            break;
        }
        assert!(Instant::now() < deadline, "task never completed: {listed}");
        std::thread::sleep(Duration::from_millis(25));
    }

    daemon.finish();

    // Artifacts survive on disk for inspection.
    let tasks_dir = state_dir.join("tasks");
    assert!(tasks_dir.join(format!("{task_id}.json")).is_file());
    assert!(tasks_dir.join(format!("{task_id}.output.jsonl")).is_file());
    assert!(tasks_dir.join(format!("{task_id}.result.json")).is_file());
    let result: Value = serde_json::from_str(
        &std::fs::read_to_string(tasks_dir.join(format!("{task_id}.result.json"))).unwrap(),
    )
    .unwrap();
    assert_eq!(result["status"], "completed");
    assert_eq!(result["output"], "All done.");

    let sessions: Value = serde_json::from_str(
        &std::fs::read_to_string(state_dir.join("sessions.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(sessions["mappings"]["ses_e2e"]["task_id"], task_id.as_str());
}

#[test]
fn unknown_tool_gets_an_error_response() {
    let dir = tempfile::tempdir().unwrap();
    let state_dir = dir.path().join("state");
    std::fs::create_dir_all(&state_dir).unwrap();

    let mut daemon = DaemonUnderTest::spawn(&state_dir);
    let line = json!({"id": 7, "tool": "frobnicate", "args": {}}).to_string();
    writeln!(daemon.stdin, "{line}").unwrap();
    daemon.stdin.flush().unwrap();

    let mut response = String::new();
    daemon.stdout.read_line(&mut response).unwrap();
    let frame: warden_wire::ToolResponse = serde_json::from_str(response.trim()).unwrap();
    assert!(frame.is_error);
    assert_eq!(frame.id, 7);

    daemon.finish();
}
