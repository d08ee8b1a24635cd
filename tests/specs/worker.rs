//! Worker supervision scenarios: exit classification and cancel.

#![cfg(unix)]

use crate::prelude::*;
use warden_core::{SystemClock, TaskStatus};
use warden_engine::{ProcessPool, StartSpec, TaskManager, WorkerCli, WorkerRunner};
use warden_storage::StoreWriter;

fn runner_for(bin: &std::path::Path) -> (WorkerRunner, TaskManager) {
    let manager = TaskManager::new();
    let runner = WorkerRunner::new(
        WorkerCli::new(bin.display().to_string()),
        manager.clone(),
        StoreWriter::disabled(),
        ProcessPool::new(5),
        SystemClock,
    );
    (runner, manager)
}

fn start_spec() -> StartSpec {
    StartSpec {
        prompt: "spec".into(),
        model: "x/y".into(),
        agent: None,
        output_guidance: None,
    }
}

#[tokio::test]
async fn nonzero_exit_fails_the_task() {
    let dir = tempfile::tempdir().unwrap();
    let body = format!(
        "{}\nexit 1",
        emit(r#"{"type":"step_start","timestamp":1.0,"sessionID":"S","part":{"id":"p","snapshot":""}}"#),
    );
    let bin = stub_worker(dir.path(), &body);
    let (runner, manager) = runner_for(&bin);

    let id = manager.create_task("exit 1", "x/y", None);
    runner.start(&id, start_spec()).unwrap();

    wait_for("failed status", || manager.get_task_status(&id) == Some(TaskStatus::Failed)).await;
    let task = manager.get_task_state(&id).unwrap();
    assert_eq!(task.status_message.as_deref(), Some("Process exited with code 1"));
    assert_eq!(runner.active_count(), 0, "no child left in the runner's map");
}

#[tokio::test]
async fn cancel_before_any_event() {
    let dir = tempfile::tempdir().unwrap();
    let bin = stub_worker(dir.path(), "sleep 30");
    let (runner, manager) = runner_for(&bin);

    let id = manager.create_task("cancel me", "x/y", None);
    runner.start(&id, start_spec()).unwrap();
    wait_for("child registered", || runner.active_count() == 1).await;

    manager.cancel_task(&id).unwrap();
    assert!(runner.stop(&id), "a live child should have been signalled");

    wait_for("child gone", || runner.active_count() == 0).await;
    assert_eq!(manager.get_task_status(&id), Some(TaskStatus::Cancelled));

    // A straggling completion event is dropped.
    manager.handle_event(&id, &step_finish("S", "stop")).unwrap();
    assert_eq!(manager.get_task_status(&id), Some(TaskStatus::Cancelled));
}
