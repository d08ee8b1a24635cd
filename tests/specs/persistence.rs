//! Persistence round-trip across store instances.

use crate::prelude::*;
use warden_core::{SessionId, TaskId, TaskStatus};
use warden_storage::{epoch_ms_to_utc, PersistedTaskMetadata, TaskResult, TaskStore};

#[test]
fn full_round_trip_on_a_fresh_instance() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("state");

    let store = TaskStore::new(&base);
    store.init().unwrap();

    let id = TaskId::new();
    let meta = PersistedTaskMetadata {
        task_id: id.clone(),
        session_id: SessionId::new("S"),
        title: "Round trip".into(),
        model: "x/y".into(),
        agent: None,
        status: TaskStatus::Working,
        status_message: None,
        created_at: epoch_ms_to_utc(1_000),
        last_event_at: epoch_ms_to_utc(9_000),
    };
    store.save_task_metadata(&meta).unwrap();

    let events = vec![
        step_start("S"),
        text("S", "one"),
        tool_use("S"),
        step_finish("S", "stop"),
    ];
    for event in &events {
        store.append_event(&id, event).unwrap();
    }

    let result = TaskResult {
        task_id: id.clone(),
        status: TaskStatus::Completed,
        status_message: None,
        output: "one".into(),
        completed_at: epoch_ms_to_utc(9_000),
        duration_ms: 8_000,
    };
    store.save_result(&result).unwrap();

    // A brand-new instance over the same directory sees everything.
    let reopened = TaskStore::new(&base);
    assert_eq!(reopened.load_task_metadata(&id).unwrap().unwrap(), meta);
    assert_eq!(reopened.load_events(&id).unwrap(), events);
    assert_eq!(reopened.load_result(&id).unwrap().unwrap(), result);

    let listed = reopened.list_tasks().unwrap();
    assert_eq!(listed.iter().filter(|t| **t == id).count(), 1, "listed exactly once");
}

#[test]
fn session_index_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("state");
    let store = TaskStore::new(&base);
    store.init().unwrap();

    let id = TaskId::new();
    store.save_session_mapping(&SessionId::new("S"), &id, epoch_ms_to_utc(1_000)).unwrap();

    let reopened = TaskStore::new(&base);
    assert_eq!(reopened.get_task_id_by_session(&SessionId::new("S")), Some(id));
}
