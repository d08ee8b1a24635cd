//! Lifecycle scenarios driven directly against the task manager.

use crate::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use warden_core::{FakeClock, TaskStatus};
use warden_engine::TaskManager;

fn fake_manager() -> (TaskManager<FakeClock>, FakeClock) {
    let clock = FakeClock::new();
    (TaskManager::with_clock(clock.clone()), clock)
}

#[tokio::test(start_paused = true)]
async fn happy_path() {
    let (manager, _clock) = fake_manager();
    let calls = Arc::new(status_log());
    let sink_calls = calls.clone();
    manager.set_status_sink(Arc::new(move |_, status, _| {
        sink_calls.lock().unwrap().push(status);
    }));

    let id = manager.create_task("Simple", "x/y", None);
    manager.handle_event(&id, &step_start("S")).unwrap();
    manager.handle_event(&id, &text("S", "Done.")).unwrap();
    manager.handle_event(&id, &step_finish("S", "stop")).unwrap();

    let task = manager.get_task_state(&id).unwrap();
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.session_id, "S");
    assert_eq!(task.accumulated_text, "Done.");
    assert_eq!(calls.lock().unwrap().as_slice(), &[TaskStatus::Completed]);
}

#[tokio::test(start_paused = true)]
async fn tool_use_then_completion() {
    let (manager, _clock) = fake_manager();
    let id = manager.create_task("Tools", "x/y", None);

    for event in [
        step_start("S"),
        text("S", "Analyzing…"),
        step_finish("S", "tool-calls"),
        step_start("S"),
        tool_use("S"),
        step_finish("S", "tool-calls"),
        step_start("S"),
        text("S", " done"),
        step_finish("S", "stop"),
    ] {
        manager.handle_event(&id, &event).unwrap();
    }

    let task = manager.get_task_state(&id).unwrap();
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.accumulated_text, "Analyzing… done");
}

#[tokio::test(start_paused = true)]
async fn idle_input_detection() {
    let (manager, clock) = fake_manager();
    let id = manager.create_task("Ask", "x/y", None);

    manager.handle_event(&id, &step_start("S")).unwrap();
    manager.handle_event(&id, &text("S", "Proceed?")).unwrap();
    advance(&clock, Duration::from_millis(30_000)).await;

    let task = manager.get_task_state(&id).unwrap();
    assert_eq!(task.status, TaskStatus::InputRequired);
    assert_eq!(task.status_message.as_deref(), Some("Waiting for user input"));

    manager.handle_event(&id, &step_start("S")).unwrap();
    manager.handle_event(&id, &text("S", "ok.")).unwrap();
    manager.handle_event(&id, &step_finish("S", "stop")).unwrap();
    assert_eq!(manager.get_task_status(&id), Some(TaskStatus::Completed));
}

#[tokio::test(start_paused = true)]
async fn question_then_activity_avoids_input_required() {
    let (manager, clock) = fake_manager();
    let id = manager.create_task("Ask", "x/y", None);

    manager.handle_event(&id, &text("S", "Still thinking?")).unwrap();
    advance(&clock, Duration::from_millis(15_000)).await;
    manager.handle_event(&id, &text("S", " yes")).unwrap();
    advance(&clock, Duration::from_millis(20_000)).await;

    assert_eq!(manager.get_task_status(&id), Some(TaskStatus::Working));
}

fn status_log() -> std::sync::Mutex<Vec<TaskStatus>> {
    std::sync::Mutex::new(Vec::new())
}
