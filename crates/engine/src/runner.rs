// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker child-process supervision.
//!
//! One supervised child per start (plus one per respond continuation),
//! admitted through the process pool. Stdout is NDJSON: each line goes
//! codec → manager → fire-and-forget persistence. Stderr is drained
//! for diagnostics only. A runtime timeout bounds every child; exit
//! codes are classified once the stream is drained.

use crate::error::RunnerError;
use crate::kill;
use crate::manager::TaskManager;
use crate::pool::ProcessPool;
use crate::worker_cli::WorkerCli;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use warden_core::{parse_line, AgentKind, Clock, SessionId, SystemClock, TaskId};
use warden_storage::StoreWriter;

/// Upper bound on a single worker child's runtime.
pub const WORKER_TIMEOUT: Duration = Duration::from_secs(900);

/// Inputs for starting a fresh worker invocation.
#[derive(Debug, Clone)]
pub struct StartSpec {
    pub prompt: String,
    pub model: String,
    pub agent: Option<AgentKind>,
    pub output_guidance: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChildKind {
    Start,
    Respond,
}

struct ChildHandle {
    pid: Option<u32>,
    cancel: CancellationToken,
}

/// Spawns and supervises worker CLI children for the task manager.
#[derive(Clone)]
pub struct WorkerRunner<C: Clock = SystemClock> {
    inner: Arc<RunnerInner<C>>,
}

struct RunnerInner<C: Clock> {
    cli: WorkerCli,
    manager: TaskManager<C>,
    writer: StoreWriter,
    pool: ProcessPool,
    clock: C,
    children: Mutex<HashMap<TaskId, ChildHandle>>,
    responders: Mutex<HashMap<TaskId, ChildHandle>>,
}

impl<C: Clock> WorkerRunner<C> {
    pub fn new(
        cli: WorkerCli,
        manager: TaskManager<C>,
        writer: StoreWriter,
        pool: ProcessPool,
        clock: C,
    ) -> Self {
        Self {
            inner: Arc::new(RunnerInner {
                cli,
                manager,
                writer,
                pool,
                clock,
                children: Mutex::new(HashMap::new()),
                responders: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Launch the worker for a task that is in `working`.
    pub fn start(&self, task_id: &TaskId, spec: StartSpec) -> Result<(), RunnerError> {
        let status = self
            .inner
            .manager
            .get_task_status(task_id)
            .ok_or_else(|| RunnerError::NotFound(task_id.clone()))?;
        if status != warden_core::TaskStatus::Working {
            return Err(RunnerError::NotWorking { task_id: task_id.clone(), status });
        }

        let args = self.inner.cli.start_args(
            &spec.model,
            spec.agent,
            &spec.prompt,
            spec.output_guidance.as_deref(),
        );
        self.spawn_supervised(task_id.clone(), args, ChildKind::Start);
        Ok(())
    }

    /// Launch a continuation of an existing worker session. Output is
    /// routed through the same pipeline under the same task id.
    pub fn continue_session(
        &self,
        task_id: &TaskId,
        session_id: &SessionId,
        response: &str,
    ) -> Result<(), RunnerError> {
        if self.inner.manager.get_task_status(task_id).is_none() {
            return Err(RunnerError::NotFound(task_id.clone()));
        }
        let args = self.inner.cli.continue_args(session_id.as_str(), response);
        self.spawn_supervised(task_id.clone(), args, ChildKind::Respond);
        Ok(())
    }

    /// Signal any live child for the task. True iff one existed.
    pub fn stop(&self, task_id: &TaskId) -> bool {
        let mut signalled = false;
        for map in [&self.inner.children, &self.inner.responders] {
            if let Some(handle) = map.lock().remove(task_id) {
                tracing::info!(%task_id, pid = ?handle.pid, "stopping worker child");
                handle.cancel.cancel();
                signalled = true;
            }
        }
        signalled
    }

    /// Terminate every live child. Used at shutdown.
    pub fn stop_all(&self) {
        for map in [&self.inner.children, &self.inner.responders] {
            for (task_id, handle) in map.lock().drain() {
                tracing::info!(%task_id, pid = ?handle.pid, "stopping worker child");
                handle.cancel.cancel();
            }
        }
    }

    pub fn active_count(&self) -> usize {
        self.inner.children.lock().len()
    }

    pub fn active_respond_count(&self) -> usize {
        self.inner.responders.lock().len()
    }

    fn spawn_supervised(&self, task_id: TaskId, args: Vec<String>, kind: ChildKind) {
        let runner = self.clone();
        tokio::spawn(async move {
            let pool = runner.inner.pool.clone();
            pool.execute(runner.run_child(task_id, args, kind)).await;
        });
    }

    async fn run_child(self, task_id: TaskId, args: Vec<String>, kind: ChildKind) {
        // The task may have been cancelled while queued for admission.
        match self.inner.manager.get_task_status(&task_id) {
            Some(status) if !status.is_terminal() => {}
            _ => {
                tracing::debug!(%task_id, "skipping spawn for finished task");
                return;
            }
        }

        let mut cmd = tokio::process::Command::new(self.inner.cli.bin());
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::error!(%task_id, bin = self.inner.cli.bin(), error = %e, "worker spawn failed");
                let _ = self.inner.manager.fail_task(&task_id, format!("Process error: {e}"));
                return;
            }
        };
        tracing::info!(%task_id, pid = ?child.id(), ?kind, "worker spawned");

        let cancel = CancellationToken::new();
        self.register(kind, &task_id, child.id(), cancel.clone());
        // A cancel that landed between the admission check and
        // registration missed the token; catch it here.
        if self.inner.manager.get_task_status(&task_id).map_or(true, |s| s.is_terminal()) {
            cancel.cancel();
        }

        let stderr_task = child
            .stderr
            .take()
            .map(|stderr| tokio::spawn(drain_stderr(task_id.clone(), stderr)));

        let mut seen_session = false;
        let timeout = tokio::time::sleep(WORKER_TIMEOUT);
        tokio::pin!(timeout);

        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                tokio::select! {
                    () = &mut timeout => {
                        let _ = self.inner.manager.fail_task(
                            &task_id,
                            format!("Process timed out after {} seconds", WORKER_TIMEOUT.as_secs()),
                        );
                        kill::kill_child(&child);
                        break;
                    }
                    () = cancel.cancelled() => {
                        kill::kill_child(&child);
                        break;
                    }
                    line = lines.next_line() => match line {
                        Ok(Some(line)) => self.ingest_line(&task_id, &line, &mut seen_session),
                        Ok(None) => break,
                        Err(e) => {
                            tracing::warn!(%task_id, error = %e, "worker stdout read failed");
                            break;
                        }
                    }
                }
            }
        }

        let status = child.wait().await;
        self.unregister(kind, &task_id);
        if let Some(handle) = stderr_task {
            let _ = handle.await;
        }

        match status {
            Ok(status) => self.classify_exit(&task_id, status),
            Err(e) => {
                tracing::warn!(%task_id, error = %e, "worker wait failed");
                let _ = self.inner.manager.fail_task(&task_id, format!("Process error: {e}"));
            }
        }
    }

    /// codec → manager → fire-and-forget persistence, per stdout line.
    fn ingest_line(&self, task_id: &TaskId, line: &str, seen_session: &mut bool) {
        let Some(event) = parse_line(line) else { return };

        if !*seen_session && !event.session_id().is_empty() {
            *seen_session = true;
            self.inner.writer.save_session_mapping(
                SessionId::new(event.session_id()),
                task_id.clone(),
                self.inner.clock.utc(),
            );
        }

        if let Err(e) = self.inner.manager.handle_event(task_id, &event) {
            tracing::warn!(%task_id, error = %e, "dropping event for unknown task");
            return;
        }
        self.inner.writer.append_event(task_id.clone(), event);
    }

    /// Reconcile final status once stdout is drained and the child is
    /// reaped. A task already terminal (completion event, cancel,
    /// timeout) wins; a clean exit without completion stays working.
    fn classify_exit(&self, task_id: &TaskId, status: std::process::ExitStatus) {
        match self.inner.manager.get_task_status(task_id) {
            None => return,
            Some(current) if current.is_terminal() => {
                tracing::debug!(%task_id, %current, "exit after terminal status");
                return;
            }
            Some(_) => {}
        }

        if let Some(code) = status.code() {
            if code != 0 {
                let _ =
                    self.inner.manager.fail_task(task_id, format!("Process exited with code {code}"));
            } else {
                // Tolerate workers that exit 0 without a completion event.
                tracing::debug!(%task_id, "worker exited clean without completion");
            }
            return;
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                let _ = self
                    .inner
                    .manager
                    .fail_task(task_id, format!("Process killed by signal {signal}"));
                return;
            }
        }
        let _ = self.inner.manager.fail_task(task_id, "Process ended abnormally".to_string());
    }

    fn register(&self, kind: ChildKind, task_id: &TaskId, pid: Option<u32>, cancel: CancellationToken) {
        let map = match kind {
            ChildKind::Start => &self.inner.children,
            ChildKind::Respond => &self.inner.responders,
        };
        if let Some(previous) = map.lock().insert(task_id.clone(), ChildHandle { pid, cancel }) {
            previous.cancel.cancel();
        }
    }

    fn unregister(&self, kind: ChildKind, task_id: &TaskId) {
        let map = match kind {
            ChildKind::Start => &self.inner.children,
            ChildKind::Respond => &self.inner.responders,
        };
        map.lock().remove(task_id);
    }
}

/// Drain stderr for diagnostics. Rate-limit chatter is surfaced at
/// error level; everything else lands at debug.
async fn drain_stderr(task_id: TaskId, stderr: tokio::process::ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if line.to_ascii_lowercase().contains("rate limit") {
            tracing::error!(%task_id, line, "worker reported rate limiting");
        } else if !line.trim().is_empty() {
            tracing::debug!(%task_id, line, "worker stderr");
        }
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
