// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: startup wiring, periodic sweep, shutdown.

use crate::tools::ToolCtx;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use warden_core::{SystemClock, WardenConfig, COMPLETED_TASK_MAX_AGE};
use warden_engine::{ProcessPool, TaskManager, WorkerCli, WorkerRunner};
use warden_storage::{
    epoch_ms_to_utc, PersistedTaskMetadata, StoreWriter, TaskResult, TaskStore,
};

/// How often the completed-task purge runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(600);

/// Lifecycle errors. Anything here is fatal at startup (exit 1);
/// nothing at runtime routes through this type.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not determine state directory (no home directory)")]
    NoStateDir,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Filesystem layout for one daemon instance.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Root state directory (default `~/.warden-mcp`).
    pub state_dir: PathBuf,
    /// Optional TOML configuration file.
    pub config_path: PathBuf,
    /// Directory for daemon log files.
    pub log_dir: PathBuf,
}

impl DaemonConfig {
    /// Resolve paths for the user-level daemon.
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = crate::env::state_dir().ok_or(LifecycleError::NoStateDir)?;
        Ok(Self {
            config_path: state_dir.join("config.toml"),
            log_dir: state_dir.join("logs"),
            state_dir,
        })
    }
}

/// A running daemon: shared tool context plus background tasks.
pub struct Daemon {
    pub ctx: Arc<ToolCtx>,
    pub shutdown: CancellationToken,
    writer: StoreWriter,
    writer_task: Option<JoinHandle<()>>,
    sweep_task: JoinHandle<()>,
}

/// Initialize file logging. Returns the guard keeping the non-blocking
/// writer alive; `None` means logging fell back to stderr.
pub fn init_tracing(config: &DaemonConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if std::fs::create_dir_all(&config.log_dir).is_ok() {
        let appender = tracing_appender::rolling::daily(&config.log_dir, "wardend.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(writer)
            .with_ansi(false)
            .try_init();
        return Some(guard);
    }

    // Stdout carries the control protocol; logs must stay off it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
    None
}

/// Build every collaborator and start background tasks.
///
/// A failed persistence init downgrades to memory-only mode instead of
/// refusing to start; tasks still run, nothing is recorded.
pub fn startup(config: &DaemonConfig) -> Daemon {
    let warden_config = WardenConfig::load(&config.config_path);

    let store = TaskStore::new(&config.state_dir);
    let (writer, writer_task) = match store.init() {
        Ok(()) => {
            let (writer, task) = StoreWriter::spawn(store);
            (writer, Some(task))
        }
        Err(e) => {
            tracing::error!(error = %e, "persistence unavailable, running memory-only");
            (StoreWriter::disabled(), None)
        }
    };

    let manager = TaskManager::new();
    manager.set_prompt_suffix(&warden_config.idle.prompt_suffix);
    let pool = ProcessPool::new(warden_config.pool.max_concurrent);
    let cli = WorkerCli::new(&warden_config.worker_bin);
    let runner = WorkerRunner::new(
        cli.clone(),
        manager.clone(),
        writer.clone(),
        pool.clone(),
        SystemClock,
    );

    wire_status_sink(&manager, &writer);

    let shutdown = CancellationToken::new();
    let sweep_task = spawn_sweep(manager.clone(), shutdown.clone());

    let ctx = Arc::new(ToolCtx {
        manager,
        runner,
        pool,
        writer: writer.clone(),
        cli,
        config: warden_config,
    });

    Daemon { ctx, shutdown, writer, writer_task, sweep_task }
}

/// Checkpoint metadata on every transition; write the result record on
/// terminal ones. All of it fire-and-forget through the writer queue.
fn wire_status_sink(manager: &TaskManager, writer: &StoreWriter) {
    let sink_manager = manager.clone();
    let sink_writer = writer.clone();
    manager.set_status_sink(Arc::new(move |task_id, status, message| {
        let Some(task) = sink_manager.get_task_state(task_id) else {
            return;
        };
        sink_writer.save_metadata(PersistedTaskMetadata::from(&task.meta()));
        if status.is_terminal() {
            sink_writer.save_result(TaskResult {
                task_id: task_id.clone(),
                status,
                status_message: message.map(str::to_string),
                output: task.accumulated_text.clone(),
                completed_at: epoch_ms_to_utc(task.last_event_at_ms),
                duration_ms: task.last_event_at_ms.saturating_sub(task.created_at_ms),
            });
        }
    }));
}

fn spawn_sweep(manager: TaskManager, shutdown: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await; // first tick is immediate
        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let purged = manager.purge_completed(COMPLETED_TASK_MAX_AGE);
                    if purged > 0 {
                        tracing::info!(purged, "purged completed tasks from registry");
                    }
                }
            }
        }
    })
}

impl Daemon {
    /// Graceful teardown: stop children, drop timers, flush writes.
    pub async fn shutdown(mut self) {
        tracing::info!("shutting down");
        self.shutdown.cancel();
        self.ctx.runner.stop_all();
        self.ctx.manager.cleanup();
        self.writer.shutdown().await;
        if let Some(task) = self.writer_task.take() {
            let _ = task.await;
        }
        self.sweep_task.abort();
        tracing::info!("shutdown complete");
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
