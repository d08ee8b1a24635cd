// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for tool tests.

use super::ToolCtx;
use warden_core::{SystemClock, WardenConfig};
use warden_engine::{ProcessPool, TaskManager, WorkerCli, WorkerRunner};
use warden_storage::StoreWriter;

/// Build an isolated tool context around the given worker binary.
/// Persistence is disabled; tests that need it swap in a real writer.
pub(crate) fn ctx_with(worker_bin: &str, config: WardenConfig) -> ToolCtx {
    let manager = TaskManager::new();
    let pool = ProcessPool::new(config.pool.max_concurrent);
    let cli = WorkerCli::new(worker_bin);
    let writer = StoreWriter::disabled();
    let runner = WorkerRunner::new(
        cli.clone(),
        manager.clone(),
        writer.clone(),
        pool.clone(),
        SystemClock,
    );
    ToolCtx { manager, runner, pool, writer, cli, config }
}

/// Context whose worker exits immediately without emitting events.
pub(crate) fn quiet_ctx() -> ToolCtx {
    ctx_with("true", WardenConfig::default())
}

/// Write an executable stub worker script emitting the given body.
#[cfg(unix)]
pub(crate) fn stub_worker(dir: &std::path::Path, body: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join("worker.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
