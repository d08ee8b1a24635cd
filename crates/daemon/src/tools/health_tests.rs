// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::super::test_ctx;
use super::*;
use warden_core::WardenConfig;

#[tokio::test]
async fn reports_missing_worker_cli() {
    let ctx = test_ctx::ctx_with("no-such-worker-bin-a1b2", WardenConfig::default());
    let value = run(&ctx).await.unwrap();

    assert_eq!(value["cli"]["available"], false);
    assert!(value["cli"]["error"].as_str().is_some());
    assert!(value["cli"].get("version").is_none());
}

#[cfg(unix)]
#[tokio::test]
async fn reports_available_worker_cli() {
    let ctx = test_ctx::ctx_with("true", WardenConfig::default());
    let value = run(&ctx).await.unwrap();
    assert_eq!(value["cli"]["available"], true);
}

#[tokio::test]
async fn reports_config_pool_and_task_gauges() {
    let mut config = WardenConfig::default();
    config.fallback_model = Some("openai/gpt-5".into());
    config.defaults.agent = Some(warden_core::AgentKind::Plan);
    let ctx = test_ctx::ctx_with("true", config);

    let live = ctx.manager.create_task("live", "x/y", None);
    let done = ctx.manager.create_task("done", "x/y", None);
    ctx.manager.cancel_task(&done).unwrap();
    let _ = live;

    let value = run(&ctx).await.unwrap();
    assert_eq!(value["config"]["primaryModel"], ctx.config.model);
    assert_eq!(value["config"]["fallbackModel"], "openai/gpt-5");
    assert_eq!(value["config"]["defaultAgent"], "plan");
    assert_eq!(value["pool"]["maxConcurrent"], 5);
    assert_eq!(value["pool"]["running"], 0);
    assert_eq!(value["tasks"]["active"], 1);
    assert_eq!(value["tasks"]["total"], 2);
    assert_eq!(value["tasks"]["activeProcesses"], 0);
    assert_eq!(value["tasks"]["activeRespondProcesses"], 0);
}

#[tokio::test]
async fn omits_absent_optionals() {
    let ctx = test_ctx::ctx_with("true", WardenConfig::default());
    let value = run(&ctx).await.unwrap();
    assert!(value["config"].get("fallbackModel").is_none());
    assert!(value["config"].get("defaultAgent").is_none());
}
