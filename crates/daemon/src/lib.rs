// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Warden daemon library.
//!
//! The `wardend` binary wires these pieces together: lifecycle builds
//! the collaborators, the server loop reads tool requests off stdin,
//! and the tools translate them into manager/runner calls.

pub mod env;
pub mod lifecycle;
pub mod server;
pub mod tools;

pub use lifecycle::{Daemon, DaemonConfig, LifecycleError};
pub use tools::{ToolCtx, ToolError};
