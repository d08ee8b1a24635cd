// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `wardend`: the Warden supervisor daemon.
//!
//! Serves the control protocol over stdin/stdout until the stream
//! closes or a shutdown signal arrives. Exit code 0 on clean shutdown,
//! 1 on fatal startup error; task failures never terminate the daemon.

use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use warden_daemon::{lifecycle, server, DaemonConfig};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match DaemonConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("wardend: {e}");
            return ExitCode::FAILURE;
        }
    };
    let _log_guard = lifecycle::init_tracing(&config);
    tracing::info!(state_dir = %config.state_dir.display(), "wardend starting");

    let daemon = lifecycle::startup(&config);
    spawn_signal_handler(daemon.shutdown.clone());

    server::serve(
        daemon.ctx.clone(),
        tokio::io::stdin(),
        tokio::io::stdout(),
        daemon.shutdown.clone(),
    )
    .await;

    daemon.shutdown().await;
    ExitCode::SUCCESS
}

/// Trip the shutdown token on interrupt, terminate, or hangup.
fn spawn_signal_handler(token: CancellationToken) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let signals = (
                signal(SignalKind::interrupt()),
                signal(SignalKind::terminate()),
                signal(SignalKind::hangup()),
            );
            match signals {
                (Ok(mut interrupt), Ok(mut terminate), Ok(mut hangup)) => {
                    tokio::select! {
                        _ = interrupt.recv() => tracing::info!("received SIGINT"),
                        _ = terminate.recv() => tracing::info!("received SIGTERM"),
                        _ = hangup.recv() => tracing::info!("received SIGHUP"),
                    }
                }
                _ => {
                    tracing::warn!("signal handler installation failed");
                    return;
                }
            }
        }
        #[cfg(not(unix))]
        {
            if tokio::signal::ctrl_c().await.is_err() {
                tracing::warn!("signal handler installation failed");
                return;
            }
            tracing::info!("received interrupt");
        }
        token.cancel();
    });
}
