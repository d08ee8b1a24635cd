// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stdio request loop.
//!
//! One request per line in, one response per line out. Tool failures
//! become error responses; no request ever brings the loop down. The
//! loop ends on shutdown, stream close, or an unrecoverable I/O error.

use crate::tools::{self, ToolCtx};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;
use warden_wire::{read_request, write_response, ProtocolError, ToolRequest, ToolResponse};

/// Serve requests until the stream closes or shutdown is signalled.
///
/// Generic over the streams so tests can drive it with buffers.
pub async fn serve<R, W>(ctx: Arc<ToolCtx>, reader: R, mut writer: W, shutdown: CancellationToken)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = tokio::io::BufReader::new(reader);
    loop {
        tokio::select! {
            () = shutdown.cancelled() => {
                tracing::info!("shutdown requested, leaving request loop");
                break;
            }
            request = read_request(&mut reader) => {
                let response = match request {
                    Ok(request) => handle_request(&ctx, request).await,
                    Err(ProtocolError::ConnectionClosed) => {
                        tracing::info!("control stream closed");
                        break;
                    }
                    Err(ProtocolError::InvalidRequest(e)) => {
                        ToolResponse::error(0, error_content(&format!("invalid request: {e}")))
                    }
                    Err(ProtocolError::Io(e)) => {
                        tracing::error!(error = %e, "control stream read failed");
                        break;
                    }
                };
                if let Err(e) = write_response(&mut writer, &response).await {
                    tracing::error!(error = %e, "failed to write response");
                    break;
                }
            }
        }
    }
}

pub(crate) async fn handle_request(ctx: &ToolCtx, request: ToolRequest) -> ToolResponse {
    tracing::debug!(id = request.id, tool = %request.tool, "handling request");
    match tools::dispatch(ctx, &request.tool, &request.args).await {
        Ok(value) => ToolResponse::ok(request.id, value.to_string()),
        Err(e) => {
            tracing::debug!(id = request.id, tool = %request.tool, error = %e, "tool failed");
            ToolResponse::error(request.id, error_content(&e.to_string()))
        }
    }
}

fn error_content(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
