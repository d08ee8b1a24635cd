// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line framing over async streams.

use crate::{ToolRequest, ToolResponse};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Errors from reading or writing protocol frames.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("connection closed")]
    ConnectionClosed,

    #[error("invalid request: {0}")]
    InvalidRequest(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read the next request line.
///
/// Blank lines are skipped. Returns `ConnectionClosed` at EOF and
/// `InvalidRequest` for a line that is not a valid request document.
pub async fn read_request<R>(reader: &mut R) -> Result<ToolRequest, ProtocolError>
where
    R: AsyncBufReadExt + Unpin,
{
    let mut line = String::new();
    loop {
        line.clear();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            return Err(ProtocolError::ConnectionClosed);
        }
        if line.trim().is_empty() {
            continue;
        }
        return Ok(serde_json::from_str(line.trim())?);
    }
}

/// Write one response as an LF-terminated JSON line and flush.
pub async fn write_response<W>(
    writer: &mut W,
    response: &ToolResponse,
) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let mut frame = serde_json::to_string(response)?;
    frame.push('\n');
    writer.write_all(frame.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
#[path = "framing_tests.rs"]
mod tests;
