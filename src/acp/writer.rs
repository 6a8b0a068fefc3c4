//! Writer task for outbound NDJSON streams.
//!
//! Receives JSON values from a tokio [`mpsc`] channel, serialises each to a
//! single line, and writes it to the sink. One writer owns each stream, so
//! the order values enter the channel is the order they reach the peer.

use serde_json::Value;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{AppError, Result};

/// NDJSON writer task.
///
/// `stream` names the sink in log lines (`client`, `runtime`). The task
/// exits when:
/// - `cancel` is triggered, or
/// - `rx` is closed (all senders dropped).
///
/// # Errors
///
/// - [`AppError::Acp`]`("failed to serialise outbound message: …")` if a
///   value cannot be serialised.
/// - [`AppError::Acp`]`("write failed: …")` if the sink rejects the write.
pub async fn run_writer<W>(
    stream: &'static str,
    sink: W,
    mut rx: mpsc::Receiver<Value>,
    cancel: CancellationToken,
) -> Result<()>
where
    W: AsyncWrite + Unpin + Send,
{
    let mut sink = sink;

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!(stream, "writer: cancellation received, stopping");
                break;
            }

            msg = rx.recv() => {
                let Some(value) = msg else {
                    debug!(stream, "writer: channel closed, stopping");
                    break;
                };

                let mut bytes = serde_json::to_vec(&value).map_err(|e| {
                    AppError::Acp(format!("failed to serialise outbound message: {e}"))
                })?;
                bytes.push(b'\n');

                sink.write_all(&bytes).await.map_err(|e| {
                    warn!(stream, error = %e, "writer: write failed");
                    AppError::Acp(format!("write failed: {e}"))
                })?;
                sink.flush().await.map_err(|e| {
                    AppError::Acp(format!("flush failed: {e}"))
                })?;
            }
        }
    }

    Ok(())
}
