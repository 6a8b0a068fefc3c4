//! Reader tasks for the two inbound NDJSON streams.
//!
//! - [`run_runtime_reader`] consumes the agent runtime's stdout, where every
//!   line is an envelope addressed to one session carrying an internal
//!   event, a usage snapshot, or a turn-complete marker.
//! - [`run_client_reader`] consumes the ACP client's JSON-RPC stream.
//!
//! Both are driven by [`FramedRead`] over [`NdjsonCodec`]. Malformed lines
//! are logged and skipped; they never terminate a reader. After a framing
//! error `FramedRead` yields `None` once before it resumes reading, so that
//! `None` is not taken as EOF.

use futures_util::StreamExt;
use serde::Deserialize;
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::acp::codec::NdjsonCodec;
use crate::acp::rpc::{parse_client_line, ClientMessage};
use crate::models::event::AgentEvent;
use crate::models::usage::UsageSnapshot;
use crate::{AppError, Result};

/// Stop reason reported when the runtime omits one.
const DEFAULT_STOP_REASON: &str = "end_turn";

#[derive(Debug, Deserialize)]
struct TurnComplete {
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RuntimeEnvelope {
    session_id: String,
    #[serde(default)]
    event: Option<AgentEvent>,
    #[serde(default)]
    usage: Option<UsageSnapshot>,
    #[serde(default)]
    turn_complete: Option<TurnComplete>,
}

/// One decoded message from the agent runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeMessage {
    /// Internal event for a session.
    Event {
        /// Owning session.
        session_id: String,
        /// The event.
        event: AgentEvent,
    },
    /// Latest accumulated usage for a session.
    Usage {
        /// Owning session.
        session_id: String,
        /// Usage counters.
        usage: UsageSnapshot,
    },
    /// The current prompt turn of a session ended.
    TurnComplete {
        /// Owning session.
        session_id: String,
        /// ACP stop reason (`end_turn`, `cancelled`, …).
        stop_reason: String,
    },
    /// The runtime stream closed.
    Exited {
        /// Human-readable reason.
        reason: String,
    },
}

/// Parse one NDJSON line from the runtime.
///
/// Returns `Ok(None)` for blank lines and envelopes without a payload.
///
/// # Errors
///
/// Returns [`AppError::Acp`]`("malformed json: …")` when the line is not a
/// valid envelope.
pub fn parse_runtime_line(line: &str) -> Result<Option<RuntimeMessage>> {
    if line.trim().is_empty() {
        return Ok(None);
    }

    let envelope: RuntimeEnvelope =
        serde_json::from_str(line).map_err(|e| AppError::Acp(format!("malformed json: {e}")))?;
    let session_id = envelope.session_id;

    if let Some(event) = envelope.event {
        return Ok(Some(RuntimeMessage::Event { session_id, event }));
    }
    if let Some(usage) = envelope.usage {
        return Ok(Some(RuntimeMessage::Usage { session_id, usage }));
    }
    if let Some(turn) = envelope.turn_complete {
        return Ok(Some(RuntimeMessage::TurnComplete {
            session_id,
            stop_reason: turn
                .stop_reason
                .unwrap_or_else(|| DEFAULT_STOP_REASON.to_owned()),
        }));
    }

    debug!(session_id, "runtime reader: envelope without payload, skipping");
    Ok(None)
}

/// Runtime reader task.
///
/// Emits [`RuntimeMessage::Exited`] on EOF or unrecoverable I/O error and
/// returns. Exits quietly on cancellation.
///
/// # Errors
///
/// Always returns `Ok(())`; failures are reported through `tx`.
pub async fn run_runtime_reader<R>(
    stdout: R,
    tx: mpsc::Sender<RuntimeMessage>,
    cancel: CancellationToken,
) -> Result<()>
where
    R: AsyncRead + Unpin + Send,
{
    let mut framed = FramedRead::new(stdout, NdjsonCodec::new());
    let mut resume_after_error = false;

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!("runtime reader: cancellation received, stopping");
                break;
            }

            item = framed.next() => {
                match item {
                    None if resume_after_error => {
                        resume_after_error = false;
                    }
                    None => {
                        debug!("runtime reader: EOF detected");
                        send_exited(&tx, "stream closed").await;
                        break;
                    }
                    Some(Err(AppError::Acp(ref msg))) => {
                        warn!(error = msg.as_str(), "runtime reader: framing error, skipping");
                        resume_after_error = true;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "runtime reader: IO error, stopping");
                        send_exited(&tx, &format!("stream error: {e}")).await;
                        break;
                    }
                    Some(Ok(line)) => {
                        resume_after_error = false;
                        match parse_runtime_line(&line) {
                            Ok(Some(message)) => {
                                if tx.send(message).await.is_err() {
                                    debug!("runtime reader: receiver closed, stopping");
                                    break;
                                }
                            }
                            Ok(None) => {}
                            Err(e) => {
                                warn!(error = %e, raw_line = %line, "runtime reader: parse error, skipping line");
                            }
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

/// Client reader task.
///
/// Returns on EOF, unrecoverable I/O error, cancellation, or when `tx` is
/// closed. Dropping `tx` on return tells the consumer the client is gone.
///
/// # Errors
///
/// Always returns `Ok(())`.
pub async fn run_client_reader<R>(
    stdin: R,
    tx: mpsc::Sender<ClientMessage>,
    cancel: CancellationToken,
) -> Result<()>
where
    R: AsyncRead + Unpin + Send,
{
    let mut framed = FramedRead::new(stdin, NdjsonCodec::new());
    let mut resume_after_error = false;

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!("client reader: cancellation received, stopping");
                break;
            }

            item = framed.next() => {
                match item {
                    None if resume_after_error => {
                        resume_after_error = false;
                    }
                    None => {
                        debug!("client reader: EOF detected");
                        break;
                    }
                    Some(Err(AppError::Acp(ref msg))) => {
                        warn!(error = msg.as_str(), "client reader: framing error, skipping");
                        resume_after_error = true;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "client reader: IO error, stopping");
                        break;
                    }
                    Some(Ok(line)) => {
                        resume_after_error = false;
                        match parse_client_line(&line) {
                            Ok(Some(message)) => {
                                if tx.send(message).await.is_err() {
                                    debug!("client reader: receiver closed, stopping");
                                    break;
                                }
                            }
                            Ok(None) => {}
                            Err(e) => {
                                warn!(error = %e, "client reader: parse error, skipping line");
                            }
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

async fn send_exited(tx: &mpsc::Sender<RuntimeMessage>, reason: &str) {
    let message = RuntimeMessage::Exited {
        reason: reason.to_owned(),
    };
    if tx.send(message).await.is_err() {
        debug!("runtime reader: receiver closed before exit could be delivered");
    }
}
