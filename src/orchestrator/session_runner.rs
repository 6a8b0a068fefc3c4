//! Per-session translation task.
//!
//! Each session gets one task that owns its [`SessionContext`]. Inputs
//! arrive over a bounded channel in runtime order; every translated
//! notification is handed to the emitter before the next input is read, so
//! per-session ordering holds end to end.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::emitter::SessionUpdateEmitter;
use crate::models::event::AgentEvent;
use crate::models::usage::UsageSnapshot;
use crate::translator::{EventTranslator, SessionContext};

/// Input to a session runner.
#[derive(Debug)]
pub enum SessionInput {
    /// Internal event to translate.
    Event(AgentEvent),
    /// Latest accumulated usage counters.
    Usage(UsageSnapshot),
    /// Acknowledged once every earlier input has been emitted.
    Barrier(oneshot::Sender<()>),
}

/// Spawn the runner task for `session_id`.
///
/// The task stops when the channel closes, when `cancel` fires, or when the
/// emitter reports the client is gone. It returns the final context.
#[must_use]
pub fn spawn_session_runner(
    session_id: String,
    translator: EventTranslator,
    rx: mpsc::Receiver<SessionInput>,
    emitter: Arc<dyn SessionUpdateEmitter>,
    cancel: CancellationToken,
) -> JoinHandle<SessionContext> {
    tokio::spawn(run_session(session_id, translator, rx, emitter, cancel))
}

/// Runner body; see [`spawn_session_runner`].
pub async fn run_session(
    session_id: String,
    translator: EventTranslator,
    mut rx: mpsc::Receiver<SessionInput>,
    emitter: Arc<dyn SessionUpdateEmitter>,
    cancel: CancellationToken,
) -> SessionContext {
    let mut ctx = SessionContext::new(session_id);
    info!(session_id = ctx.session_id(), "session runner started");

    loop {
        let input = tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!(session_id = ctx.session_id(), "session runner cancelled");
                break;
            }
            maybe_input = rx.recv() => {
                if let Some(input) = maybe_input { input } else {
                    debug!(session_id = ctx.session_id(), "session input closed");
                    break;
                }
            }
        };

        match input {
            SessionInput::Usage(usage) => ctx.set_usage(usage),
            SessionInput::Barrier(ack) => {
                if ack.send(()).is_err() {
                    debug!(session_id = ctx.session_id(), "barrier waiter went away");
                }
            }
            SessionInput::Event(event) => {
                let notifications = translator.handle(&mut ctx, &event);
                let mut delivered = true;
                for notification in notifications {
                    debug!(
                        session_id = ctx.session_id(),
                        update = notification.kind(),
                        "emitting session update"
                    );
                    if let Err(err) = emitter.emit(notification).await {
                        warn!(session_id = ctx.session_id(), %err, "emit failed, stopping runner");
                        delivered = false;
                        break;
                    }
                }
                if !delivered {
                    break;
                }
            }
        }
    }

    info!(
        session_id = ctx.session_id(),
        tool_calls = ctx.tool_call_count(),
        "session runner stopped"
    );
    ctx
}
