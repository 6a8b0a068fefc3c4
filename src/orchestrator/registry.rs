//! Session runner registry.
//!
//! Runners are created lazily the first time a message for a session id is
//! routed. The bridge only routes ids opened through `session/new`. ACP has
//! no session close, so a runner lives until [`SessionRegistry::shutdown`].
//! The registry is only touched by the bridge's dispatch loop, so routing
//! order equals runtime arrival order.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::emitter::SessionUpdateEmitter;
use crate::translator::{EventTranslator, SessionContext};
use crate::{AppError, Result};

use super::session_runner::{spawn_session_runner, SessionInput};

struct RunnerHandle {
    tx: mpsc::Sender<SessionInput>,
    join: JoinHandle<SessionContext>,
}

/// Owns every live session runner.
pub struct SessionRegistry {
    translator: EventTranslator,
    emitter: Arc<dyn SessionUpdateEmitter>,
    buffer: usize,
    cancel: CancellationToken,
    runners: HashMap<String, RunnerHandle>,
}

impl SessionRegistry {
    /// Create an empty registry. `buffer` is each runner's channel depth.
    #[must_use]
    pub fn new(
        translator: EventTranslator,
        emitter: Arc<dyn SessionUpdateEmitter>,
        buffer: usize,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            translator,
            emitter,
            buffer: buffer.max(1),
            cancel,
            runners: HashMap::new(),
        }
    }

    /// Number of live runners.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.runners.len()
    }

    /// Whether a runner exists for `session_id`.
    #[must_use]
    pub fn contains(&self, session_id: &str) -> bool {
        self.runners.contains_key(session_id)
    }

    /// Route `input` to the runner for `session_id`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Acp`] if the runner has already stopped.
    pub async fn route(&mut self, session_id: &str, input: SessionInput) -> Result<()> {
        let tx = self.sender(session_id);
        tx.send(input).await.map_err(|_| {
            warn!(session_id, "registry: runner gone, input dropped");
            AppError::Acp(format!("session runner for '{session_id}' has stopped"))
        })
    }

    /// Wait until every input routed so far for `session_id` has been emitted.
    ///
    /// Returns immediately for sessions without a runner.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Acp`] if the runner stopped before acknowledging.
    pub async fn barrier(&mut self, session_id: &str) -> Result<()> {
        if !self.contains(session_id) {
            return Ok(());
        }
        let (ack_tx, ack_rx) = oneshot::channel();
        self.route(session_id, SessionInput::Barrier(ack_tx)).await?;
        ack_rx.await.map_err(|_| {
            AppError::Acp(format!(
                "session runner for '{session_id}' stopped before barrier"
            ))
        })
    }

    /// Close every runner's input and wait for them to drain.
    ///
    /// Returns the final contexts, in no particular order.
    pub async fn shutdown(&mut self) -> Vec<SessionContext> {
        let runners: Vec<(String, RunnerHandle)> = self.runners.drain().collect();
        info!(count = runners.len(), "registry: shutting down session runners");

        let mut contexts = Vec::with_capacity(runners.len());
        for (session_id, runner) in runners {
            drop(runner.tx);
            match runner.join.await {
                Ok(ctx) => contexts.push(ctx),
                Err(err) => warn!(session_id, %err, "registry: runner task failed"),
            }
        }
        contexts
    }

    fn sender(&mut self, session_id: &str) -> mpsc::Sender<SessionInput> {
        if let Some(runner) = self.runners.get(session_id) {
            return runner.tx.clone();
        }

        debug!(session_id, "registry: starting session runner");
        let (tx, rx) = mpsc::channel(self.buffer);
        let join = spawn_session_runner(
            session_id.to_owned(),
            self.translator,
            rx,
            Arc::clone(&self.emitter),
            self.cancel.child_token(),
        );
        self.runners.insert(
            session_id.to_owned(),
            RunnerHandle {
                tx: tx.clone(),
                join,
            },
        );
        tx
    }
}
