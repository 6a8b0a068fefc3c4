//! Client ↔ runtime dispatch.
//!
//! [`Bridge`] is the single consumer of both inbound streams. Client
//! requests become runtime commands; runtime messages are routed to session
//! runners. A `session/prompt` request stays unanswered until the runtime
//! reports `turn_complete` for that session, and the reply is only written
//! after the session's runner has emitted everything routed before it.
//!
//! Runtime messages for sessions that were never opened through
//! `session/new` are dropped, so every runner belongs to a client session.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::acp::reader::RuntimeMessage;
use crate::acp::rpc::{
    error_response, initialize_result, success_response, ClientMessage, INTERNAL_ERROR,
    INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND,
};
use crate::driver::AgentRuntime;
use crate::models::content::PromptBlock;
use crate::resources::ResourceMaterializer;
use crate::{AppError, Result};

use super::registry::SessionRegistry;
use super::session_runner::SessionInput;

/// Dispatch state shared by the client and runtime sides.
pub struct Bridge {
    runtime: Arc<dyn AgentRuntime>,
    materializer: ResourceMaterializer,
    registry: SessionRegistry,
    client_tx: mpsc::Sender<Value>,
    /// `session_id` → id of the `session/prompt` request awaiting its turn end.
    pending_prompts: HashMap<String, Value>,
}

impl Bridge {
    /// Assemble a bridge. Replies go out through `client_tx`.
    #[must_use]
    pub fn new(
        runtime: Arc<dyn AgentRuntime>,
        materializer: ResourceMaterializer,
        registry: SessionRegistry,
        client_tx: mpsc::Sender<Value>,
    ) -> Self {
        Self {
            runtime,
            materializer,
            registry,
            client_tx,
            pending_prompts: HashMap::new(),
        }
    }

    /// Number of prompt requests still waiting for their turn to end.
    #[must_use]
    pub fn pending_prompt_count(&self) -> usize {
        self.pending_prompts.len()
    }

    /// Dispatch loop.
    ///
    /// Runs until cancellation, client EOF, or runtime exit. Session runners
    /// are drained and outstanding prompt requests failed before returning.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Acp`] if the client stream closes while a reply
    /// is being written.
    pub async fn run(
        mut self,
        mut client_rx: mpsc::Receiver<ClientMessage>,
        mut runtime_rx: mpsc::Receiver<RuntimeMessage>,
        cancel: CancellationToken,
    ) -> Result<()> {
        let outcome = loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    info!("bridge: cancellation received");
                    break Ok(());
                }

                msg = runtime_rx.recv() => {
                    let Some(msg) = msg else {
                        info!("bridge: runtime channel closed");
                        break Ok(());
                    };
                    match self.handle_runtime(msg).await {
                        Ok(true) => {}
                        Ok(false) => break Ok(()),
                        Err(err) => break Err(err),
                    }
                }

                msg = client_rx.recv() => {
                    let Some(msg) = msg else {
                        info!("bridge: client disconnected");
                        break Ok(());
                    };
                    if let Err(err) = self.handle_client(msg).await {
                        break Err(err);
                    }
                }
            }
        };

        // Drain runners first so their updates precede the failure replies.
        self.registry.shutdown().await;
        self.fail_pending("agent runtime stopped before the turn completed")
            .await;
        outcome
    }

    /// Handle one client message.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Acp`] only when the reply cannot be written.
    pub async fn handle_client(&mut self, msg: ClientMessage) -> Result<()> {
        match msg {
            ClientMessage::Initialize {
                id,
                protocol_version,
            } => {
                self.reply(success_response(id, initialize_result(protocol_version)))
                    .await
            }
            ClientMessage::NewSession { id, cwd } => self.open_session(id, cwd).await,
            ClientMessage::Prompt {
                id,
                session_id,
                prompt,
            } => self.start_prompt(id, &session_id, &prompt).await,
            ClientMessage::Cancel { session_id } => {
                if let Err(err) = self.runtime.cancel(&session_id).await {
                    warn!(session_id, %err, "bridge: cancel not delivered");
                }
                Ok(())
            }
            ClientMessage::InvalidParams { id, message } => {
                self.reply(error_response(id, INVALID_PARAMS, &message)).await
            }
            ClientMessage::UnknownRequest { id, method } => {
                debug!(method, "bridge: unknown request");
                self.reply(error_response(
                    id,
                    METHOD_NOT_FOUND,
                    &format!("method not found: {method}"),
                ))
                .await
            }
        }
    }

    /// Handle one runtime message. Returns `false` once the runtime is gone.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Acp`] only when a prompt reply cannot be written.
    pub async fn handle_runtime(&mut self, msg: RuntimeMessage) -> Result<bool> {
        if let RuntimeMessage::Event { session_id, .. } | RuntimeMessage::Usage { session_id, .. } =
            &msg
        {
            if !self.runtime.has_session(session_id).await {
                warn!(session_id, "bridge: message for unopened session dropped");
                return Ok(true);
            }
        }

        match msg {
            RuntimeMessage::Event { session_id, event } => {
                if let Err(err) = self.registry.route(&session_id, SessionInput::Event(event)).await {
                    warn!(session_id, %err, "bridge: event dropped");
                }
            }
            RuntimeMessage::Usage { session_id, usage } => {
                if let Err(err) = self.registry.route(&session_id, SessionInput::Usage(usage)).await {
                    warn!(session_id, %err, "bridge: usage dropped");
                }
            }
            RuntimeMessage::TurnComplete {
                session_id,
                stop_reason,
            } => {
                if let Err(err) = self.registry.barrier(&session_id).await {
                    warn!(session_id, %err, "bridge: session flush failed");
                }
                match self.pending_prompts.remove(&session_id) {
                    Some(id) => {
                        info!(session_id, stop_reason, "bridge: prompt turn complete");
                        self.reply(success_response(id, json!({ "stopReason": stop_reason })))
                            .await?;
                    }
                    None => debug!(session_id, "bridge: turn complete without pending prompt"),
                }
            }
            RuntimeMessage::Exited { reason } => {
                warn!(reason, "bridge: agent runtime exited");
                return Ok(false);
            }
        }
        Ok(true)
    }

    // ── Private helpers ─────────────────────────────────────────────────

    async fn open_session(&mut self, id: Value, cwd: Option<String>) -> Result<()> {
        let session_id = uuid::Uuid::new_v4().to_string();
        match self.runtime.new_session(&session_id, cwd).await {
            Ok(()) => {
                info!(session_id, "bridge: session created");
                self.reply(success_response(id, json!({ "sessionId": session_id })))
                    .await
            }
            Err(err) => {
                self.reply(error_response(id, INTERNAL_ERROR, &err.to_string()))
                    .await
            }
        }
    }

    async fn start_prompt(&mut self, id: Value, session_id: &str, prompt: &[PromptBlock]) -> Result<()> {
        if self.pending_prompts.contains_key(session_id) {
            return self
                .reply(error_response(
                    id,
                    INVALID_REQUEST,
                    &format!("session '{session_id}' already has a prompt in progress"),
                ))
                .await;
        }

        if !self.runtime.has_session(session_id).await {
            let err = AppError::NotFound(format!("session '{session_id}' is not open"));
            return self
                .reply(error_response(id, INVALID_PARAMS, &err.to_string()))
                .await;
        }

        let content = match self.materializer.materialize_all(prompt) {
            Ok(content) => content,
            Err(err) => {
                warn!(session_id, %err, "bridge: prompt rejected");
                return self
                    .reply(error_response(id, INVALID_PARAMS, &err.to_string()))
                    .await;
            }
        };

        match self.runtime.send_prompt(session_id, content).await {
            Ok(()) => {
                debug!(session_id, "bridge: prompt forwarded");
                self.pending_prompts.insert(session_id.to_owned(), id);
                Ok(())
            }
            Err(err @ AppError::NotFound(_)) => {
                self.reply(error_response(id, INVALID_PARAMS, &err.to_string()))
                    .await
            }
            Err(err) => {
                self.reply(error_response(id, INTERNAL_ERROR, &err.to_string()))
                    .await
            }
        }
    }

    async fn fail_pending(&mut self, message: &str) {
        for (session_id, id) in self.pending_prompts.drain() {
            debug!(session_id, "bridge: failing pending prompt");
            if self
                .client_tx
                .send(error_response(id, INTERNAL_ERROR, message))
                .await
                .is_err()
            {
                break;
            }
        }
    }

    async fn reply(&self, frame: Value) -> Result<()> {
        self.client_tx
            .send(frame)
            .await
            .map_err(|_| AppError::Acp("write failed: client stream closed".into()))
    }
}
