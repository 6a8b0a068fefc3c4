//! NDJSON-over-stdin implementation of [`AgentRuntime`].
//!
//! Commands are serialised as single JSON objects and pushed onto the
//! runtime writer channel:
//!
//! ```json
//! {"command":"new_session","session_id":"…","cwd":"…","context":"…"}
//! {"command":"prompt","session_id":"…","content":[…]}
//! {"command":"cancel","session_id":"…"}
//! ```

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

use crate::driver::AgentRuntime;
use crate::models::content::ContentBlock;
use crate::resources::RESOURCE_GUIDANCE;
use crate::{AppError, Result};

/// Runtime driver writing commands to the runtime's stdin writer task.
#[derive(Debug, Clone)]
pub struct StdioRuntime {
    tx: mpsc::Sender<Value>,
    sessions: Arc<Mutex<HashSet<String>>>,
}

impl StdioRuntime {
    /// Create a driver that writes through `tx`.
    #[must_use]
    pub fn new(tx: mpsc::Sender<Value>) -> Self {
        Self {
            tx,
            sessions: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    async fn is_open(&self, session_id: &str) -> bool {
        self.sessions.lock().await.contains(session_id)
    }

    async fn send(&self, session_id: &str, msg: Value) -> Result<()> {
        self.tx.send(msg).await.map_err(|_| {
            warn!(session_id, "stdio runtime: send failed, stream closed");
            AppError::Acp(format!(
                "write failed: runtime stream closed for session '{session_id}'"
            ))
        })
    }
}

impl AgentRuntime for StdioRuntime {
    fn new_session(
        &self,
        session_id: &str,
        cwd: Option<String>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let session_id = session_id.to_owned();
        Box::pin(async move {
            let msg = json!({
                "command": "new_session",
                "session_id": session_id,
                "cwd": cwd,
                "context": RESOURCE_GUIDANCE,
            });
            self.send(&session_id, msg).await?;
            self.sessions.lock().await.insert(session_id.clone());
            debug!(session_id, "stdio runtime: session opened");
            Ok(())
        })
    }

    fn has_session(&self, session_id: &str) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        let session_id = session_id.to_owned();
        Box::pin(async move { self.is_open(&session_id).await })
    }

    fn send_prompt(
        &self,
        session_id: &str,
        content: Vec<ContentBlock>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let session_id = session_id.to_owned();
        Box::pin(async move {
            if !self.is_open(&session_id).await {
                return Err(AppError::NotFound(format!(
                    "session '{session_id}' is not open"
                )));
            }
            let msg = json!({
                "command": "prompt",
                "session_id": session_id,
                "content": content,
            });
            self.send(&session_id, msg).await
        })
    }

    fn cancel(&self, session_id: &str) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let session_id = session_id.to_owned();
        Box::pin(async move {
            if !self.is_open(&session_id).await {
                debug!(session_id, "stdio runtime: cancel on unknown session, no-op");
                return Ok(());
            }
            let msg = json!({ "command": "cancel", "session_id": session_id });
            self.send(&session_id, msg).await
        })
    }
}
