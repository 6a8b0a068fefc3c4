//! Agent runtime driver abstraction.
//!
//! The [`AgentRuntime`] trait decouples the client-facing bridge from the
//! process that actually runs the agent. Every command the client can cause
//! (open a session, send a prompt, cancel a turn) routes through this trait.

pub mod stdio_runtime;

use std::future::Future;
use std::pin::Pin;

use crate::models::content::ContentBlock;
use crate::Result;

/// Commands the bridge issues to the agent runtime.
pub trait AgentRuntime: Send + Sync {
    /// Open a new session with the given working directory.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Acp`](crate::AppError::Acp) if the runtime stream
    /// is closed.
    fn new_session(
        &self,
        session_id: &str,
        cwd: Option<String>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Whether `session_id` has been opened through this runtime.
    fn has_session(&self, session_id: &str) -> Pin<Box<dyn Future<Output = bool> + Send + '_>>;

    /// Start a prompt turn with already materialized content.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`](crate::AppError::NotFound) if
    /// `session_id` was never opened.
    /// Returns [`AppError::Acp`](crate::AppError::Acp) if the stream write fails.
    fn send_prompt(
        &self,
        session_id: &str,
        content: Vec<ContentBlock>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Cancel the session's current turn.
    ///
    /// Idempotent: cancelling an unknown session returns `Ok(())`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Acp`](crate::AppError::Acp) if the stream write
    /// fails for a known session.
    fn cancel(&self, session_id: &str) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}
