//! Delivery of translated notifications to the ACP client.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::warn;

use crate::acp::notification::SessionNotification;
use crate::acp::rpc::session_update_frame;
use crate::{AppError, Result};

/// Output sink for `session/update` notifications.
///
/// Implementations must deliver notifications in the order `emit` is called.
pub trait SessionUpdateEmitter: Send + Sync {
    /// Deliver one notification.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Acp`] when the transport is gone.
    fn emit(
        &self,
        notification: SessionNotification,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Emitter pushing framed notifications onto the client writer channel.
#[derive(Debug, Clone)]
pub struct ChannelEmitter {
    tx: mpsc::Sender<Value>,
}

impl ChannelEmitter {
    /// Create an emitter feeding `tx`.
    #[must_use]
    pub fn new(tx: mpsc::Sender<Value>) -> Self {
        Self { tx }
    }
}

impl SessionUpdateEmitter for ChannelEmitter {
    fn emit(
        &self,
        notification: SessionNotification,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let frame = session_update_frame(&notification)?;
            self.tx.send(frame).await.map_err(|_| {
                warn!(
                    session_id = notification.session_id.as_str(),
                    "emitter: client stream closed"
                );
                AppError::Acp("write failed: client stream closed".into())
            })
        })
    }
}
