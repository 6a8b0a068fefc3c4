//! JSON-RPC 2.0 messages exchanged with the ACP client.
//!
//! # Known inbound methods
//!
//! | Method            | Maps to                            |
//! |-------------------|------------------------------------|
//! | `initialize`      | [`ClientMessage::Initialize`]      |
//! | `session/new`     | [`ClientMessage::NewSession`]      |
//! | `session/prompt`  | [`ClientMessage::Prompt`]          |
//! | `session/cancel`  | [`ClientMessage::Cancel`]          |
//! | *(other request)* | [`ClientMessage::UnknownRequest`]  |
//! | *(other notice)*  | `None`; logged at `DEBUG`          |

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::acp::notification::SessionNotification;
use crate::models::content::PromptBlock;
use crate::{AppError, Result};

/// JSON-RPC error code: invalid request.
pub const INVALID_REQUEST: i64 = -32600;
/// JSON-RPC error code: method not found.
pub const METHOD_NOT_FOUND: i64 = -32601;
/// JSON-RPC error code: invalid params.
pub const INVALID_PARAMS: i64 = -32602;
/// JSON-RPC error code: internal error.
pub const INTERNAL_ERROR: i64 = -32603;

/// Protocol version reported when the client does not send one.
const DEFAULT_PROTOCOL_VERSION: u64 = 1;

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    id: Option<Value>,
    method: Option<String>,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewSessionParams {
    #[serde(default)]
    cwd: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptParams {
    session_id: String,
    prompt: Vec<PromptBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CancelParams {
    session_id: String,
}

/// A parsed client → agent message.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// `initialize` request.
    Initialize {
        /// Request id.
        id: Value,
        /// Version the client asked for.
        protocol_version: Value,
    },
    /// `session/new` request.
    NewSession {
        /// Request id.
        id: Value,
        /// Working directory for the session.
        cwd: Option<String>,
    },
    /// `session/prompt` request.
    Prompt {
        /// Request id.
        id: Value,
        /// Target session.
        session_id: String,
        /// Prompt content blocks.
        prompt: Vec<PromptBlock>,
    },
    /// `session/cancel` notification.
    Cancel {
        /// Target session.
        session_id: String,
    },
    /// Known request whose params failed to decode.
    InvalidParams {
        /// Request id.
        id: Value,
        /// Decode failure description.
        message: String,
    },
    /// Request for a method this agent does not implement.
    UnknownRequest {
        /// Request id.
        id: Value,
        /// Requested method.
        method: String,
    },
}

/// Parse one NDJSON line from the client.
///
/// Returns `Ok(None)` for blank lines, responses to requests the bridge never
/// sends, and notifications it does not handle.
///
/// # Errors
///
/// Returns [`AppError::Acp`]`("malformed json: …")` when the line is not JSON.
pub fn parse_client_line(line: &str) -> Result<Option<ClientMessage>> {
    if line.trim().is_empty() {
        return Ok(None);
    }

    let envelope: RpcEnvelope =
        serde_json::from_str(line).map_err(|e| AppError::Acp(format!("malformed json: {e}")))?;

    let Some(method) = envelope.method else {
        debug!("acp rpc: ignoring client message without method");
        return Ok(None);
    };

    let message = match (method.as_str(), envelope.id) {
        ("initialize", Some(id)) => ClientMessage::Initialize {
            id,
            protocol_version: envelope
                .params
                .get("protocolVersion")
                .cloned()
                .unwrap_or_else(|| json!(DEFAULT_PROTOCOL_VERSION)),
        },
        ("session/new", Some(id)) => {
            match serde_json::from_value::<NewSessionParams>(envelope.params) {
                Ok(params) => ClientMessage::NewSession { id, cwd: params.cwd },
                Err(e) => invalid_params(id, &method, &e),
            }
        }
        ("session/prompt", Some(id)) => {
            match serde_json::from_value::<PromptParams>(envelope.params) {
                Ok(params) => ClientMessage::Prompt {
                    id,
                    session_id: params.session_id,
                    prompt: params.prompt,
                },
                Err(e) => invalid_params(id, &method, &e),
            }
        }
        ("session/cancel", _) => {
            let params: CancelParams = serde_json::from_value(envelope.params)
                .map_err(|e| AppError::Acp(format!("invalid session/cancel params: {e}")))?;
            ClientMessage::Cancel {
                session_id: params.session_id,
            }
        }
        (_, Some(id)) => ClientMessage::UnknownRequest {
            id,
            method: method.clone(),
        },
        (other, None) => {
            debug!(method = other, "acp rpc: skipping unknown client notification");
            return Ok(None);
        }
    };

    Ok(Some(message))
}

fn invalid_params(id: Value, method: &str, err: &serde_json::Error) -> ClientMessage {
    ClientMessage::InvalidParams {
        id,
        message: format!("invalid {method} params: {err}"),
    }
}

/// Build a JSON-RPC success response.
#[must_use]
pub fn success_response(id: Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

/// Build a JSON-RPC error response.
#[must_use]
pub fn error_response(id: Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message }
    })
}

/// Result body for `initialize`.
#[must_use]
pub fn initialize_result(protocol_version: Value) -> Value {
    json!({
        "protocolVersion": protocol_version,
        "agentCapabilities": {
            "loadSession": false,
            "promptCapabilities": {
                "image": true,
                "audio": false,
                "embeddedContext": true
            }
        },
        "authMethods": []
    })
}

/// Frame a notification as a `session/update` JSON-RPC notification.
///
/// # Errors
///
/// Returns [`AppError::Acp`] if the notification cannot be serialised.
pub fn session_update_frame(notification: &SessionNotification) -> Result<Value> {
    Ok(json!({
        "jsonrpc": "2.0",
        "method": "session/update",
        "params": serde_json::to_value(notification)?,
    }))
}
