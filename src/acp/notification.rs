//! Outbound `session/update` notification payloads.
//!
//! Field names follow the ACP wire format (`sessionId`, `sessionUpdate`,
//! `toolCallId`, `rawInput`, `rawOutput`, `_meta`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::content::ContentBlock;
use crate::models::plan::PlanEntry;
use crate::models::tool_call::{ToolCallStatus, ToolKind};

/// Discriminated body of a session update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "sessionUpdate", rename_all = "snake_case")]
pub enum UpdateBody {
    /// Streamed assistant text.
    AgentMessageChunk {
        /// Text content.
        content: ContentBlock,
    },
    /// Streamed agent reasoning or status text.
    AgentThoughtChunk {
        /// Text content.
        content: ContentBlock,
    },
    /// A new tool call started.
    ToolCall {
        /// Correlation key.
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        /// Display title.
        title: String,
        /// Classification tag.
        kind: ToolKind,
        /// Always `in_progress` for newly announced calls.
        status: ToolCallStatus,
        /// Tool input.
        #[serde(rename = "rawInput", default, skip_serializing_if = "Option::is_none")]
        raw_input: Option<Value>,
    },
    /// An existing tool call changed.
    ToolCallUpdate {
        /// Correlation key.
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        /// New status.
        status: ToolCallStatus,
        /// Tool output.
        #[serde(rename = "rawOutput", default, skip_serializing_if = "Option::is_none")]
        raw_output: Option<Value>,
    },
    /// Full replacement of the agent's plan.
    Plan {
        /// Ordered plan entries.
        entries: Vec<PlanEntry>,
    },
}

/// A session update with its optional metadata block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionUpdate {
    /// Update body.
    #[serde(flatten)]
    pub body: UpdateBody,
    /// Namespaced metadata (metrics summary).
    #[serde(rename = "_meta", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

/// One `session/update` notification addressed to a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionNotification {
    /// Target session.
    #[serde(rename = "sessionId")]
    pub session_id: String,
    /// The update.
    pub update: SessionUpdate,
}

impl SessionNotification {
    /// Build a notification for `session_id` with optional metadata.
    #[must_use]
    pub fn new(session_id: &str, body: UpdateBody, meta: Option<Map<String, Value>>) -> Self {
        Self {
            session_id: session_id.to_owned(),
            update: SessionUpdate { body, meta },
        }
    }

    /// Wire discriminator of this notification (e.g. `tool_call_update`).
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self.update.body {
            UpdateBody::AgentMessageChunk { .. } => "agent_message_chunk",
            UpdateBody::AgentThoughtChunk { .. } => "agent_thought_chunk",
            UpdateBody::ToolCall { .. } => "tool_call",
            UpdateBody::ToolCallUpdate { .. } => "tool_call_update",
            UpdateBody::Plan { .. } => "plan",
        }
    }
}
