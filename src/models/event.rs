//! Internal agent events as produced by the agent runtime.
//!
//! Events arrive as JSON objects tagged by `kind`. Any `kind` this crate does
//! not know decodes to [`AgentEvent::Unknown`] so newer runtimes keep working.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::plan::TaskItem;

/// Who produced a message event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    /// The language model / agent.
    Agent,
    /// The human user of the client.
    User,
    /// The execution environment.
    Environment,
}

/// A chat message event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageEvent {
    /// Message origin.
    pub source: EventSource,
    /// Concatenated text content of the message.
    #[serde(default)]
    pub text: String,
}

/// The agent is invoking a tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionEvent {
    /// Correlation key shared with the matching observation.
    pub tool_call_id: String,
    /// Name of the invoked tool.
    pub tool_name: String,
    /// Free-form thought fragments emitted alongside the call.
    #[serde(default)]
    pub thought: Vec<String>,
    /// Model reasoning text, when the model exposes it.
    #[serde(default)]
    pub reasoning_content: Option<String>,
    /// Structured action payload.
    #[serde(default)]
    pub action: Value,
    /// Raw JSON-encoded tool arguments as sent by the model.
    #[serde(default)]
    pub arguments: Option<String>,
}

impl ActionEvent {
    /// Human-readable title: the payload's `title` when present, else the tool name.
    #[must_use]
    pub fn title(&self) -> String {
        self.action
            .get("title")
            .and_then(Value::as_str)
            .filter(|t| !t.trim().is_empty())
            .map_or_else(|| self.tool_name.clone(), str::to_owned)
    }

    /// Tool input in structured form.
    ///
    /// Prefers the parsed argument string; falls back to the raw string when
    /// it is not valid JSON, then to the action payload.
    #[must_use]
    pub fn raw_input(&self) -> Option<Value> {
        if let Some(arguments) = &self.arguments {
            return Some(
                serde_json::from_str(arguments).unwrap_or_else(|_| Value::String(arguments.clone())),
            );
        }
        if self.action.is_null() {
            None
        } else {
            Some(self.action.clone())
        }
    }
}

/// A tool produced a result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObservationEvent {
    /// Correlation key of the originating action.
    pub tool_call_id: String,
    /// Name of the tool that produced the result.
    #[serde(default)]
    pub tool_name: String,
    /// Structured observation payload.
    #[serde(default)]
    pub observation: Value,
    /// Task list carried by task-tracker observations.
    #[serde(default)]
    pub task_list: Option<Vec<TaskItem>>,
}

/// A tool invocation failed inside the agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentErrorEvent {
    /// Correlation key of the originating action.
    pub tool_call_id: String,
    /// Name of the tool that failed.
    #[serde(default)]
    pub tool_name: String,
    /// Error description.
    pub error: String,
}

impl AgentErrorEvent {
    /// Structured form of the error payload used as the tool's raw output.
    #[must_use]
    pub fn payload(&self) -> Value {
        serde_json::json!({ "error": self.error })
    }
}

/// Internal event stream item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Chat message from the agent, user, or environment.
    Message(MessageEvent),
    /// The system prompt handed to the model.
    SystemPrompt {
        /// Prompt text; may be empty.
        #[serde(default)]
        text: String,
    },
    /// The conversation was paused.
    Pause,
    /// Older events were condensed out of the context window.
    Condensation {
        /// Identifiers of the events that were dropped.
        #[serde(default)]
        forgotten_event_ids: Vec<String>,
        /// Summary that replaces the dropped events.
        #[serde(default)]
        summary: Option<String>,
    },
    /// A condensation was requested.
    CondensationRequest,
    /// Internal conversation bookkeeping.
    ConversationStateUpdate {
        /// State key.
        #[serde(default)]
        key: String,
        /// New value.
        #[serde(default)]
        value: Value,
    },
    /// The agent invoked a tool.
    Action(ActionEvent),
    /// A tool returned a result.
    Observation(ObservationEvent),
    /// A tool invocation failed.
    AgentError(AgentErrorEvent),
    /// Event kind this crate does not recognise.
    #[serde(other)]
    Unknown,
}
