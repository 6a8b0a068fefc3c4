//! Tool-call records tracked per session.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Client-facing classification of a tool, used for iconography.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Runs a command or code.
    Execute,
    /// Modifies files.
    Edit,
    /// Reads files or directories.
    Read,
    /// Searches the workspace.
    Search,
    /// Anything else.
    Other,
}

/// Lifecycle status of a tool call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallStatus {
    /// Announced but not started.
    Pending,
    /// Running.
    InProgress,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
}

impl ToolCallStatus {
    /// Whether the status is terminal.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// One outstanding or completed tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRecord {
    /// Correlation key supplied by the originating action.
    pub id: String,
    /// Classification, fixed at creation.
    kind: ToolKind,
    /// Current status.
    status: ToolCallStatus,
    /// Last-known title.
    pub title: String,
    /// Last-known tool input.
    pub raw_input: Option<Value>,
    /// Last-known tool output.
    pub raw_output: Option<Value>,
}

impl ToolCallRecord {
    /// Create a record that is already running.
    #[must_use]
    pub fn started(id: String, kind: ToolKind, title: String, raw_input: Option<Value>) -> Self {
        Self {
            id,
            kind,
            status: ToolCallStatus::InProgress,
            title,
            raw_input,
            raw_output: None,
        }
    }

    /// Classification assigned at creation.
    #[must_use]
    pub fn kind(&self) -> ToolKind {
        self.kind
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> ToolCallStatus {
        self.status
    }

    /// Record a result, moving to `next` unless the record is already terminal.
    ///
    /// A supplied output always replaces the previous one. Returns `false`
    /// when the status was left untouched because the record had already
    /// finished.
    pub fn finish(&mut self, next: ToolCallStatus, raw_output: Option<Value>) -> bool {
        if raw_output.is_some() {
            self.raw_output = raw_output;
        }
        if self.status.is_terminal() {
            return false;
        }
        self.status = next;
        true
    }
}
