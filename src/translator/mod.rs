//! Event → `session/update` translation.
//!
//! [`EventTranslator::handle`] consumes one internal event and returns the
//! ordered notifications it maps to. Per-session state (the tool-call table
//! and the latest usage snapshot) lives in a [`SessionContext`] owned by the
//! caller, so independent sessions never share mutable state.
//!
//! | Event                        | Output                                   |
//! |------------------------------|------------------------------------------|
//! | agent message, non-empty     | `agent_message_chunk`                    |
//! | user / environment message   | nothing                                  |
//! | system prompt, pause,        | `agent_thought_chunk`                    |
//! | condensation (+ request)     |                                          |
//! | conversation state update    | nothing                                  |
//! | action                       | thought chunks…, `tool_call`             |
//! | observation                  | `plan` (task lists), `tool_call_update`  |
//! | agent error                  | `tool_call_update` (failed)              |
//! | unknown                      | nothing                                  |

pub mod classifier;
pub mod metrics;

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::acp::notification::{SessionNotification, UpdateBody};
use crate::models::content::ContentBlock;
use crate::models::event::{
    ActionEvent, AgentErrorEvent, AgentEvent, EventSource, MessageEvent, ObservationEvent,
};
use crate::models::plan::plan_from_tasks;
use crate::models::tool_call::{ToolCallRecord, ToolCallStatus};
use crate::models::usage::UsageSnapshot;

use self::classifier::classify;
use self::metrics::MetricsSummary;

const PAUSE_NOTICE: &str = "Conversation paused.";
const CONDENSATION_REQUEST_NOTICE: &str =
    "Condensation requested: older events will be summarized to free context.";
const EMPTY_SYSTEM_PROMPT: &str = "System prompt configured.";

/// Mutable per-session translation state.
#[derive(Debug, Clone)]
pub struct SessionContext {
    session_id: String,
    tool_calls: HashMap<String, ToolCallRecord>,
    usage: Option<UsageSnapshot>,
}

impl SessionContext {
    /// Create an empty context for `session_id`.
    #[must_use]
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            tool_calls: HashMap::new(),
            usage: None,
        }
    }

    /// Session this context belongs to.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Look up a tool-call record.
    #[must_use]
    pub fn tool_call(&self, id: &str) -> Option<&ToolCallRecord> {
        self.tool_calls.get(id)
    }

    /// Number of tool calls seen in this session.
    #[must_use]
    pub fn tool_call_count(&self) -> usize {
        self.tool_calls.len()
    }

    /// Replace the latest usage snapshot.
    pub fn set_usage(&mut self, usage: UsageSnapshot) {
        self.usage = Some(usage);
    }

    /// Latest usage snapshot, if the runtime has reported one.
    #[must_use]
    pub fn usage(&self) -> Option<&UsageSnapshot> {
        self.usage.as_ref()
    }
}

/// Stateless translator; all state is passed in through [`SessionContext`].
#[derive(Debug, Clone, Copy)]
pub struct EventTranslator {
    emit_metrics: bool,
}

impl Default for EventTranslator {
    fn default() -> Self {
        Self::new(true)
    }
}

impl EventTranslator {
    /// Create a translator. With `emit_metrics` off no `_meta` block is
    /// attached even when usage is known.
    #[must_use]
    pub fn new(emit_metrics: bool) -> Self {
        Self { emit_metrics }
    }

    /// Translate one event into zero or more notifications, in emission order.
    pub fn handle(&self, ctx: &mut SessionContext, event: &AgentEvent) -> Vec<SessionNotification> {
        let bodies = match event {
            AgentEvent::Message(message) => message_bodies(message),
            AgentEvent::SystemPrompt { text } => {
                let rendered = if text.trim().is_empty() {
                    EMPTY_SYSTEM_PROMPT.to_owned()
                } else {
                    text.clone()
                };
                vec![thought(rendered)]
            }
            AgentEvent::Pause => vec![thought(PAUSE_NOTICE)],
            AgentEvent::Condensation {
                forgotten_event_ids,
                summary,
            } => vec![thought(render_condensation(
                forgotten_event_ids.len(),
                summary.as_deref(),
            ))],
            AgentEvent::CondensationRequest => vec![thought(CONDENSATION_REQUEST_NOTICE)],
            AgentEvent::ConversationStateUpdate { key, .. } => {
                debug!(
                    session_id = ctx.session_id.as_str(),
                    key = key.as_str(),
                    "state update suppressed"
                );
                Vec::new()
            }
            AgentEvent::Action(action) => action_bodies(ctx, action),
            AgentEvent::Observation(observation) => observation_bodies(ctx, observation),
            AgentEvent::AgentError(error) => error_bodies(ctx, error),
            AgentEvent::Unknown => {
                debug!(session_id = ctx.session_id.as_str(), "unrecognised event ignored");
                Vec::new()
            }
        };

        let meta = self.metadata(ctx);
        bodies
            .into_iter()
            .map(|body| SessionNotification::new(&ctx.session_id, body, meta.clone()))
            .collect()
    }

    fn metadata(&self, ctx: &SessionContext) -> Option<Map<String, Value>> {
        if !self.emit_metrics {
            return None;
        }
        ctx.usage
            .as_ref()
            .map(|usage| MetricsSummary::from_usage(usage).metadata())
    }
}

// ── Per-event mapping ───────────────────────────────────────────────────

fn message_bodies(message: &MessageEvent) -> Vec<UpdateBody> {
    match message.source {
        EventSource::Agent if !message.text.is_empty() => vec![UpdateBody::AgentMessageChunk {
            content: ContentBlock::text(message.text.clone()),
        }],
        _ => Vec::new(),
    }
}

fn action_bodies(ctx: &mut SessionContext, action: &ActionEvent) -> Vec<UpdateBody> {
    let mut bodies: Vec<UpdateBody> = action
        .thought
        .iter()
        .filter(|fragment| !fragment.is_empty())
        .map(|fragment| thought(fragment.clone()))
        .collect();

    if let Some(reasoning) = action.reasoning_content.as_deref().filter(|r| !r.is_empty()) {
        bodies.push(thought(reasoning));
    }

    let title = action.title();
    let raw_input = action.raw_input();

    if let Some(existing) = ctx.tool_calls.get_mut(&action.tool_call_id) {
        if existing.status().is_terminal() {
            warn!(
                session_id = ctx.session_id.as_str(),
                tool_call_id = action.tool_call_id.as_str(),
                "action reuses id of a finished tool call, not reannounced"
            );
            return bodies;
        }
        existing.title = title;
        existing.raw_input = raw_input;
        bodies.push(tool_call_body(existing));
        return bodies;
    }

    let record = ToolCallRecord::started(
        action.tool_call_id.clone(),
        classify(&action.tool_name),
        title,
        raw_input,
    );
    bodies.push(tool_call_body(&record));
    ctx.tool_calls.insert(record.id.clone(), record);
    bodies
}

fn observation_bodies(ctx: &mut SessionContext, observation: &ObservationEvent) -> Vec<UpdateBody> {
    let mut bodies = Vec::new();

    if let Some(tasks) = &observation.task_list {
        bodies.push(UpdateBody::Plan {
            entries: plan_from_tasks(tasks),
        });
    }

    let raw_output = if observation.observation.is_null() {
        None
    } else {
        Some(observation.observation.clone())
    };

    let session_id = ctx.session_id.clone();
    let record = record_for_result(ctx, &observation.tool_call_id, &observation.tool_name);
    finish(record, ToolCallStatus::Completed, raw_output, &session_id);
    bodies.push(update_body(record));
    bodies
}

fn error_bodies(ctx: &mut SessionContext, error: &AgentErrorEvent) -> Vec<UpdateBody> {
    let session_id = ctx.session_id.clone();
    let record = record_for_result(ctx, &error.tool_call_id, &error.tool_name);
    finish(record, ToolCallStatus::Failed, Some(error.payload()), &session_id);
    vec![update_body(record)]
}

// ── Private helpers ─────────────────────────────────────────────────────

/// Find the record for a result, creating one when the action was never seen.
fn record_for_result<'a>(
    ctx: &'a mut SessionContext,
    tool_call_id: &str,
    tool_name: &str,
) -> &'a mut ToolCallRecord {
    let session_id = ctx.session_id.as_str();
    ctx.tool_calls
        .entry(tool_call_id.to_owned())
        .or_insert_with(|| {
            debug!(session_id, tool_call_id, "result for unseen tool call, creating record");
            ToolCallRecord::started(
                tool_call_id.to_owned(),
                classify(tool_name),
                tool_name.to_owned(),
                None,
            )
        })
}

fn finish(
    record: &mut ToolCallRecord,
    next: ToolCallStatus,
    raw_output: Option<Value>,
    session_id: &str,
) {
    if !record.finish(next, raw_output) {
        debug!(
            session_id,
            tool_call_id = record.id.as_str(),
            status = ?record.status(),
            "late result for finished tool call, status kept"
        );
    }
}

fn tool_call_body(record: &ToolCallRecord) -> UpdateBody {
    UpdateBody::ToolCall {
        tool_call_id: record.id.clone(),
        title: record.title.clone(),
        kind: record.kind(),
        status: record.status(),
        raw_input: record.raw_input.clone(),
    }
}

fn update_body(record: &ToolCallRecord) -> UpdateBody {
    UpdateBody::ToolCallUpdate {
        tool_call_id: record.id.clone(),
        status: record.status(),
        raw_output: record.raw_output.clone(),
    }
}

fn thought(text: impl Into<String>) -> UpdateBody {
    UpdateBody::AgentThoughtChunk {
        content: ContentBlock::text(text),
    }
}

fn render_condensation(forgotten: usize, summary: Option<&str>) -> String {
    let mut text = format!("Condensation: forgot {forgotten} event(s)");
    if let Some(summary) = summary.filter(|s| !s.trim().is_empty()) {
        text.push_str("\nSummary: ");
        text.push_str(summary);
    }
    text
}
