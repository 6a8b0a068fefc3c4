//! Task-list items and their ACP plan projection.

use serde::{Deserialize, Serialize};

/// Status of a task as tracked by the agent's task tracker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started.
    Todo,
    /// Currently being worked on.
    InProgress,
    /// Finished.
    Done,
    /// Any status string this crate does not recognise.
    #[serde(other)]
    Other,
}

/// One entry of the agent's task list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskItem {
    /// Task title.
    pub title: String,
    /// Free-form notes; not surfaced in plans.
    #[serde(default)]
    pub notes: String,
    /// Current status.
    pub status: TaskStatus,
}

/// Status of an ACP plan entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlanEntryStatus {
    /// Not started.
    Pending,
    /// Currently being worked on.
    InProgress,
    /// Finished.
    Completed,
}

impl From<TaskStatus> for PlanEntryStatus {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Done => Self::Completed,
            TaskStatus::InProgress => Self::InProgress,
            TaskStatus::Todo | TaskStatus::Other => Self::Pending,
        }
    }
}

/// Priority of an ACP plan entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlanEntryPriority {
    /// High priority.
    High,
    /// Medium priority.
    Medium,
    /// Low priority.
    Low,
}

/// One entry of an ACP plan snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanEntry {
    /// Entry text.
    pub content: String,
    /// Entry status.
    pub status: PlanEntryStatus,
    /// Entry priority. Task lists carry no priority, so this is always medium.
    pub priority: PlanEntryPriority,
}

impl From<&TaskItem> for PlanEntry {
    fn from(task: &TaskItem) -> Self {
        Self {
            content: task.title.clone(),
            status: task.status.into(),
            priority: PlanEntryPriority::Medium,
        }
    }
}

/// Build a full plan snapshot from a task list, preserving order.
#[must_use]
pub fn plan_from_tasks(tasks: &[TaskItem]) -> Vec<PlanEntry> {
    tasks.iter().map(PlanEntry::from).collect()
}
