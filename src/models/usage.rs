//! Accumulated token usage and cost reported by the agent runtime.

use serde::{Deserialize, Serialize};

/// Point-in-time accumulated usage counters for one conversation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct UsageSnapshot {
    /// Prompt (input) tokens.
    #[serde(default)]
    pub prompt_tokens: u64,
    /// Completion (output) tokens.
    #[serde(default)]
    pub completion_tokens: u64,
    /// Prompt tokens served from the provider cache.
    #[serde(default)]
    pub cache_read_tokens: u64,
    /// Tokens spent on hidden reasoning.
    #[serde(default)]
    pub reasoning_tokens: u64,
    /// Accumulated cost in the provider's currency.
    #[serde(default)]
    pub accumulated_cost: f64,
}
