//! Usage figures → metrics summary and status line.
//!
//! The summary is attached to outbound notifications under
//! [`METRICS_META_KEY`]. Nothing here holds state; every call recomputes
//! from the latest [`UsageSnapshot`].

use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::usage::UsageSnapshot;

/// Metadata key under which the summary is published.
pub const METRICS_META_KEY: &str = "openhands.dev/metrics";

const SEGMENT_SEPARATOR: &str = " • ";

/// Point-in-time usage and cost figures.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MetricsSummary {
    /// Prompt tokens consumed.
    pub input_tokens: u64,
    /// Completion tokens produced.
    pub output_tokens: u64,
    /// Prompt tokens served from cache.
    pub cache_read_tokens: u64,
    /// Reasoning tokens produced.
    pub reasoning_tokens: u64,
    /// Accumulated cost; never negative.
    pub cost: f64,
    /// Human-readable one-line rendering.
    pub status_line: String,
}

impl MetricsSummary {
    /// Derive a summary from the current usage counters.
    #[must_use]
    pub fn from_usage(usage: &UsageSnapshot) -> Self {
        Self {
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
            cache_read_tokens: usage.cache_read_tokens,
            reasoning_tokens: usage.reasoning_tokens,
            cost: clamp_cost(usage.accumulated_cost),
            status_line: format_status_line(usage),
        }
    }

    /// Metadata map carrying this summary under [`METRICS_META_KEY`].
    #[must_use]
    pub fn metadata(&self) -> Map<String, Value> {
        let mut meta = Map::new();
        let value = serde_json::to_value(self).unwrap_or(Value::Null);
        meta.insert(METRICS_META_KEY.to_owned(), value);
        meta
    }
}

/// Render a count as a plain integer below 1 000, else as `X.XXK` / `X.XXM`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn abbreviate(count: u64) -> String {
    if count >= 1_000_000 {
        format!("{:.2}M", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.2}K", count as f64 / 1_000.0)
    } else {
        count.to_string()
    }
}

/// Build the status line.
///
/// Segments, in order: input, output, cache hit rate (only with a non-zero
/// prompt count), reasoning (only when non-zero), cost. The cost keeps a
/// fractional part even when whole, so zero renders as `$0.0`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_status_line(usage: &UsageSnapshot) -> String {
    let mut segments = vec![
        format!("↑ input {}", abbreviate(usage.prompt_tokens)),
        format!("↓ output {}", abbreviate(usage.completion_tokens)),
    ];

    if usage.prompt_tokens > 0 {
        let rate = usage.cache_read_tokens as f64 / usage.prompt_tokens as f64 * 100.0;
        segments.push(format!("cache hit {rate:.2}%"));
    }

    if usage.reasoning_tokens > 0 {
        segments.push(format!("reasoning {}", abbreviate(usage.reasoning_tokens)));
    }

    segments.push(format!("${:?}", clamp_cost(usage.accumulated_cost)));
    segments.join(SEGMENT_SEPARATOR)
}

fn clamp_cost(cost: f64) -> f64 {
    if cost.is_finite() && cost > 0.0 {
        cost
    } else {
        0.0
    }
}
