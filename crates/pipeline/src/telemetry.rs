//! The telemetry port.
//!
//! Every orchestration component writes traces and metrics through
//! [`Telemetry`]; the `telemetry` crate supplies the in-memory implementation.
//! Components hold an `Arc<dyn Telemetry>` so tests can inject isolated
//! instances.

use serde_json::Value;

use crate::{AgentMetrics, AgentName, MetricsSnapshot, Timestamp, TraceEntry};

/// Trace log and per-agent metrics sink.
///
/// Implementations must tolerate concurrent writers without corrupting the
/// ring buffer or counters. Every read returns an owned copy.
pub trait Telemetry: Send + Sync {
    /// Appends a trace entry, evicting the oldest entry when at capacity.
    fn trace(&self, agent: &AgentName, event: &str, data: Option<Value>);

    /// Increments the call counter for `agent`.
    fn record_call(&self, agent: &AgentName);

    /// Increments the error counter for `agent`.
    fn record_error(&self, agent: &AgentName);

    /// Appends a duration sample (milliseconds) for `agent`.
    fn record_duration(&self, agent: &AgentName, ms: u64);

    /// Every retained trace entry, oldest first.
    fn traces(&self) -> Vec<TraceEntry>;

    /// The last `n` trace entries, oldest first.
    fn recent_traces(&self, n: usize) -> Vec<TraceEntry>;

    /// Retained trace entries recorded for `agent`.
    fn agent_traces(&self, agent: &AgentName) -> Vec<TraceEntry>;

    /// Retained trace entries with `start <= timestamp <= end`.
    fn traces_in_range(&self, start: Timestamp, end: Timestamp) -> Vec<TraceEntry>;

    /// A copy of every counter and duration list.
    fn all_metrics(&self) -> MetricsSnapshot;

    /// A copy of the metrics for one agent.
    fn agent_metrics(&self, agent: &AgentName) -> AgentMetrics;

    /// Clears every counter and duration list.
    fn reset_metrics(&self);

    /// Empties the trace buffer.
    fn clear_traces(&self);
}
