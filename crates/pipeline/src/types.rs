//! Shared value types for the Relay domain.
//!
//! Everything that flows between the orchestration components and back to the
//! caller lives here: agent results, tasks, trace entries, and metrics
//! snapshots. None of these types carry behaviour beyond simple accessors; the
//! orchestration rules live in the `orchestrator` crate.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::AgentName;

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly; the underlying representation can change without affecting the
/// domain API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

// ---------------------------------------------------------------------------
// Agent results
// ---------------------------------------------------------------------------

/// Details of a failed agent invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentFailure {
    /// Human-readable description of what went wrong.
    pub message: String,

    /// The chain of underlying causes, if the original error had any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,

    /// The pipeline step that was running when the failure occurred.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
}

impl AgentFailure {
    /// Creates a failure with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: None,
            step: None,
        }
    }

    /// Attaches the cause chain.
    #[must_use]
    pub fn with_stack(mut self, stack: Option<String>) -> Self {
        self.stack = stack;
        self
    }
}

/// The outcome of exactly one agent invocation.
///
/// Every call through the agent contract produces one of these; nothing is
/// allowed to escape the boundary as an error or panic.
///
/// Serialized as a flat object tagged by `status` (`"success"`/`"failure"`)
/// with a redundant boolean `ok`. The `ok` key is ignored on input.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentResult<T = Value> {
    /// The agent produced output.
    Success {
        /// The agent that produced the result.
        agent: AgentName,
        /// When the result was produced.
        timestamp: Timestamp,
        /// The agent's output.
        data: T,
    },
    /// The agent (or the component trying to reach it) failed.
    Failure {
        /// The agent, or the catching component when no agent was reached.
        agent: AgentName,
        /// When the failure was recorded.
        timestamp: Timestamp,
        /// What went wrong.
        error: AgentFailure,
    },
}

impl<T> AgentResult<T> {
    /// Builds a [`AgentResult::Success`] stamped with the current time.
    pub fn success(agent: AgentName, data: T) -> Self {
        Self::Success {
            agent,
            timestamp: Timestamp::now(),
            data,
        }
    }

    /// Builds a [`AgentResult::Failure`] stamped with the current time.
    pub fn failure(agent: AgentName, error: AgentFailure) -> Self {
        Self::Failure {
            agent,
            timestamp: Timestamp::now(),
            error,
        }
    }

    /// Returns `true` for [`AgentResult::Success`].
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The agent tag carried by either variant.
    pub fn agent(&self) -> &AgentName {
        match self {
            Self::Success { agent, .. } | Self::Failure { agent, .. } => agent,
        }
    }

    /// When the result was produced.
    pub fn timestamp(&self) -> Timestamp {
        match self {
            Self::Success { timestamp, .. } | Self::Failure { timestamp, .. } => *timestamp,
        }
    }

    /// The output of a successful invocation.
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success { data, .. } => Some(data),
            Self::Failure { .. } => None,
        }
    }

    /// The failure details of an unsuccessful invocation.
    pub fn error(&self) -> Option<&AgentFailure> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(error),
        }
    }
}

impl<T: Serialize> Serialize for AgentResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("AgentResult", 5)?;
        match self {
            Self::Success {
                agent,
                timestamp,
                data,
            } => {
                state.serialize_field("status", "success")?;
                state.serialize_field("ok", &true)?;
                state.serialize_field("agent", agent)?;
                state.serialize_field("timestamp", timestamp)?;
                state.serialize_field("data", data)?;
            }
            Self::Failure {
                agent,
                timestamp,
                error,
            } => {
                state.serialize_field("status", "failure")?;
                state.serialize_field("ok", &false)?;
                state.serialize_field("agent", agent)?;
                state.serialize_field("timestamp", timestamp)?;
                state.serialize_field("error", error)?;
            }
        }
        state.end()
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for AgentResult<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match AgentResultRepr::<T>::deserialize(deserializer)? {
            AgentResultRepr::Success {
                agent,
                timestamp,
                data,
            } => Self::Success {
                agent,
                timestamp,
                data,
            },
            AgentResultRepr::Failure {
                agent,
                timestamp,
                error,
            } => Self::Failure {
                agent,
                timestamp,
                error,
            },
        })
    }
}

#[derive(Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum AgentResultRepr<T> {
    Success {
        agent: AgentName,
        timestamp: Timestamp,
        data: T,
    },
    Failure {
        agent: AgentName,
        timestamp: Timestamp,
        error: AgentFailure,
    },
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// An (agent name, input) pair submitted for execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Registry name of the agent to invoke.
    pub agent_name: AgentName,
    /// Payload handed to the agent's `process`.
    pub input: Value,
}

impl Task {
    /// Creates a new task.
    pub fn new(agent_name: AgentName, input: Value) -> Self {
        Self { agent_name, input }
    }
}

// ---------------------------------------------------------------------------
// Telemetry values
// ---------------------------------------------------------------------------

/// A timestamped record of an agent lifecycle event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// When the event was recorded.
    pub timestamp: Timestamp,
    /// The agent or component the event concerns.
    pub agent: AgentName,
    /// Event name (e.g. `"parallel_start"`).
    pub event: String,
    /// Optional structured payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Counters and duration samples for every agent seen so far.
///
/// A snapshot is an owned copy taken at read time; writes that land after the
/// copy are not reflected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Number of invocations per agent.
    pub calls: BTreeMap<AgentName, u64>,
    /// Number of failed invocations per agent.
    pub errors: BTreeMap<AgentName, u64>,
    /// Invocation durations per agent, in milliseconds, oldest first.
    pub durations: BTreeMap<AgentName, Vec<u64>>,
}

impl MetricsSnapshot {
    /// Extracts the slice of this snapshot belonging to one agent.
    pub fn agent(&self, agent: &AgentName) -> AgentMetrics {
        AgentMetrics {
            calls: self.calls.get(agent).copied().unwrap_or(0),
            errors: self.errors.get(agent).copied().unwrap_or(0),
            durations: self.durations.get(agent).cloned().unwrap_or_default(),
        }
    }
}

/// Metrics for a single agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentMetrics {
    /// Number of invocations.
    pub calls: u64,
    /// Number of failed invocations.
    pub errors: u64,
    /// Invocation durations in milliseconds, oldest first.
    pub durations: Vec<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn name(s: &str) -> AgentName {
        AgentName::new(s).unwrap()
    }

    #[test]
    fn success_exposes_data() {
        let result = AgentResult::success(name("content"), json!({"x": 1}));
        assert!(result.is_ok());
        assert_eq!(result.data(), Some(&json!({"x": 1})));
        assert!(result.error().is_none());
        assert_eq!(result.agent().as_str(), "content");
    }

    #[test]
    fn failure_exposes_error() {
        let result: AgentResult =
            AgentResult::failure(name("sales"), AgentFailure::new("no leads"));
        assert!(!result.is_ok());
        assert_eq!(result.error().map(|e| e.message.as_str()), Some("no leads"));
        assert!(result.data().is_none());
    }

    #[test]
    fn results_serialize_with_status_tag() {
        let result = AgentResult::success(name("admin"), json!(7));
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["ok"], true);
        assert_eq!(value["agent"], "admin");
        assert_eq!(value["data"], 7);
    }

    #[test]
    fn failures_serialize_with_ok_false() {
        let result: AgentResult =
            AgentResult::failure(name("sales"), AgentFailure::new("no leads"));
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["status"], "failure");
        assert_eq!(value["ok"], false);
        assert_eq!(value["error"]["message"], "no leads");

        let back: AgentResult = serde_json::from_value(value).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn tasks_with_empty_agent_names_are_rejected() {
        let err = serde_json::from_value::<Task>(json!({"agent_name": "", "input": 1}));
        assert!(err.is_err());
    }

    #[test]
    fn agent_metrics_default_to_zero() {
        let snapshot = MetricsSnapshot::default();
        assert_eq!(snapshot.agent(&name("ghost")), AgentMetrics::default());
    }
}
