use std::collections::{BTreeMap, VecDeque};

use parking_lot::Mutex;
use pipeline::{
    AgentMetrics, AgentName, MetricsSnapshot, RelayConfig, Telemetry, Timestamp, TraceEntry,
};
use serde_json::Value;
use tracing::debug;

/// Per-agent counters. Durations are kept in a deque so a bounded history can
/// drop its oldest sample in O(1).
#[derive(Default)]
struct Counters {
    calls: BTreeMap<AgentName, u64>,
    errors: BTreeMap<AgentName, u64>,
    durations: BTreeMap<AgentName, VecDeque<u64>>,
}

impl Counters {
    fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            calls: self.calls.clone(),
            errors: self.errors.clone(),
            durations: self
                .durations
                .iter()
                .map(|(agent, samples)| (agent.clone(), samples.iter().copied().collect()))
                .collect(),
        }
    }
}

/// Thread-safe in-memory trace log and metrics recorder.
///
/// The trace buffer holds at most `capacity` entries; appending to a full
/// buffer evicts the oldest entry first. Duration samples are unbounded unless
/// a per-agent limit is configured.
pub struct TelemetryStore {
    capacity: usize,
    max_duration_samples: Option<usize>,
    traces: Mutex<VecDeque<TraceEntry>>,
    counters: Mutex<Counters>,
}

impl TelemetryStore {
    /// Creates a store retaining at most `capacity` trace entries.
    ///
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            max_duration_samples: None,
            traces: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            counters: Mutex::new(Counters::default()),
        }
    }

    /// Creates a store sized from `config`.
    pub fn from_config(config: &RelayConfig) -> Self {
        let store = Self::new(config.trace_capacity);
        match config.max_duration_samples {
            Some(limit) => store.with_max_duration_samples(limit),
            None => store,
        }
    }

    /// Caps the number of duration samples kept per agent.
    #[must_use]
    pub fn with_max_duration_samples(mut self, limit: usize) -> Self {
        self.max_duration_samples = Some(limit.max(1));
        self
    }

    /// Maximum number of retained trace entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of trace entries currently retained.
    pub fn trace_count(&self) -> usize {
        self.traces.lock().len()
    }
}

impl Default for TelemetryStore {
    fn default() -> Self {
        Self::new(pipeline::DEFAULT_TRACE_CAPACITY)
    }
}

impl Telemetry for TelemetryStore {
    fn trace(&self, agent: &AgentName, event: &str, data: Option<Value>) {
        debug!(target: "telemetry", agent = %agent, event, data = ?data, "trace");
        let entry = TraceEntry {
            timestamp: Timestamp::now(),
            agent: agent.clone(),
            event: event.to_string(),
            data,
        };
        let mut traces = self.traces.lock();
        while traces.len() >= self.capacity {
            traces.pop_front();
        }
        traces.push_back(entry);
    }

    fn record_call(&self, agent: &AgentName) {
        *self.counters.lock().calls.entry(agent.clone()).or_insert(0) += 1;
    }

    fn record_error(&self, agent: &AgentName) {
        *self.counters.lock().errors.entry(agent.clone()).or_insert(0) += 1;
    }

    fn record_duration(&self, agent: &AgentName, ms: u64) {
        let mut counters = self.counters.lock();
        let samples = counters.durations.entry(agent.clone()).or_default();
        if let Some(limit) = self.max_duration_samples {
            while samples.len() >= limit {
                samples.pop_front();
            }
        }
        samples.push_back(ms);
    }

    fn traces(&self) -> Vec<TraceEntry> {
        self.traces.lock().iter().cloned().collect()
    }

    fn recent_traces(&self, n: usize) -> Vec<TraceEntry> {
        let traces = self.traces.lock();
        let skip = traces.len().saturating_sub(n);
        traces.iter().skip(skip).cloned().collect()
    }

    fn agent_traces(&self, agent: &AgentName) -> Vec<TraceEntry> {
        self.traces
            .lock()
            .iter()
            .filter(|t| &t.agent == agent)
            .cloned()
            .collect()
    }

    fn traces_in_range(&self, start: Timestamp, end: Timestamp) -> Vec<TraceEntry> {
        self.traces
            .lock()
            .iter()
            .filter(|t| t.timestamp >= start && t.timestamp <= end)
            .cloned()
            .collect()
    }

    fn all_metrics(&self) -> MetricsSnapshot {
        self.counters.lock().snapshot()
    }

    fn agent_metrics(&self, agent: &AgentName) -> AgentMetrics {
        let counters = self.counters.lock();
        AgentMetrics {
            calls: counters.calls.get(agent).copied().unwrap_or(0),
            errors: counters.errors.get(agent).copied().unwrap_or(0),
            durations: counters
                .durations
                .get(agent)
                .map(|d| d.iter().copied().collect())
                .unwrap_or_default(),
        }
    }

    fn reset_metrics(&self) {
        *self.counters.lock() = Counters::default();
    }

    fn clear_traces(&self) {
        self.traces.lock().clear();
    }
}
