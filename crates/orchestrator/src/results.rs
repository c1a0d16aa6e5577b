//! Result shapes returned to callers.
//!
//! Every shape carries `ok`, the per-item [`AgentResult`]s, the trace entries
//! recorded during the run, and a metrics snapshot taken when the run ended.
//! `ok` is true exactly when every contained result is a success.

use pipeline::{AgentName, AgentResult, MetricsSnapshot, StepName, TraceEntry};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub(crate) fn all_ok(results: &[AgentResult]) -> bool {
    results.iter().all(AgentResult::is_ok)
}

/// Outcome of one Parallel Executor call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParallelResult {
    /// `true` when every task succeeded.
    pub ok: bool,
    /// One result per task, in task order.
    pub results: Vec<AgentResult>,
    /// Trace entries recorded during the call.
    pub trace: Vec<TraceEntry>,
    /// Metrics as of the end of the call.
    pub metrics: MetricsSnapshot,
}

impl ParallelResult {
    pub(crate) fn new(
        results: Vec<AgentResult>,
        trace: Vec<TraceEntry>,
        metrics: MetricsSnapshot,
    ) -> Self {
        Self {
            ok: all_ok(&results),
            results,
            trace,
            metrics,
        }
    }
}

/// Terminal state of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    /// Every step succeeded.
    Completed,
    /// A step or parallel block failed; later stages never ran.
    Failed,
}

/// Lifecycle state of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    /// Not started (and, in a finished run, never will be).
    Pending,
    /// Dispatched and awaiting its result.
    Running,
    /// Produced a successful result.
    Succeeded,
    /// Produced a failure result.
    Failed,
}

/// Where one step ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    /// Step name.
    pub name: StepName,
    /// Final state.
    pub state: StepState,
}

/// Outcome of a sequential or parallel pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    /// `true` when every executed step succeeded.
    pub ok: bool,
    /// Terminal state of the run.
    pub status: PipelineStatus,
    /// Results of every executed step, in execution order.
    pub steps: Vec<AgentResult>,
    /// Per-step states in declaration order, including steps that never ran.
    pub states: Vec<StepReport>,
    /// Name of the failing step, or `parallel_block_<index>` for a block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<String>,
    /// Final output on success; the input of the failing stage otherwise.
    pub context: Value,
    /// Trace entries recorded during the run.
    pub trace: Vec<TraceEntry>,
    /// Metrics as of the end of the run.
    pub metrics: MetricsSnapshot,
}

/// Outcome of one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    /// `true` when every task in every chunk succeeded.
    pub ok: bool,
    /// Agent every input was sent to.
    pub agent: AgentName,
    /// One result per input, in input order.
    pub results: Vec<AgentResult>,
    /// Number of inputs.
    pub total_tasks: usize,
    /// Number of successful results.
    pub successful_tasks: usize,
    /// Number of failed results.
    pub failed_tasks: usize,
    /// Number of Parallel Executor calls the batch needed.
    pub chunks: usize,
    /// Size of each chunk, in execution order.
    pub chunk_sizes: Vec<usize>,
    /// Trace entries recorded during the batch.
    pub trace: Vec<TraceEntry>,
    /// Metrics as of the end of the batch.
    pub metrics: MetricsSnapshot,
}

/// Outcome of several batches run back to back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiBatchResult {
    /// `true` when every batch succeeded.
    pub ok: bool,
    /// One result per batch job, in job order.
    pub batches: Vec<BatchResult>,
}

/// Outcome of a coordinator broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorResult {
    /// `true` when every agent succeeded.
    pub ok: bool,
    /// The coordinator that ran the broadcast.
    pub coordinator: AgentName,
    /// One result per roster agent, in roster order.
    pub results: Vec<AgentResult>,
    /// Trace entries recorded during the broadcast.
    pub trace: Vec<TraceEntry>,
    /// Metrics as of the end of the broadcast.
    pub metrics: MetricsSnapshot,
}
