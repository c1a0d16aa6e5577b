//! Parallel Executor: runs independent tasks concurrently.

use std::sync::Arc;

use futures::future::join_all;
use pipeline::{
    checked_name, Agent, AgentFailure, AgentName, AgentRegistry, AgentResult, RelayConfig, RunId,
    Task, Telemetry, UNNAMED_AGENT,
};
use serde_json::Value;
use tracing::{info, instrument};

use crate::observe::{invoke_observed, record_unreachable, TelemetryWindow, PARALLEL_EVENTS};
use crate::{ParallelResult, PipelineStep, Throttle};

/// Name the executor tags its own failures with.
pub const PARALLEL_EXECUTOR: &str = "parallel_executor";

/// One unit of work after registry resolution.
struct Job {
    requested: AgentName,
    agent: Option<Arc<dyn Agent>>,
    input: Value,
}

/// Runs a flat list of tasks, one result per task in task order.
///
/// Lists no longer than the concurrency limit are dispatched all at once;
/// longer lists go through the [`Throttle`]. A failing or unknown task never
/// prevents its siblings from running to completion.
#[derive(Clone)]
pub struct ParallelExecutor {
    name: AgentName,
    registry: Arc<AgentRegistry>,
    telemetry: Arc<dyn Telemetry>,
    throttle: Throttle,
}

impl ParallelExecutor {
    /// Creates an executor resolving task names through `registry`.
    pub fn new(
        registry: Arc<AgentRegistry>,
        telemetry: Arc<dyn Telemetry>,
        throttle: Throttle,
    ) -> Self {
        Self {
            name: AgentName::from_static(PARALLEL_EXECUTOR),
            registry,
            telemetry,
            throttle,
        }
    }

    /// Creates an executor with a throttle built from `config`.
    pub fn from_config(
        registry: Arc<AgentRegistry>,
        telemetry: Arc<dyn Telemetry>,
        config: &RelayConfig,
    ) -> Self {
        Self::new(registry, telemetry, Throttle::from_config(config))
    }

    /// The throttle applied to long task lists.
    pub fn throttle(&self) -> &Throttle {
        &self.throttle
    }

    /// The telemetry sink every task reports to.
    pub fn telemetry(&self) -> &Arc<dyn Telemetry> {
        &self.telemetry
    }

    /// Resolves and runs every task.
    #[instrument(skip_all, fields(run_id = %RunId::new_random(), tasks = tasks.len()))]
    pub async fn execute(&self, tasks: Vec<Task>) -> ParallelResult {
        let window = TelemetryWindow::open();
        let jobs = tasks
            .into_iter()
            .map(|task| Job {
                agent: self.registry.get(task.agent_name.as_str()),
                requested: task.agent_name,
                input: task.input,
            })
            .collect();

        let results = self.dispatch(jobs).await;
        let (trace, metrics) = window.close(self.telemetry.as_ref());
        let result = ParallelResult::new(results, trace, metrics);
        info!(ok = result.ok, "parallel execution finished");
        result
    }

    /// Runs already-resolved steps as one block, each receiving `input`.
    #[instrument(skip_all, fields(run_id = %RunId::new_random(), tasks = steps.len()))]
    pub async fn execute_steps(&self, steps: &[PipelineStep], input: &Value) -> ParallelResult {
        let window = TelemetryWindow::open();
        let jobs = steps
            .iter()
            .map(|step| Job {
                requested: checked_name(step.agent.as_ref())
                    .unwrap_or_else(|_| AgentName::from_static(UNNAMED_AGENT)),
                agent: Some(Arc::clone(&step.agent)),
                input: input.clone(),
            })
            .collect();

        let results = self.dispatch(jobs).await;
        let (trace, metrics) = window.close(self.telemetry.as_ref());
        ParallelResult::new(results, trace, metrics)
    }

    async fn dispatch(&self, jobs: Vec<Job>) -> Vec<AgentResult> {
        if !self.throttle.should_throttle(jobs.len()) {
            return join_all(jobs.into_iter().map(|job| self.run_job(job))).await;
        }

        let requested: Vec<AgentName> = jobs.iter().map(|job| job.requested.clone()).collect();
        let task_fns: Vec<_> = jobs
            .into_iter()
            .map(|job| move || self.run_job(job))
            .collect();

        self.throttle
            .run_all(task_fns)
            .await
            .into_iter()
            .zip(requested)
            .map(|(outcome, agent)| {
                outcome.unwrap_or_else(|err| {
                    AgentResult::failure(agent, AgentFailure::new(err.to_string()))
                })
            })
            .collect()
    }

    async fn run_job(&self, job: Job) -> AgentResult {
        match job.agent {
            Some(agent) => {
                invoke_observed(
                    self.telemetry.as_ref(),
                    &PARALLEL_EVENTS,
                    agent.as_ref(),
                    job.input,
                    None,
                )
                .await
            }
            None => {
                let message = format!("agent not found: {}", job.requested);
                record_unreachable(
                    self.telemetry.as_ref(),
                    &self.name,
                    PARALLEL_EVENTS.error,
                    job.requested.as_str(),
                    &message,
                );
                AgentResult::failure(self.name.clone(), AgentFailure::new(message))
            }
        }
    }
}

impl std::fmt::Debug for ParallelExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParallelExecutor")
            .field("registry", &self.registry)
            .field("throttle", &self.throttle)
            .finish_non_exhaustive()
    }
}
