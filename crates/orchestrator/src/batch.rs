//! Batch Job Manager: runs large homogeneous task lists in bounded chunks.

use pipeline::{AgentName, AgentResult, RunId, Task};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::observe::TelemetryWindow;
use crate::{BatchResult, MultiBatchResult, ParallelExecutor};

/// One agent and every input it should process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchJob {
    /// Agent every input is sent to.
    pub agent: AgentName,
    /// Inputs, one task each.
    pub inputs: Vec<Value>,
}

impl BatchJob {
    /// Creates a batch job.
    pub fn new(agent: AgentName, inputs: Vec<Value>) -> Self {
        Self { agent, inputs }
    }
}

/// Sizes of the contiguous chunks `total` inputs are split into.
pub fn plan_chunks(total: usize, chunk_size: usize) -> Vec<usize> {
    let chunk_size = chunk_size.max(1);
    (0..total)
        .step_by(chunk_size)
        .map(|start| chunk_size.min(total - start))
        .collect()
}

/// Splits batches into chunks of `concurrency_limit` tasks and runs the chunks
/// one after another, so no more than `concurrency_limit` tasks are ever in
/// flight however large the batch.
#[derive(Debug, Clone)]
pub struct BatchJobManager {
    executor: ParallelExecutor,
}

impl BatchJobManager {
    /// Creates a manager chunking by `executor`'s concurrency limit.
    pub fn new(executor: ParallelExecutor) -> Self {
        Self { executor }
    }

    /// Maximum number of tasks per chunk.
    pub fn chunk_size(&self) -> usize {
        self.executor.throttle().concurrency_limit()
    }

    /// Sends every input to `agent`.
    #[instrument(
        skip_all,
        fields(run_id = %RunId::new_random(), agent = %agent, tasks = inputs.len())
    )]
    pub async fn run_batch(&self, agent: &AgentName, inputs: Vec<Value>) -> BatchResult {
        let telemetry = self.executor.telemetry();
        let window = TelemetryWindow::open();
        let total_tasks = inputs.len();
        let chunk_sizes = plan_chunks(total_tasks, self.chunk_size());
        let mut results: Vec<AgentResult> = Vec::with_capacity(total_tasks);

        let mut remaining = inputs.into_iter();
        for (chunk, &size) in chunk_sizes.iter().enumerate() {
            let tasks: Vec<Task> = remaining
                .by_ref()
                .take(size)
                .map(|input| Task::new(agent.clone(), input))
                .collect();
            debug!(chunk, size, "running chunk");
            let outcome = self.executor.execute(tasks).await;
            results.extend(outcome.results);
        }

        let successful_tasks = results.iter().filter(|r| r.is_ok()).count();
        let failed_tasks = results.len() - successful_tasks;
        info!(
            chunks = chunk_sizes.len(),
            successful_tasks, failed_tasks, "batch finished"
        );

        let (trace, metrics) = window.close(telemetry.as_ref());
        BatchResult {
            ok: failed_tasks == 0,
            agent: agent.clone(),
            results,
            total_tasks,
            successful_tasks,
            failed_tasks,
            chunks: chunk_sizes.len(),
            chunk_sizes,
            trace,
            metrics,
        }
    }

    /// Runs each job to completion before starting the next.
    pub async fn run_multiple_batches(&self, jobs: Vec<BatchJob>) -> MultiBatchResult {
        let mut batches = Vec::with_capacity(jobs.len());
        for job in jobs {
            batches.push(self.run_batch(&job.agent, job.inputs).await);
        }
        MultiBatchResult {
            ok: batches.iter().all(|b| b.ok),
            batches,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{agent_registry, name, Echo, Failing, Slow};
    use crate::Throttle;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use telemetry::TelemetryStore;

    fn manager(registry: pipeline::AgentRegistry, limit: usize) -> BatchJobManager {
        BatchJobManager::new(ParallelExecutor::new(
            Arc::new(registry),
            Arc::new(TelemetryStore::default()),
            Throttle::new(limit, Duration::ZERO),
        ))
    }

    #[test]
    fn chunk_plans() {
        assert_eq!(plan_chunks(12, 5), vec![5, 5, 2]);
        assert_eq!(plan_chunks(5, 5), vec![5]);
        assert_eq!(plan_chunks(3, 5), vec![3]);
        assert!(plan_chunks(0, 5).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn twelve_inputs_run_as_three_chunks() {
        let slow = Slow::new("slow", Duration::from_millis(20));
        let gauge = slow.gauge();
        let manager = manager(agent_registry(vec![Arc::new(slow)]), 5);
        let inputs: Vec<Value> = (0..12).map(|i| json!(i)).collect();

        let result = manager.run_batch(&name("slow"), inputs.clone()).await;

        assert!(result.ok);
        assert_eq!(result.total_tasks, 12);
        assert_eq!(result.chunks, 3);
        assert_eq!(result.chunk_sizes, vec![5, 5, 2]);
        assert_eq!(result.successful_tasks, 12);
        assert_eq!(gauge.peak(), 5);
        let data: Vec<Value> = result.results.iter().filter_map(|r| r.data().cloned()).collect();
        assert_eq!(data, inputs);
    }

    #[tokio::test]
    async fn small_batches_use_a_single_chunk() {
        let manager = manager(agent_registry(vec![Arc::new(Echo::new("echo"))]), 5);
        let result = manager
            .run_batch(&name("echo"), vec![json!(1), json!(2)])
            .await;
        assert_eq!(result.chunks, 1);
        assert!(result.ok);
    }

    #[tokio::test]
    async fn failures_are_counted_without_stopping_the_batch() {
        let manager = manager(agent_registry(vec![Arc::new(Failing::new("fail"))]), 2);
        let result = manager
            .run_batch(&name("fail"), vec![json!(1), json!(2), json!(3)])
            .await;

        assert!(!result.ok);
        assert_eq!(result.total_tasks, 3);
        assert_eq!(result.failed_tasks, 3);
        assert_eq!(result.successful_tasks, 0);
        assert_eq!(result.chunks, 2);
    }

    #[tokio::test]
    async fn chunk_count_is_serialized() {
        let manager = manager(agent_registry(vec![Arc::new(Echo::new("echo"))]), 2);
        let result = manager
            .run_batch(&name("echo"), vec![json!(1), json!(2), json!(3)])
            .await;

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["chunks"], 2);
        assert_eq!(value["chunk_sizes"], json!([2, 1]));
        assert_eq!(value["total_tasks"], 3);
    }

    #[tokio::test]
    async fn empty_batch_is_ok() {
        let manager = manager(agent_registry(vec![Arc::new(Echo::new("echo"))]), 5);
        let result = manager.run_batch(&name("echo"), Vec::new()).await;
        assert!(result.ok);
        assert_eq!(result.total_tasks, 0);
        assert_eq!(result.chunks, 0);
    }

    #[tokio::test]
    async fn multiple_batches_aggregate_ok() {
        let manager = manager(
            agent_registry(vec![
                Arc::new(Echo::new("echo")),
                Arc::new(Failing::new("fail")),
            ]),
            5,
        );
        let result = manager
            .run_multiple_batches(vec![
                BatchJob::new(name("echo"), vec![json!(1)]),
                BatchJob::new(name("fail"), vec![json!(2)]),
            ])
            .await;

        assert!(!result.ok);
        assert_eq!(result.batches.len(), 2);
        assert!(result.batches[0].ok);
        assert!(!result.batches[1].ok);
    }
}
