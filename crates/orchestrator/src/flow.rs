//! Parallel Pipeline: a pipeline whose elements may be parallel blocks.

use pipeline::{AgentResult, RunId};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::observe::TelemetryWindow;
use crate::{
    ParallelExecutor, Pipeline, PipelineResult, PipelineStatus, Stage, StepReport, StepState,
};

/// Builds the `failed_at` label for a parallel block.
pub fn parallel_block_label(index: usize) -> String {
    format!("parallel_block_{index}")
}

/// A sequence of [`Stage`]s.
///
/// Single steps behave exactly as in [`Pipeline`]. A parallel block sends the
/// current context to every member at once through the [`ParallelExecutor`];
/// if any member fails the run stops with `failed_at = "parallel_block_<i>"`,
/// where `i` is the block's position in the stage list. When a block succeeds
/// the context passed on is the `data` of its first successful result; the
/// other members' outputs are only available in `steps`.
#[derive(Debug, Clone)]
pub struct ParallelPipeline {
    stages: Vec<Stage>,
    executor: ParallelExecutor,
}

impl ParallelPipeline {
    /// Creates a parallel pipeline dispatching blocks through `executor`.
    pub fn new(stages: Vec<Stage>, executor: ParallelExecutor) -> Self {
        Self { stages, executor }
    }

    /// The stages, in execution order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Runs every stage, feeding `input` to the first.
    #[instrument(skip_all, fields(run_id = %RunId::new_random(), stages = self.stages.len()))]
    pub async fn run(&self, input: Value) -> PipelineResult {
        let telemetry = self.executor.telemetry();
        let window = TelemetryWindow::open();
        let mut states: Vec<StepReport> = self
            .stages
            .iter()
            .flat_map(Stage::steps)
            .map(|step| StepReport {
                name: step.name.clone(),
                state: StepState::Pending,
            })
            .collect();
        let mut results: Vec<AgentResult> = Vec::new();
        let mut context = input;
        let mut offset = 0;

        for (index, stage) in self.stages.iter().enumerate() {
            let failed_at = match stage {
                Stage::Step(step) => {
                    let single = Pipeline::new(vec![step.clone()], telemetry.clone());
                    let outcome = single.run(context.clone()).await;
                    if let Some(report) = outcome.states.into_iter().next() {
                        states[offset].state = report.state;
                    }
                    results.extend(outcome.steps);
                    if outcome.ok {
                        context = outcome.context;
                        None
                    } else {
                        Some(step.name.to_string())
                    }
                }
                Stage::Parallel(block) => {
                    let outcome = self.executor.execute_steps(block, &context).await;
                    let first_success = outcome.results.iter().find_map(|r| r.data().cloned());
                    for (i, (step, mut result)) in block.iter().zip(outcome.results).enumerate() {
                        states[offset + i].state = if result.is_ok() {
                            StepState::Succeeded
                        } else {
                            StepState::Failed
                        };
                        if let AgentResult::Failure { error, .. } = &mut result {
                            error.step = Some(step.name.to_string());
                        }
                        results.push(result);
                    }
                    if outcome.ok {
                        if let Some(next) = first_success {
                            context = next;
                        }
                        None
                    } else {
                        Some(parallel_block_label(index))
                    }
                }
            };
            offset += stage.steps().len();

            if let Some(failed_at) = failed_at {
                warn!(failed_at = %failed_at, "parallel pipeline failed");
                let (trace, metrics) = window.close(telemetry.as_ref());
                return PipelineResult {
                    ok: false,
                    status: PipelineStatus::Failed,
                    steps: results,
                    states,
                    failed_at: Some(failed_at),
                    context,
                    trace,
                    metrics,
                };
            }
        }

        info!("parallel pipeline completed");
        let (trace, metrics) = window.close(telemetry.as_ref());
        PipelineResult {
            ok: true,
            status: PipelineStatus::Completed,
            steps: results,
            states,
            failed_at: None,
            context,
            trace,
            metrics,
        }
    }
}
