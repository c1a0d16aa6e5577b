//! Pipeline Orchestrator: runs steps in order, threading each output forward.

use std::sync::Arc;

use pipeline::{AgentResult, RunId, Telemetry};
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use crate::observe::{invoke_observed, TelemetryWindow, PIPELINE_EVENTS};
use crate::{PipelineResult, PipelineStatus, PipelineStep, StepReport, StepState};

/// An ordered list of steps run one after another.
///
/// Each step receives the previous step's `data` as its input. The first
/// failure stops the run; later steps stay [`StepState::Pending`].
#[derive(Clone)]
pub struct Pipeline {
    steps: Vec<PipelineStep>,
    telemetry: Arc<dyn Telemetry>,
}

impl Pipeline {
    /// Creates a pipeline.
    pub fn new(steps: Vec<PipelineStep>, telemetry: Arc<dyn Telemetry>) -> Self {
        Self { steps, telemetry }
    }

    /// The steps, in execution order.
    pub fn steps(&self) -> &[PipelineStep] {
        &self.steps
    }

    /// Runs every step, feeding `input` to the first.
    #[instrument(skip_all, fields(run_id = %RunId::new_random(), steps = self.steps.len()))]
    pub async fn run(&self, input: Value) -> PipelineResult {
        let window = TelemetryWindow::open();
        let mut states: Vec<StepReport> = self
            .steps
            .iter()
            .map(|step| StepReport {
                name: step.name.clone(),
                state: StepState::Pending,
            })
            .collect();
        let mut results: Vec<AgentResult> = Vec::with_capacity(self.steps.len());
        let mut context = input;

        for (index, step) in self.steps.iter().enumerate() {
            states[index].state = StepState::Running;
            debug!(step = %step.name, "step running");

            let mut result = invoke_observed(
                self.telemetry.as_ref(),
                &PIPELINE_EVENTS,
                step.agent.as_ref(),
                context.clone(),
                Some(json!({ "step": step.name })),
            )
            .await;

            match &mut result {
                AgentResult::Success { data, .. } => {
                    states[index].state = StepState::Succeeded;
                    context = data.clone();
                    results.push(result);
                }
                AgentResult::Failure { error, .. } => {
                    states[index].state = StepState::Failed;
                    error.step = Some(step.name.to_string());
                    warn!(step = %step.name, error = %error.message, "pipeline failed");
                    results.push(result);

                    let (trace, metrics) = window.close(self.telemetry.as_ref());
                    return PipelineResult {
                        ok: false,
                        status: PipelineStatus::Failed,
                        steps: results,
                        states,
                        failed_at: Some(step.name.to_string()),
                        context,
                        trace,
                        metrics,
                    };
                }
            }
        }

        info!("pipeline completed");
        let (trace, metrics) = window.close(self.telemetry.as_ref());
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

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("steps", &self.steps)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{name, Echo, Failing, Recorder};
    use pipeline::StepName;
    use telemetry::TelemetryStore;

    fn step(label: &str, agent: Arc<dyn pipeline::Agent>) -> PipelineStep {
        PipelineStep::new(StepName::new(label).unwrap(), agent)
    }

    #[tokio::test]
    async fn output_of_each_step_feeds_the_next() {
        let a = Recorder::new("a");
        let b = Recorder::new("b");
        let b_seen = b.seen();
        let pipeline = Pipeline::new(
            vec![step("A", Arc::new(a)), step("B", Arc::new(b))],
            Arc::new(TelemetryStore::default()),
        );

        let result = pipeline.run(json!(1)).await;

        assert!(result.ok);
        assert_eq!(result.status, PipelineStatus::Completed);
        assert_eq!(b_seen.lock().as_slice(), &[json!({"a": 1})]);
        assert_eq!(result.context, json!({"b": {"a": 1}}));
        assert!(result.failed_at.is_none());
    }

    #[tokio::test]
    async fn first_failure_stops_the_run() {
        let c = Recorder::new("c");
        let c_seen = c.seen();
        let pipeline = Pipeline::new(
            vec![
                step("A", Arc::new(Recorder::new("a"))),
                step("B", Arc::new(Failing::new("b"))),
                step("C", Arc::new(c)),
            ],
            Arc::new(TelemetryStore::default()),
        );

        let result = pipeline.run(json!("start")).await;

        assert!(!result.ok);
        assert_eq!(result.status, PipelineStatus::Failed);
        assert_eq!(result.failed_at.as_deref(), Some("B"));
        assert_eq!(result.steps.len(), 2);
        assert!(c_seen.lock().is_empty());
        // The failing step's input is reported as the context.
        assert_eq!(result.context, json!({"a": "start"}));
        assert_eq!(result.steps[1].error().unwrap().step.as_deref(), Some("B"));

        let states: Vec<StepState> = result.states.iter().map(|s| s.state).collect();
        assert_eq!(
            states,
            vec![StepState::Succeeded, StepState::Failed, StepState::Pending]
        );
    }

    #[tokio::test]
    async fn empty_pipeline_returns_its_input() {
        let pipeline = Pipeline::new(Vec::new(), Arc::new(TelemetryStore::default()));
        let result = pipeline.run(json!({"untouched": true})).await;
        assert!(result.ok);
        assert!(result.steps.is_empty());
        assert_eq!(result.context, json!({"untouched": true}));
    }

    #[tokio::test]
    async fn steps_are_traced_and_measured() {
        let store = Arc::new(TelemetryStore::default());
        let pipeline = Pipeline::new(
            vec![
                PipelineStep::for_agent(Arc::new(Echo::new("echo"))),
                PipelineStep::for_agent(Arc::new(Failing::new("fail"))),
            ],
            store.clone(),
        );

        let result = pipeline.run(json!(null)).await;

        let events: Vec<&str> = result.trace.iter().map(|t| t.event.as_str()).collect();
        assert_eq!(
            events,
            vec![
                "pipeline_step_start",
                "pipeline_step_complete",
                "pipeline_step_start",
                "pipeline_step_error"
            ]
        );
        assert_eq!(result.metrics.agent(&name("echo")).calls, 1);
        assert_eq!(store.agent_metrics(&name("fail")).errors, 1);
    }
}
