//! Pipeline building blocks.

use std::sync::Arc;

use pipeline::{checked_name, Agent, StepName};

/// A named binding of a pipeline position to an agent.
#[derive(Clone)]
pub struct PipelineStep {
    /// Position name, reported as `failed_at` when this step fails.
    pub name: StepName,
    /// The agent run at this position.
    pub agent: Arc<dyn Agent>,
}

impl PipelineStep {
    /// Creates a step.
    pub fn new(name: StepName, agent: Arc<dyn Agent>) -> Self {
        Self { name, agent }
    }

    /// Creates a step named after its agent.
    pub fn for_agent(agent: Arc<dyn Agent>) -> Self {
        Self {
            name: agent.name().into(),
            agent,
        }
    }
}

impl std::fmt::Debug for PipelineStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineStep")
            .field("name", &self.name)
            .field("agent", &checked_name(self.agent.as_ref()).ok())
            .finish()
    }
}

/// One element of a parallel pipeline.
#[derive(Debug, Clone)]
pub enum Stage {
    /// Runs on its own, fed by the previous stage's output.
    Step(PipelineStep),
    /// Runs concurrently; every member receives the same input.
    Parallel(Vec<PipelineStep>),
}

impl Stage {
    /// Steps contained in this stage, in declaration order.
    pub fn steps(&self) -> &[PipelineStep] {
        match self {
            Self::Step(step) => std::slice::from_ref(step),
            Self::Parallel(steps) => steps,
        }
    }
}

impl From<PipelineStep> for Stage {
    fn from(step: PipelineStep) -> Self {
        Self::Step(step)
    }
}

impl From<Vec<PipelineStep>> for Stage {
    fn from(steps: Vec<PipelineStep>) -> Self {
        Self::Parallel(steps)
    }
}
