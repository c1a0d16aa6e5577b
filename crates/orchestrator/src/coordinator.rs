//! Agent Coordinator: broadcasts one input to a fixed roster.

use std::sync::Arc;

use pipeline::{
    checked_name, Agent, AgentFailure, AgentMetadata, AgentName, AgentResult, RunId, Telemetry,
};
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::observe::{invoke_observed, record_unreachable, TelemetryWindow, COORDINATOR_EVENTS};
use crate::results::all_ok;
use crate::CoordinatorResult;

/// Runs a fixed set of agents against the same input.
///
/// Unlike the [`crate::ParallelExecutor`], agents run one at a time, and every
/// agent runs regardless of earlier failures.
#[derive(Clone)]
pub struct AgentCoordinator {
    name: AgentName,
    agents: Vec<Arc<dyn Agent>>,
    telemetry: Arc<dyn Telemetry>,
}

impl AgentCoordinator {
    /// Creates a coordinator called `name` over `agents`.
    pub fn new(
        name: AgentName,
        agents: Vec<Arc<dyn Agent>>,
        telemetry: Arc<dyn Telemetry>,
    ) -> Self {
        Self {
            name,
            agents,
            telemetry,
        }
    }

    /// The coordinator's own name, used to tag lookup failures.
    pub fn name(&self) -> &AgentName {
        &self.name
    }

    /// Metadata for every agent in the roster, in roster order.
    pub fn roster(&self) -> Vec<AgentMetadata> {
        self.agents.iter().map(|agent| agent.metadata()).collect()
    }

    /// Sends `input` to every agent in turn.
    #[instrument(skip_all, fields(run_id = %RunId::new_random(), coordinator = %self.name))]
    pub async fn execute(&self, input: Value) -> CoordinatorResult {
        let window = TelemetryWindow::open();
        let mut results = Vec::with_capacity(self.agents.len());
        for agent in &self.agents {
            results.push(self.invoke(agent.as_ref(), input.clone()).await);
        }

        let ok = all_ok(&results);
        info!(ok, agents = results.len(), "broadcast finished");
        let (trace, metrics) = window.close(self.telemetry.as_ref());
        CoordinatorResult {
            ok,
            coordinator: self.name.clone(),
            results,
            trace,
            metrics,
        }
    }

    /// Sends `input` to the roster agent called `agent_name`.
    #[instrument(skip(self, input), fields(coordinator = %self.name))]
    pub async fn execute_agent(&self, agent_name: &str, input: Value) -> AgentResult {
        let found = self
            .agents
            .iter()
            .find(|a| checked_name(a.as_ref()).is_ok_and(|name| name.as_str() == agent_name));
        match found {
            Some(agent) => self.invoke(agent.as_ref(), input).await,
            None => {
                let message = format!("agent not found: {agent_name}");
                record_unreachable(
                    self.telemetry.as_ref(),
                    &self.name,
                    COORDINATOR_EVENTS.error,
                    agent_name,
                    &message,
                );
                AgentResult::failure(self.name.clone(), AgentFailure::new(message))
            }
        }
    }

    async fn invoke(&self, agent: &dyn Agent, input: Value) -> AgentResult {
        invoke_observed(
            self.telemetry.as_ref(),
            &COORDINATOR_EVENTS,
            agent,
            input,
            Some(json!({ "coordinator": self.name })),
        )
        .await
    }
}

impl std::fmt::Debug for AgentCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let roster: Vec<AgentName> = self.agents.iter().map(|a| a.name()).collect();
        f.debug_struct("AgentCoordinator")
            .field("name", &self.name)
            .field("roster", &roster)
            .finish_non_exhaustive()
    }
}
