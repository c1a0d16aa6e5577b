//! The agent contract.
//!
//! An [`Agent`] is any independently invokable unit of work. The orchestration
//! layer only ever talks to agents through this trait, and only ever calls them
//! through [`invoke`], which guarantees exactly one [`AgentResult`] per call
//! even when the agent panics.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use crate::{AgentError, AgentFailure, AgentName, AgentResult};

/// Descriptive information about an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentMetadata {
    /// Stable identity used for lookup, tracing, and metrics keys.
    pub name: AgentName,
    /// Optional version string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Optional one-line description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl AgentMetadata {
    /// Metadata carrying only a name.
    pub fn new(name: AgentName) -> Self {
        Self {
            name,
            version: None,
            description: None,
        }
    }

    /// Sets the version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A named unit of work.
///
/// Implementors usually provide [`Agent::run`] and inherit the default
/// [`Agent::process`], which turns an `Err` from `run` into a
/// [`AgentResult::Failure`] tagged with the agent's name. Agents that need full
/// control over the result shape override `process` instead.
///
/// `process` must not fail outward. A panic is still caught by [`invoke`], but
/// that is a last resort, not part of the contract.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Describes this agent. `metadata().name` must be unique within a registry.
    fn metadata(&self) -> AgentMetadata;

    /// Shorthand for `metadata().name`.
    fn name(&self) -> AgentName {
        self.metadata().name
    }

    /// Executes the agent's own logic and returns its raw output.
    async fn run(&self, input: Value) -> Result<Value, AgentError> {
        let _ = input;
        Err(AgentError::Unsupported { agent: self.name() })
    }

    /// Executes the agent and reports the outcome as data.
    async fn process(&self, input: Value) -> AgentResult {
        let name = self.name();
        match self.run(input).await {
            Ok(data) => AgentResult::success(name, data),
            Err(err) => {
                let failure = AgentFailure::new(err.to_string()).with_stack(err.cause_chain());
                AgentResult::failure(name, failure)
            }
        }
    }
}

/// Name tagged on results from an agent whose `metadata()` panicked.
pub const UNNAMED_AGENT: &str = "unnamed_agent";

/// Reads `agent.name()`, turning a panic in `metadata()` into a failure result
/// tagged [`UNNAMED_AGENT`].
pub fn checked_name(agent: &dyn Agent) -> Result<AgentName, AgentResult> {
    std::panic::catch_unwind(AssertUnwindSafe(|| agent.name())).map_err(|panic| {
        let message = panic_message(&*panic);
        error!(panic = %message, "agent metadata panicked");
        AgentResult::failure(
            AgentName::from_static(UNNAMED_AGENT),
            AgentFailure::new(format!("agent metadata panicked: {message}")),
        )
    })
}

/// Invokes `agent.process(input)`, converting a panic into a failure result.
pub async fn invoke(agent: &dyn Agent, input: Value) -> AgentResult {
    let name = match checked_name(agent) {
        Ok(name) => name,
        Err(failure) => return failure,
    };
    match AssertUnwindSafe(agent.process(input)).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => {
            let message = panic_message(&*panic);
            error!(agent = %name, panic = %message, "agent panicked during processing");
            AgentResult::failure(name, AgentFailure::new(format!("agent panicked: {message}")))
        }
    }
}

/// Extracts the message carried by a caught panic payload.
pub fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic")
        .to_string()
}
