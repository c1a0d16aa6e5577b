//! Error types for the Relay domain.
//!
//! Two families live here:
//!
//! - [`AgentError`] is what an agent's own logic produces. It never crosses the
//!   agent boundary as an error; [`crate::agent::Agent::process`] converts it
//!   into an [`crate::AgentResult::Failure`].
//! - [`RelayError`] covers setup-time mistakes (bad configuration, duplicate
//!   registrations). Orchestration itself never returns it: once a run has
//!   started, every failure is reported as data.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::AgentName;

// ---------------------------------------------------------------------------
// Agent-level errors
// ---------------------------------------------------------------------------

/// A failure raised by an agent's own logic.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The agent ran and decided the work failed.
    #[error("{message}")]
    Failed {
        /// Human-readable description of the failure.
        message: String,
    },

    /// The input handed to the agent did not have the expected shape.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The agent does not implement raw `run` execution.
    #[error("Agent '{agent}' does not support direct execution")]
    Unsupported {
        /// Name of the agent that was asked to run.
        agent: AgentName,
    },

    /// A downstream capability (model provider, database, mail service) failed.
    #[error("{message}")]
    Upstream {
        /// Description of what the agent was doing when the call failed.
        message: String,
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl AgentError {
    /// Shorthand for [`AgentError::Failed`].
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// Renders the chain of underlying causes, outermost first.
    ///
    /// Returns `None` when the error has no source.
    pub fn cause_chain(&self) -> Option<String> {
        let mut current = std::error::Error::source(self);
        let mut causes = Vec::new();
        while let Some(cause) = current {
            causes.push(cause.to_string());
            current = cause.source();
        }
        if causes.is_empty() {
            None
        } else {
            Some(causes.join("\ncaused by: "))
        }
    }
}

// ---------------------------------------------------------------------------
// Setup-level errors
// ---------------------------------------------------------------------------

/// Errors raised while assembling the orchestration layer.
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum RelayError {
    /// Two agents were registered under the same name.
    #[error("Agent '{name}' is already registered")]
    DuplicateAgent {
        /// The conflicting name.
        name: AgentName,
    },

    /// The runtime configuration is invalid.
    ///
    /// Produced at load time; orchestration never starts with an invalid config.
    #[error("Configuration error: {message}")]
    ConfigurationError {
        /// Description of the configuration problem.
        message: String,
    },

    /// An identifier was deserialized or converted from an empty string.
    #[error("Invalid {kind}: identifiers must not be empty")]
    InvalidIdentifier {
        /// Which kind of identifier was being built (e.g. `"AgentName"`).
        kind: String,
    },
}
