//! Core orchestration domain for Relay.
//!
//! This crate contains every domain concept shared by the orchestration layer:
//! identifiers, agent results, trace and metrics values, the agent contract,
//! the telemetry port, the agent registry, and runtime configuration.
//! Infrastructure crates implement the traits defined here; they never add
//! domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; the `telemetry` and `orchestrator` crates define
//! *how* it is supplied and sequenced.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`AgentName`, `StepName`, `RunId`) |
//! | [`types`] | Shared value types (`AgentResult`, `Task`, `TraceEntry`, `MetricsSnapshot`) |
//! | [`agent`] | The [`Agent`] contract and the panic-safe [`invoke`] helper |
//! | [`telemetry`] | The [`Telemetry`] port |
//! | [`registry`] | [`AgentRegistry`] name lookup |
//! | [`config`] | [`RelayConfig`] limits |
//! | [`errors`] | [`AgentError`] and [`RelayError`] |

pub mod agent;
pub mod config;
pub mod errors;
pub mod identifiers;
pub mod registry;
pub mod telemetry;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use agent::{checked_name, invoke, panic_message, Agent, AgentMetadata, UNNAMED_AGENT};
pub use config::{
    RelayConfig, DEFAULT_CONCURRENCY_LIMIT, DEFAULT_QUEUE_INTERVAL_MS, DEFAULT_TRACE_CAPACITY,
};
pub use errors::{AgentError, RelayError};
pub use identifiers::{AgentName, RunId, StepName};
pub use registry::AgentRegistry;
pub use telemetry::Telemetry;
pub use types::{
    AgentFailure, AgentMetrics, AgentResult, MetricsSnapshot, Task, Timestamp, TraceEntry,
};
