//! Execution engine for Relay.
//!
//! Everything in this crate sequences agent invocations. The agent contract,
//! result types, and telemetry port live in the `pipeline` crate; this crate
//! decides *when* agents run, *with what input*, and *how many at once*.
//!
//! ## Architectural Layer
//!
//! **Orchestration.** Depends on `pipeline` for the domain and on any
//! [`pipeline::Telemetry`] implementation supplied at construction. No network
//! or file I/O.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`throttle`] | [`Throttle`]: bounded-concurrency runner with queue spacing |
//! | [`parallel`] | [`ParallelExecutor`]: fan-out of independent tasks |
//! | [`sequential`] | [`Pipeline`]: fail-fast sequential threading |
//! | [`flow`] | [`ParallelPipeline`]: pipelines with parallel blocks |
//! | [`batch`] | [`BatchJobManager`]: chunked homogeneous batches |
//! | [`coordinator`] | [`AgentCoordinator`]: broadcast to a fixed roster |
//! | [`step`] | [`PipelineStep`] and [`Stage`] |
//! | [`results`] | Aggregate result types returned by every component |

pub mod batch;
pub mod coordinator;
pub mod flow;
mod observe;
pub mod parallel;
pub mod results;
pub mod sequential;
pub mod step;
pub mod throttle;

#[cfg(test)]
mod test_support;

pub use batch::{plan_chunks, BatchJob, BatchJobManager};
pub use coordinator::AgentCoordinator;
pub use flow::{parallel_block_label, ParallelPipeline};
pub use parallel::{ParallelExecutor, PARALLEL_EXECUTOR};
pub use results::{
    BatchResult, CoordinatorResult, MultiBatchResult, ParallelResult, PipelineResult,
    PipelineStatus, StepReport, StepState,
};
pub use sequential::Pipeline;
pub use step::{PipelineStep, Stage};
pub use throttle::{Throttle, ThrottleError};
