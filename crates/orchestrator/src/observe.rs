//! Telemetry bookkeeping shared by every component that invokes agents.

use pipeline::{
    checked_name, invoke, Agent, AgentName, AgentResult, MetricsSnapshot, Telemetry, Timestamp,
    TraceEntry,
};
use serde_json::{json, Value};
use tokio::time::Instant;
use tracing::{debug, warn};

/// Trace event names emitted around one agent invocation.
pub(crate) struct LifecycleEvents {
    pub start: &'static str,
    pub complete: &'static str,
    pub error: &'static str,
}

pub(crate) const PARALLEL_EVENTS: LifecycleEvents = LifecycleEvents {
    start: "parallel_start",
    complete: "parallel_complete",
    error: "parallel_error",
};

pub(crate) const PIPELINE_EVENTS: LifecycleEvents = LifecycleEvents {
    start: "pipeline_step_start",
    complete: "pipeline_step_complete",
    error: "pipeline_step_error",
};

pub(crate) const COORDINATOR_EVENTS: LifecycleEvents = LifecycleEvents {
    start: "coordinator_start",
    complete: "coordinator_complete",
    error: "coordinator_error",
};

/// Invokes `agent`, recording its call, duration, outcome, and trace events.
pub(crate) async fn invoke_observed(
    telemetry: &dyn Telemetry,
    events: &LifecycleEvents,
    agent: &dyn Agent,
    input: Value,
    start_data: Option<Value>,
) -> AgentResult {
    let name = match checked_name(agent) {
        Ok(name) => name,
        Err(failure) => {
            let name = failure.agent().clone();
            let message = failure.error().map(|e| e.message.clone()).unwrap_or_default();
            warn!(agent = %name, error = %message, "agent metadata unavailable");
            telemetry.record_call(&name);
            telemetry.record_error(&name);
            telemetry.trace(&name, events.error, Some(json!({ "error": message })));
            return failure;
        }
    };
    telemetry.trace(&name, events.start, start_data);
    telemetry.record_call(&name);

    let started = Instant::now();
    let result = invoke(agent, input).await;
    let duration_ms = elapsed_ms(started);
    telemetry.record_duration(&name, duration_ms);

    match result.error() {
        None => {
            debug!(agent = %name, duration_ms, "agent completed");
            telemetry.trace(&name, events.complete, Some(json!({ "duration_ms": duration_ms })));
        }
        Some(error) => {
            warn!(agent = %name, error = %error.message, duration_ms, "agent failed");
            telemetry.record_error(&name);
            telemetry.trace(
                &name,
                events.error,
                Some(json!({ "error": error.message, "duration_ms": duration_ms })),
            );
        }
    }
    result
}

/// Records a failure that happened before any agent could be reached.
pub(crate) fn record_unreachable(
    telemetry: &dyn Telemetry,
    component: &AgentName,
    event: &str,
    requested: &str,
    message: &str,
) {
    warn!(component = %component, requested, "{message}");
    telemetry.record_error(component);
    telemetry.trace(
        component,
        event,
        Some(json!({ "agent": requested, "error": message })),
    );
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Marks the start of a run so its trace entries can be sliced out later.
pub(crate) struct TelemetryWindow {
    opened: Timestamp,
}

impl TelemetryWindow {
    pub(crate) fn open() -> Self {
        Self {
            opened: Timestamp::now(),
        }
    }

    /// Trace entries recorded since the window opened plus a metrics snapshot.
    pub(crate) fn close(self, telemetry: &dyn Telemetry) -> (Vec<TraceEntry>, MetricsSnapshot) {
        (
            telemetry.traces_in_range(self.opened, Timestamp::now()),
            telemetry.all_metrics(),
        )
    }
}
