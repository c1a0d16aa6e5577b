//! Relay CLI entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Wire observability**: configure `tracing-subscriber` with a pretty or
//!    JSON layer and, when `OTEL_EXPORTER_OTLP_ENDPOINT` is set, an
//!    OpenTelemetry OTLP exporter. Every span and event from the workspace
//!    crates flows through it.
//! 2. **Load configuration**: defaults, optional `--config` JSON file,
//!    `RELAY_*` environment overrides, validation.
//! 3. **Construct infrastructure**: the demo agent registry and a shared
//!    `TelemetryStore`, injected into the orchestration components.
//! 4. **Run one command** and print its result as JSON on stdout. The exit code
//!    is non-zero when the result is not ok.

mod agents;
mod observability;
mod settings;
mod stages;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use orchestrator::{
    AgentCoordinator, BatchJobManager, ParallelExecutor, ParallelPipeline, Pipeline,
};
use pipeline::{AgentName, AgentRegistry, RelayConfig, Task, Telemetry};
use serde::Serialize;
use serde_json::Value;
use telemetry::TelemetryStore;
use tracing::{error, info};

use crate::observability::LogFormat;

/// Run agent pipelines, parallel fan-outs, batches, and broadcasts against the
/// built-in demo agents.
#[derive(Parser, Debug)]
#[command(name = "relay", version, about)]
struct Cli {
    /// JSON file with orchestration limits.
    #[arg(long, global = true, env = "RELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Log line format on stderr.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run agents one after another, feeding each output to the next.
    Pipeline {
        /// Comma-separated agent names, in order.
        #[arg(long, value_delimiter = ',', required = true)]
        steps: Vec<String>,

        /// Input for the first step. Non-JSON text is treated as a string.
        #[arg(long, default_value = "null")]
        input: String,
    },

    /// Run agents concurrently on the same input.
    Parallel {
        /// Comma-separated agent names.
        #[arg(long, value_delimiter = ',', required = true)]
        tasks: Vec<String>,

        /// Input for every task.
        #[arg(long, default_value = "null")]
        input: String,
    },

    /// Run a pipeline with parallel blocks, e.g. `uppercase,[reverse|word_count],echo`.
    Flow {
        /// Stage notation.
        #[arg(long)]
        stages: String,

        /// Input for the first stage.
        #[arg(long, default_value = "null")]
        input: String,
    },

    /// Send every element of a JSON array to one agent, in bounded chunks.
    Batch {
        /// Agent name.
        #[arg(long)]
        agent: String,

        /// JSON array of inputs.
        #[arg(long)]
        inputs: String,
    },

    /// Broadcast one input to a roster of agents.
    Coordinate {
        /// Run only this roster member.
        #[arg(long)]
        agent: Option<String>,

        /// Comma-separated roster; defaults to the text agents.
        #[arg(long, value_delimiter = ',')]
        roster: Vec<String>,

        /// Input for every roster member.
        #[arg(long, default_value = "null")]
        input: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let guard = match observability::init(cli.log_format) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    let code = match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("relay failed: {err:#}");
            ExitCode::FAILURE
        }
    };

    guard.shutdown();
    code
}

/// Runs the selected command. Returns the result's `ok` flag.
async fn run(cli: Cli) -> Result<bool> {
    let config = settings::load(cli.config.as_deref())?;
    let registry = Arc::new(agents::demo_registry()?);
    let store = Arc::new(TelemetryStore::from_config(&config));
    let telemetry: Arc<dyn Telemetry> = store.clone();
    info!(agents = registry.len(), "demo roster ready");

    let ok = match cli.command {
        Command::Pipeline { steps, input } => {
            let steps = steps
                .iter()
                .map(|name| stages::resolve_step(&registry, name))
                .collect::<Result<Vec<_>>>()?;
            let result = Pipeline::new(steps, telemetry).run(parse_input(&input)).await;
            emit(&result, result.ok)?
        }
        Command::Parallel { tasks, input } => {
            let input = parse_input(&input);
            let tasks = tasks
                .iter()
                .map(|name| Ok(Task::new(agent_name(name)?, input.clone())))
                .collect::<Result<Vec<_>>>()?;
            let result = executor(&registry, telemetry, &config).execute(tasks).await;
            emit(&result, result.ok)?
        }
        Command::Flow {
            stages: notation,
            input,
        } => {
            let parsed = stages::parse_stages(&notation)?;
            let stages = stages::resolve_stages(&registry, &parsed)?;
            let flow = ParallelPipeline::new(stages, executor(&registry, telemetry, &config));
            let result = flow.run(parse_input(&input)).await;
            emit(&result, result.ok)?
        }
        Command::Batch { agent, inputs } => {
            let inputs: Vec<Value> =
                serde_json::from_str(&inputs).context("--inputs must be a JSON array")?;
            let manager = BatchJobManager::new(executor(&registry, telemetry, &config));
            let result = manager.run_batch(&agent_name(&agent)?, inputs).await;
            emit(&result, result.ok)?
        }
        Command::Coordinate {
            agent,
            roster,
            input,
        } => {
            let roster = if roster.is_empty() {
                agents::DEFAULT_ROSTER.iter().map(|s| (*s).to_owned()).collect()
            } else {
                roster
            };
            let members = roster
                .iter()
                .map(|name| stages::resolve_step(&registry, name).map(|step| step.agent))
                .collect::<Result<Vec<_>>>()?;
            let coordinator =
                AgentCoordinator::new(AgentName::from_static("coordinator"), members, telemetry);
            let input = parse_input(&input);
            match agent {
                Some(name) => {
                    let result = coordinator.execute_agent(&name, input).await;
                    emit(&result, result.is_ok())?
                }
                None => {
                    let result = coordinator.execute(input).await;
                    emit(&result, result.ok)?
                }
            }
        }
    };

    let metrics = store.all_metrics();
    info!(
        ok,
        traces = store.trace_count(),
        agents = metrics.calls.len(),
        "run finished"
    );
    Ok(ok)
}

fn executor(
    registry: &Arc<AgentRegistry>,
    telemetry: Arc<dyn Telemetry>,
    config: &RelayConfig,
) -> ParallelExecutor {
    ParallelExecutor::from_config(Arc::clone(registry), telemetry, config)
}

fn agent_name(raw: &str) -> Result<AgentName> {
    match AgentName::new(raw.trim()) {
        Some(name) => Ok(name),
        None => bail!("agent names must not be empty"),
    }
}

/// Parses `raw` as JSON, falling back to a plain string.
fn parse_input(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

/// Prints `result` as pretty JSON on stdout and passes `ok` through.
fn emit<T: Serialize>(result: &T, ok: bool) -> Result<bool> {
    let rendered = serde_json::to_string_pretty(result).context("failed to render result")?;
    println!("{rendered}");
    Ok(ok)
}
