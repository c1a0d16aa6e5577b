//! Built-in demo agents.
//!
//! Text agents accept either a JSON string or an object with a `"text"` field
//! and answer with an object carrying `"text"`, so they chain in any order.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pipeline::{Agent, AgentError, AgentMetadata, AgentName, AgentRegistry, RelayError};
use serde_json::{json, Value};

/// Delay used by `slow` when the input carries no `delay_ms`.
const DEFAULT_SLOW_DELAY_MS: u64 = 250;

/// Names of the agents the `coordinate` command broadcasts to by default.
pub const DEFAULT_ROSTER: [&str; 4] = ["uppercase", "word_count", "reverse", "echo"];

/// Builds the registry of every demo agent.
pub fn demo_registry() -> Result<AgentRegistry, RelayError> {
    AgentRegistry::new()
        .with(Arc::new(Uppercase))?
        .with(Arc::new(WordCount))?
        .with(Arc::new(Reverse))?
        .with(Arc::new(Echo))?
        .with(Arc::new(Fail))?
        .with(Arc::new(Slow))
}

fn text_of(input: &Value) -> Result<&str, AgentError> {
    match input {
        Value::String(text) => Ok(text.as_str()),
        Value::Object(map) => map
            .get("text")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AgentError::InvalidInput("object input needs a string \"text\" field".into())
            }),
        other => Err(AgentError::InvalidInput(format!(
            "expected a string or {{\"text\": ...}}, got {other}"
        ))),
    }
}

fn metadata(name: &'static str, description: &str) -> AgentMetadata {
    AgentMetadata::new(AgentName::from_static(name))
        .with_version(env!("CARGO_PKG_VERSION"))
        .with_description(description)
}

struct Uppercase;

#[async_trait]
impl Agent for Uppercase {
    fn metadata(&self) -> AgentMetadata {
        metadata("uppercase", "Upper-cases the input text")
    }

    async fn run(&self, input: Value) -> Result<Value, AgentError> {
        Ok(json!({ "text": text_of(&input)?.to_uppercase() }))
    }
}

struct WordCount;

#[async_trait]
impl Agent for WordCount {
    fn metadata(&self) -> AgentMetadata {
        metadata("word_count", "Counts whitespace-separated words")
    }

    async fn run(&self, input: Value) -> Result<Value, AgentError> {
        let text = text_of(&input)?;
        Ok(json!({ "text": text, "words": text.split_whitespace().count() }))
    }
}

struct Reverse;

#[async_trait]
impl Agent for Reverse {
    fn metadata(&self) -> AgentMetadata {
        metadata("reverse", "Reverses the input text")
    }

    async fn run(&self, input: Value) -> Result<Value, AgentError> {
        let reversed: String = text_of(&input)?.chars().rev().collect();
        Ok(json!({ "text": reversed }))
    }
}

struct Echo;

#[async_trait]
impl Agent for Echo {
    fn metadata(&self) -> AgentMetadata {
        metadata("echo", "Returns its input unchanged")
    }

    async fn run(&self, input: Value) -> Result<Value, AgentError> {
        Ok(input)
    }
}

struct Fail;

#[async_trait]
impl Agent for Fail {
    fn metadata(&self) -> AgentMetadata {
        metadata("fail", "Always fails")
    }

    async fn run(&self, _input: Value) -> Result<Value, AgentError> {
        Err(AgentError::failed("fail agent always fails"))
    }
}

/// Waits `delay_ms` (from the input object) before echoing.
struct Slow;

#[async_trait]
impl Agent for Slow {
    fn metadata(&self) -> AgentMetadata {
        metadata("slow", "Sleeps for delay_ms, then echoes its input")
    }

    async fn run(&self, input: Value) -> Result<Value, AgentError> {
        let delay = input
            .get("delay_ms")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_SLOW_DELAY_MS);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok(input)
    }
}
