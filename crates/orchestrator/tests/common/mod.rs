#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pipeline::{Agent, AgentError, AgentMetadata, AgentName, AgentRegistry};
use serde_json::{json, Value};

pub fn name(s: &str) -> AgentName {
    AgentName::new(s).unwrap()
}

pub fn registry(agents: Vec<Arc<dyn Agent>>) -> Arc<AgentRegistry> {
    let mut registry = AgentRegistry::new();
    for agent in agents {
        registry.register(agent).unwrap();
    }
    Arc::new(registry)
}

/// Appends its own name to the `"path"` array of the input object.
pub struct Stamp(pub AgentName);

impl Stamp {
    pub fn new(s: &str) -> Self {
        Self(name(s))
    }
}

#[async_trait]
impl Agent for Stamp {
    fn metadata(&self) -> AgentMetadata {
        AgentMetadata::new(self.0.clone())
    }

    async fn run(&self, input: Value) -> Result<Value, AgentError> {
        let mut path = input
            .get("path")
            .and_then(Value::as_array)
            .cloned()
            .ok_or_else(|| AgentError::InvalidInput("missing path".into()))?;
        path.push(json!(self.0));
        Ok(json!({ "path": path }))
    }
}

/// Fails with a fixed message.
pub struct Broken(pub AgentName);

impl Broken {
    pub fn new(s: &str) -> Self {
        Self(name(s))
    }
}

#[async_trait]
impl Agent for Broken {
    fn metadata(&self) -> AgentMetadata {
        AgentMetadata::new(self.0.clone())
    }

    async fn run(&self, _input: Value) -> Result<Value, AgentError> {
        Err(AgentError::failed("broken on purpose"))
    }
}

/// Sleeps for `input.delay_ms` and returns `input.id`, tracking overlap.
#[derive(Default)]
pub struct Sleeper {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl Sleeper {
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Agent for Sleeper {
    fn metadata(&self) -> AgentMetadata {
        AgentMetadata::new(name("sleeper"))
    }

    async fn run(&self, input: Value) -> Result<Value, AgentError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let delay = input.get("delay_ms").and_then(Value::as_u64).unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(input.get("id").cloned().unwrap_or(Value::Null))
    }
}
