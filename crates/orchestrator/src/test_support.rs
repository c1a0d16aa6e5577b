//! Agents used by the unit tests in this crate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use pipeline::{Agent, AgentError, AgentMetadata, AgentName, AgentRegistry};
use serde_json::{Map, Value};

pub(crate) fn name(s: &str) -> AgentName {
    AgentName::new(s).unwrap()
}

pub(crate) fn agent_registry(agents: Vec<Arc<dyn Agent>>) -> AgentRegistry {
    let mut registry = AgentRegistry::new();
    for agent in agents {
        registry.register(agent).unwrap();
    }
    registry
}

/// Returns its input unchanged.
pub(crate) struct Echo(AgentName);

impl Echo {
    pub(crate) fn new(s: &str) -> Self {
        Self(name(s))
    }
}

#[async_trait]
impl Agent for Echo {
    fn metadata(&self) -> AgentMetadata {
        AgentMetadata::new(self.0.clone())
    }

    async fn run(&self, input: Value) -> Result<Value, AgentError> {
        Ok(input)
    }
}

/// Always fails.
pub(crate) struct Failing(AgentName);

impl Failing {
    pub(crate) fn new(s: &str) -> Self {
        Self(name(s))
    }
}

#[async_trait]
impl Agent for Failing {
    fn metadata(&self) -> AgentMetadata {
        AgentMetadata::new(self.0.clone())
    }

    async fn run(&self, _input: Value) -> Result<Value, AgentError> {
        Err(AgentError::failed(format!("{} failed", self.0)))
    }
}

/// Wraps its input as `{"<name>": input}` and remembers every input it saw.
pub(crate) struct Recorder {
    name: AgentName,
    seen: Arc<Mutex<Vec<Value>>>,
}

impl Recorder {
    pub(crate) fn new(s: &str) -> Self {
        Self {
            name: name(s),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn seen(&self) -> Arc<Mutex<Vec<Value>>> {
        Arc::clone(&self.seen)
    }
}

#[async_trait]
impl Agent for Recorder {
    fn metadata(&self) -> AgentMetadata {
        AgentMetadata::new(self.name.clone())
    }

    async fn run(&self, input: Value) -> Result<Value, AgentError> {
        self.seen.lock().push(input.clone());
        let mut wrapped = Map::new();
        wrapped.insert(self.name.to_string(), input);
        Ok(Value::Object(wrapped))
    }
}

/// Tracks how many invocations overlap.
#[derive(Default)]
pub(crate) struct Gauge {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl Gauge {
    pub(crate) fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Sleeps before echoing its input, recording concurrency on a [`Gauge`].
pub(crate) struct Slow {
    name: AgentName,
    delay: Duration,
    jitter: bool,
    gauge: Arc<Gauge>,
}

impl Slow {
    pub(crate) fn new(s: &str, delay: Duration) -> Self {
        Self {
            name: name(s),
            delay,
            jitter: false,
            gauge: Arc::new(Gauge::default()),
        }
    }

    /// Varies the delay with the (integer) input so completions interleave.
    pub(crate) fn with_jitter(mut self) -> Self {
        self.jitter = true;
        self
    }

    pub(crate) fn gauge(&self) -> Arc<Gauge> {
        Arc::clone(&self.gauge)
    }
}

#[async_trait]
impl Agent for Slow {
    fn metadata(&self) -> AgentMetadata {
        AgentMetadata::new(self.name.clone())
    }

    async fn run(&self, input: Value) -> Result<Value, AgentError> {
        let now = self.gauge.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.gauge.peak.fetch_max(now, Ordering::SeqCst);

        let extra = if self.jitter {
            Duration::from_millis(input.as_u64().unwrap_or(0) * 7 % 11)
        } else {
            Duration::ZERO
        };
        tokio::time::sleep(self.delay + extra).await;

        self.gauge.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(input)
    }
}

/// Panics whenever asked for its metadata.
pub(crate) struct Nameless;

#[async_trait]
impl Agent for Nameless {
    fn metadata(&self) -> AgentMetadata {
        panic!("metadata unavailable");
    }

    async fn run(&self, input: Value) -> Result<Value, AgentError> {
        Ok(input)
    }
}
