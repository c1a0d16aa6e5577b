//! Runtime configuration for the orchestration layer.
//!
//! Values are read once at process start: defaults, then an optional JSON
//! file (see the `cli` crate), then `RELAY_*` environment overrides, then
//! [`RelayConfig::validate`].

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::RelayError;

/// Default maximum number of tasks in flight at once.
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 5;

/// Default delay inserted after each throttled task, in milliseconds.
pub const DEFAULT_QUEUE_INTERVAL_MS: u64 = 100;

/// Default number of trace entries retained in memory.
pub const DEFAULT_TRACE_CAPACITY: usize = 10_000;

const ENV_CONCURRENCY_LIMIT: &str = "RELAY_CONCURRENCY_LIMIT";
const ENV_QUEUE_INTERVAL_MS: &str = "RELAY_QUEUE_INTERVAL_MS";
const ENV_TRACE_CAPACITY: &str = "RELAY_TRACE_CAPACITY";
const ENV_MAX_DURATION_SAMPLES: &str = "RELAY_MAX_DURATION_SAMPLES";

/// Orchestration limits shared by every component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Maximum simultaneous in-flight tasks; also the batch chunk size.
    pub concurrency_limit: usize,

    /// Delay after each task on a throttled worker, in milliseconds.
    pub queue_interval_ms: u64,

    /// Number of trace entries retained before the oldest is evicted.
    pub trace_capacity: usize,

    /// Per-agent cap on retained duration samples. `None` keeps every sample.
    pub max_duration_samples: Option<usize>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            queue_interval_ms: DEFAULT_QUEUE_INTERVAL_MS,
            trace_capacity: DEFAULT_TRACE_CAPACITY,
            max_duration_samples: None,
        }
    }
}

impl RelayConfig {
    /// Defaults overlaid with `RELAY_*` environment variables.
    pub fn from_env() -> Result<Self, RelayError> {
        Self::default().with_env_overrides()
    }

    /// Overlays `RELAY_*` environment variables onto `self`.
    pub fn with_env_overrides(self) -> Result<Self, RelayError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Overlays values produced by `lookup` (keyed by environment variable name).
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, RelayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_CONCURRENCY_LIMIT) {
            self.concurrency_limit = parse_var(ENV_CONCURRENCY_LIMIT, &raw)?;
        }
        if let Some(raw) = lookup(ENV_QUEUE_INTERVAL_MS) {
            self.queue_interval_ms = parse_var(ENV_QUEUE_INTERVAL_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_TRACE_CAPACITY) {
            self.trace_capacity = parse_var(ENV_TRACE_CAPACITY, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MAX_DURATION_SAMPLES) {
            self.max_duration_samples = Some(parse_var(ENV_MAX_DURATION_SAMPLES, &raw)?);
        }
        Ok(self)
    }

    /// Rejects limits that would make orchestration impossible.
    pub fn validate(&self) -> Result<(), RelayError> {
        if self.concurrency_limit == 0 {
            return Err(config_error("concurrency_limit must be at least 1"));
        }
        if self.trace_capacity == 0 {
            return Err(config_error("trace_capacity must be at least 1"));
        }
        if self.max_duration_samples == Some(0) {
            return Err(config_error("max_duration_samples must be at least 1 when set"));
        }
        Ok(())
    }

    /// [`RelayConfig::queue_interval_ms`] as a [`Duration`].
    pub fn queue_interval(&self) -> Duration {
        Duration::from_millis(self.queue_interval_ms)
    }
}

fn parse_var<T: FromStr>(key: &str, raw: &str) -> Result<T, RelayError> {
    raw.trim()
        .parse()
        .map_err(|_| config_error(format!("{key} has an invalid value: '{raw}'")))
}

fn config_error(message: impl Into<String>) -> RelayError {
    RelayError::ConfigurationError {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.concurrency_limit, 5);
        assert_eq!(config.queue_interval(), Duration::from_millis(100));
        assert_eq!(config.trace_capacity, 10_000);
        assert!(config.max_duration_samples.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn overrides_replace_defaults() {
        let config = RelayConfig::default()
            .with_overrides(lookup(&[
                ("RELAY_CONCURRENCY_LIMIT", "12"),
                ("RELAY_QUEUE_INTERVAL_MS", " 0 "),
                ("RELAY_MAX_DURATION_SAMPLES", "500"),
            ]))
            .unwrap();
        assert_eq!(config.concurrency_limit, 12);
        assert_eq!(config.queue_interval_ms, 0);
        assert_eq!(config.trace_capacity, 10_000);
        assert_eq!(config.max_duration_samples, Some(500));
    }

    #[test]
    fn unparseable_override_is_a_configuration_error() {
        let err = RelayConfig::default()
            .with_overrides(lookup(&[("RELAY_TRACE_CAPACITY", "lots")]))
            .unwrap_err();
        assert!(err.to_string().contains("RELAY_TRACE_CAPACITY"));
    }

    #[test]
    fn zero_limits_fail_validation() {
        let config = RelayConfig {
            concurrency_limit: 0,
            ..RelayConfig::default()
        };
        assert!(config.validate().is_err());

        let config = RelayConfig {
            max_duration_samples: Some(0),
            ..RelayConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: RelayConfig = serde_json::from_str(r#"{"concurrency_limit": 3}"#).unwrap();
        assert_eq!(config.concurrency_limit, 3);
        assert_eq!(config.trace_capacity, DEFAULT_TRACE_CAPACITY);
    }
}
