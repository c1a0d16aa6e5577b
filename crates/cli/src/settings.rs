//! Configuration loading for the CLI.

use std::path::Path;

use anyhow::{Context, Result};
use pipeline::RelayConfig;
use tracing::{debug, info};

/// Loads `RelayConfig`: defaults, then the optional JSON file, then `RELAY_*`
/// environment overrides, then validation.
pub fn load(path: Option<&Path>) -> Result<RelayConfig> {
    load_with(path, |key| std::env::var(key).ok())
}

/// Same as [`load`], with overrides read through `lookup` instead of the
/// process environment.
pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<RelayConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let base = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            let config: RelayConfig = serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse config file {}", path.display()))?;
            debug!(path = %path.display(), "loaded config file");
            config
        }
        None => RelayConfig::default(),
    };

    let config = base.with_overrides(lookup)?;
    config.validate()?;
    info!(
        concurrency_limit = config.concurrency_limit,
        queue_interval_ms = config.queue_interval_ms,
        trace_capacity = config.trace_capacity,
        "configuration loaded"
    );
    Ok(config)
}
