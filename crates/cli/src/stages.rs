//! Parsing of the `--stages` flow notation.
//!
//! Stages are comma-separated. A bracketed group of `|`-separated names is a
//! parallel block: `research,[draft|outline],publish`.

use anyhow::{bail, Context, Result};
use orchestrator::{PipelineStep, Stage};
use pipeline::AgentRegistry;

/// A stage before its agents are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedStage {
    Step(String),
    Parallel(Vec<String>),
}

/// Splits flow notation into unresolved stages.
pub fn parse_stages(raw: &str) -> Result<Vec<ParsedStage>> {
    let mut stages = Vec::new();
    for token in split_top_level(raw)? {
        let token = token.trim();
        if token.is_empty() {
            bail!("empty stage in '{raw}'");
        }
        match token.strip_prefix('[') {
            Some(inner) => {
                let inner = inner
                    .strip_suffix(']')
                    .with_context(|| format!("unterminated parallel block '{token}'"))?;
                let members = inner
                    .split('|')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_owned)
                    .collect();
                stages.push(ParsedStage::Parallel(members));
            }
            None => stages.push(ParsedStage::Step(token.to_owned())),
        }
    }
    Ok(stages)
}

fn split_top_level(raw: &str) -> Result<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in raw.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth = depth
                    .checked_sub(1)
                    .with_context(|| format!("unbalanced ']' at offset {i}"))?;
            }
            ',' if depth == 0 => {
                parts.push(&raw[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        bail!("unbalanced '[' in '{raw}'");
    }
    parts.push(&raw[start..]);
    Ok(parts)
}

/// Looks up one agent by name and binds it to a step of the same name.
pub fn resolve_step(registry: &AgentRegistry, name: &str) -> Result<PipelineStep> {
    let agent = registry
        .get(name)
        .with_context(|| format!("unknown agent '{name}' (known: {})", known(registry)))?;
    Ok(PipelineStep::for_agent(agent))
}

/// Resolves every parsed stage against `registry`.
pub fn resolve_stages(registry: &AgentRegistry, parsed: &[ParsedStage]) -> Result<Vec<Stage>> {
    parsed
        .iter()
        .map(|stage| match stage {
            ParsedStage::Step(name) => resolve_step(registry, name).map(Stage::Step),
            ParsedStage::Parallel(names) => names
                .iter()
                .map(|name| resolve_step(registry, name))
                .collect::<Result<Vec<_>>>()
                .map(Stage::Parallel),
        })
        .collect()
}

fn known(registry: &AgentRegistry) -> String {
    registry
        .names()
        .iter()
        .map(|name| name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
