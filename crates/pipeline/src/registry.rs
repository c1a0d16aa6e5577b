//! Name-to-agent lookup.

use std::collections::HashMap;
use std::sync::Arc;

use crate::{Agent, AgentMetadata, AgentName, RelayError};

/// Registry of available agents, keyed by [`AgentName`].
///
/// Populated once at startup and then shared read-only behind an `Arc`.
#[derive(Clone, Default)]
pub struct AgentRegistry {
    agents: HashMap<AgentName, Arc<dyn Agent>>,
}

impl AgentRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an agent under its metadata name.
    ///
    /// Fails if another agent already holds that name.
    pub fn register(&mut self, agent: Arc<dyn Agent>) -> Result<(), RelayError> {
        let name = agent.name();
        if self.agents.contains_key(&name) {
            return Err(RelayError::DuplicateAgent { name });
        }
        self.agents.insert(name, agent);
        Ok(())
    }

    /// Builder-style [`AgentRegistry::register`].
    pub fn with(mut self, agent: Arc<dyn Agent>) -> Result<Self, RelayError> {
        self.register(agent)?;
        Ok(self)
    }

    /// Get an agent by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Agent>> {
        self.agents.get(name).map(Arc::clone)
    }

    /// Check if an agent is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.agents.contains_key(name)
    }

    /// All registered names, sorted.
    pub fn names(&self) -> Vec<AgentName> {
        let mut names: Vec<AgentName> = self.agents.keys().cloned().collect();
        names.sort();
        names
    }

    /// Metadata for every registered agent, sorted by name.
    pub fn metadata(&self) -> Vec<AgentMetadata> {
        let mut all: Vec<AgentMetadata> = self.agents.values().map(|a| a.metadata()).collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    /// Number of registered agents.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("agents", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Named(&'static str);

    #[async_trait]
    impl Agent for Named {
        fn metadata(&self) -> AgentMetadata {
            AgentMetadata::new(AgentName::new(self.0).unwrap())
        }
    }

    #[test]
    fn register_and_get() {
        let registry = AgentRegistry::new()
            .with(Arc::new(Named("sales")))
            .unwrap()
            .with(Arc::new(Named("content")))
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("sales"));
        assert_eq!(registry.get("content").unwrap().name().as_str(), "content");
        assert!(registry.get("admin").is_none());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut registry = AgentRegistry::new();
        registry.register(Arc::new(Named("sales"))).unwrap();
        let err = registry.register(Arc::new(Named("sales"))).unwrap_err();
        assert!(matches!(err, RelayError::DuplicateAgent { ref name } if name.as_str() == "sales"));
    }

    #[test]
    fn names_are_sorted() {
        let registry = AgentRegistry::new()
            .with(Arc::new(Named("zeta")))
            .unwrap()
            .with(Arc::new(Named("alpha")))
            .unwrap();
        let names: Vec<String> = registry.names().iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert_eq!(registry.metadata()[0].name.as_str(), "alpha");
    }

    #[test]
    fn empty_registry() {
        let registry = AgentRegistry::default();
        assert!(registry.is_empty());
        assert_eq!(format!("{registry:?}"), "AgentRegistry { agents: [] }");
    }
}
