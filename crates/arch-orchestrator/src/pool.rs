//! Agent pool for managing registered workers.
//!
//! Workers are registered at startup under an agent type name ("backend",
//! "frontend", ...) and looked up by that name when a task is assigned.

use arch_abstraction::{Agent, AgentError};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Metadata about a registered worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentMetadata {
    /// Name the worker is registered under.
    pub agent_type: String,
    /// The worker's own ID.
    pub id: String,
    /// The worker's description.
    pub description: String,
}

/// Named registry of workers.
pub struct AgentPool {
    /// Map of agent type to agent instance.
    agents: Arc<RwLock<HashMap<String, Arc<dyn Agent>>>>,
}

impl fmt::Debug for AgentPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentPool")
            .field("agent_count", &self.agents.try_read().map(|a| a.len()).unwrap_or(0))
            .finish_non_exhaustive()
    }
}

impl AgentPool {
    /// Creates a new empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self { agents: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Registers a worker under `agent_type`.
    ///
    /// # Returns
    /// Returns `true` if the type was newly registered, `false` if it replaced an existing worker.
    pub async fn register_agent(&self, agent_type: &str, agent: Arc<dyn Agent>) -> bool {
        debug!(agent_type = %agent_type, agent_id = %agent.id(), "Registering agent");

        let mut agents = self.agents.write().await;
        let was_new = agents.insert(agent_type.to_string(), agent).is_none();

        if !was_new {
            warn!(agent_type = %agent_type, "Agent replaced in pool");
        }

        was_new
    }

    /// Retrieves the worker registered under `agent_type`.
    pub async fn get_agent(&self, agent_type: &str) -> Option<Arc<dyn Agent>> {
        let agents = self.agents.read().await;
        agents.get(agent_type).cloned()
    }

    /// Lists all registered workers, sorted by agent type.
    pub async fn list_agents(&self) -> Vec<AgentMetadata> {
        let agents = self.agents.read().await;
        let mut listed: Vec<AgentMetadata> = agents
            .iter()
            .map(|(agent_type, agent)| AgentMetadata {
                agent_type: agent_type.clone(),
                id: agent.id().to_string(),
                description: agent.description().to_string(),
            })
            .collect();
        listed.sort_by(|a, b| a.agent_type.cmp(&b.agent_type));
        listed
    }

    /// Returns the registered agent type names, sorted.
    pub async fn agent_types(&self) -> Vec<String> {
        let agents = self.agents.read().await;
        let mut types: Vec<String> = agents.keys().cloned().collect();
        types.sort();
        types
    }

    /// Removes the worker registered under `agent_type`.
    ///
    /// # Returns
    /// Returns `true` if a worker was found and removed, `false` otherwise.
    pub async fn unregister_agent(&self, agent_type: &str) -> bool {
        debug!(agent_type = %agent_type, "Unregistering agent");

        let mut agents = self.agents.write().await;
        let removed = agents.remove(agent_type).is_some();

        if !removed {
            warn!(agent_type = %agent_type, "Attempted to unregister non-existent agent");
        }

        removed
    }

    /// Checks if a worker is registered under `agent_type`.
    pub async fn is_registered(&self, agent_type: &str) -> bool {
        let agents = self.agents.read().await;
        agents.contains_key(agent_type)
    }

    /// Returns the number of registered workers.
    pub async fn count(&self) -> usize {
        let agents = self.agents.read().await;
        agents.len()
    }

    /// Shuts down every registered worker.
    ///
    /// # Returns
    /// Returns the agent types whose shutdown failed, with the error.
    pub async fn shutdown_all(&self) -> Vec<(String, AgentError)> {
        let agents: Vec<(String, Arc<dyn Agent>)> = {
            let agents = self.agents.read().await;
            agents.iter().map(|(t, a)| (t.clone(), Arc::clone(a))).collect()
        };

        let mut failures = Vec::new();
        for (agent_type, agent) in agents {
            if let Err(e) = agent.shutdown().await {
                warn!(agent_type = %agent_type, error = %e, "Agent shutdown failed");
                failures.push((agent_type, e));
            }
        }
        failures
    }
}

impl Default for AgentPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::ScriptedAgent;

    fn agent(id: &str) -> Arc<dyn Agent> {
        Arc::new(ScriptedAgent::new(id, vec!["def ok(): pass".to_string()]))
    }

    #[tokio::test]
    async fn test_register_agent() {
        let pool = AgentPool::new();
        assert!(pool.register_agent("backend", agent("backend-1")).await);
        assert_eq!(pool.count().await, 1);
        assert!(pool.is_registered("backend").await);
        assert!(!pool.is_registered("frontend").await);
    }

    #[tokio::test]
    async fn test_register_duplicate_type_replaces() {
        let pool = AgentPool::new();
        assert!(pool.register_agent("backend", agent("backend-1")).await);
        assert!(!pool.register_agent("backend", agent("backend-2")).await);
        assert_eq!(pool.count().await, 1);
        assert_eq!(pool.get_agent("backend").await.unwrap().id(), "backend-2");
    }

    #[tokio::test]
    async fn test_get_nonexistent_agent() {
        let pool = AgentPool::new();
        assert!(pool.get_agent("nonexistent").await.is_none());
    }

    #[tokio::test]
    async fn test_list_and_types_sorted() {
        let pool = AgentPool::new();
        pool.register_agent("qa", agent("qa-1")).await;
        pool.register_agent("backend", agent("backend-1")).await;

        assert_eq!(pool.agent_types().await, vec!["backend".to_string(), "qa".to_string()]);
        let listed = pool.list_agents().await;
        assert_eq!(listed[0].agent_type, "backend");
        assert_eq!(listed[1].id, "qa-1");
    }

    #[tokio::test]
    async fn test_unregister_agent() {
        let pool = AgentPool::new();
        pool.register_agent("backend", agent("backend-1")).await;
        assert!(pool.unregister_agent("backend").await);
        assert!(!pool.unregister_agent("backend").await);
        assert_eq!(pool.count().await, 0);
    }

    #[tokio::test]
    async fn test_shutdown_all_stops_agents() {
        let pool = AgentPool::new();
        let scripted = Arc::new(ScriptedAgent::new("backend-1", vec!["x".to_string()]));
        pool.register_agent("backend", scripted.clone()).await;

        assert!(pool.shutdown_all().await.is_empty());
        assert!(scripted.is_shut_down());
    }
}
