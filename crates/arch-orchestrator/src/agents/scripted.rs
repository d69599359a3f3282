//! Scripted agent implementation.
//!
//! Returns pre-set outputs in order, repeating the last one once the script runs out.
//! Useful as a deterministic worker for demos and tests.

use arch_abstraction::{Agent, AgentError, AgentResult, Task};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

/// An agent that replays a fixed list of outputs.
#[derive(Debug)]
pub struct ScriptedAgent {
    id: String,
    description: String,
    outputs: Vec<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    shut_down: AtomicBool,
}

impl ScriptedAgent {
    /// Creates a new `ScriptedAgent` with the given ID and outputs.
    #[must_use]
    pub fn new(id: impl Into<String>, outputs: Vec<String>) -> Self {
        Self {
            id: id.into(),
            description: "Replays scripted outputs".to_string(),
            outputs,
            delay: None,
            calls: AtomicUsize::new(0),
            shut_down: AtomicBool::new(false),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sleeps for `delay` before answering each task.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of tasks processed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Whether `shutdown` has been called.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Agent for ScriptedAgent {
    fn id(&self) -> &str {
        &self.id
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn process(&self, task: &Task) -> Result<AgentResult, AgentError> {
        if self.is_shut_down() {
            return Err(AgentError::Unavailable(format!("{} has been shut down", self.id)));
        }

        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        debug!(agent_id = %self.id, call, task_type = %task.task_type, "ScriptedAgent processing");

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let Some(output) = self.outputs.get(call).or_else(|| self.outputs.last()) else {
            return Ok(AgentResult::failure("no scripted output"));
        };

        Ok(AgentResult::success(output.clone())
            .with_backend("scripted", "local")
            .with_usage((output.len() / 4) as u64, 0.0)
            .with_execution_time(self.delay.map_or(0.0, |d| d.as_secs_f64())))
    }

    async fn shutdown(&self) -> Result<(), AgentError> {
        self.shut_down.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arch_abstraction::TaskType;

    #[tokio::test]
    async fn test_replays_outputs_in_order() {
        let agent = ScriptedAgent::new("s", vec!["first".to_string(), "second".to_string()]);
        let task = Task::new(TaskType::General, "x");

        assert_eq!(agent.process(&task).await.unwrap().output.as_deref(), Some("first"));
        assert_eq!(agent.process(&task).await.unwrap().output.as_deref(), Some("second"));
        assert_eq!(agent.process(&task).await.unwrap().output.as_deref(), Some("second"));
        assert_eq!(agent.calls(), 3);
    }

    #[tokio::test]
    async fn test_empty_script_reports_failure() {
        let agent = ScriptedAgent::new("s", Vec::new());
        let result = agent.process(&Task::new(TaskType::General, "x")).await.unwrap();
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_refuses_after_shutdown() {
        let agent = ScriptedAgent::new("s", vec!["x".to_string()]);
        agent.shutdown().await.unwrap();
        let err = agent.process(&Task::new(TaskType::General, "x")).await.unwrap_err();
        assert!(matches!(err, AgentError::Unavailable(_)));
    }
}
