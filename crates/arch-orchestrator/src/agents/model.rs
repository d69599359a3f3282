//! Model-backed agent implementation.
//!
//! This agent turns a task into a prompt, sends it to an execution backend and
//! reports the backend's output along with token, cost and timing accounting.

use arch_abstraction::{Agent, AgentError, AgentResult, Model, Task};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

/// An agent that delegates to a [`Model`].
pub struct ModelAgent {
    id: String,
    description: String,
    /// Role preamble placed ahead of every task prompt.
    role: String,
    model: Arc<dyn Model>,
    /// USD per 1000 tokens.
    cost_per_1k_tokens: f64,
}

impl fmt::Debug for ModelAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelAgent")
            .field("id", &self.id)
            .field("model", &self.model.model_id())
            .finish_non_exhaustive()
    }
}

impl ModelAgent {
    /// Creates a new `ModelAgent`.
    ///
    /// # Arguments
    /// * `id` - The agent ID
    /// * `role` - Role preamble prepended to every prompt
    /// * `model` - The backend to delegate to
    #[must_use]
    pub fn new(id: impl Into<String>, role: impl Into<String>, model: Arc<dyn Model>) -> Self {
        Self {
            id: id.into(),
            description: "Delegates tasks to a language model".to_string(),
            role: role.into(),
            model,
            cost_per_1k_tokens: 0.0,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the price used to turn token usage into cost.
    #[must_use]
    pub fn with_cost_per_1k_tokens(mut self, cost: f64) -> Self {
        self.cost_per_1k_tokens = cost;
        self
    }

    /// Builds the prompt sent to the model for `task`.
    #[must_use]
    pub fn build_prompt(&self, task: &Task) -> String {
        let mut prompt = format!(
            "{}\n\nTask type: {}\nPriority: {:?}\nComplexity: {}/10\n\n{}",
            self.role.trim(),
            task.task_type,
            task.priority,
            task.complexity,
            task.description
        );
        if !task.metadata.is_empty() {
            prompt.push_str("\n\nContext:\n");
            for (key, value) in &task.metadata {
                prompt.push_str(&format!("- {key}: {value}\n"));
            }
        }
        prompt
    }
}

#[async_trait]
impl Agent for ModelAgent {
    fn id(&self) -> &str {
        &self.id
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn process(&self, task: &Task) -> Result<AgentResult, AgentError> {
        let prompt = self.build_prompt(task);
        debug!(agent_id = %self.id, prompt_len = prompt.len(), "ModelAgent executing");

        let started = Instant::now();
        let response = self.model.generate_text(&prompt).await.map_err(|e| {
            error!(agent_id = %self.id, error = %e, "Model generation failed");
            e
        })?;
        let elapsed = started.elapsed().as_secs_f64();

        let tokens = response.usage.map_or(0, |u| u64::from(u.total_tokens));
        let cost = tokens as f64 / 1000.0 * self.cost_per_1k_tokens;
        let model_used = response.model_id.unwrap_or_else(|| self.model.model_id().to_string());

        debug!(
            agent_id = %self.id,
            response_len = response.content.len(),
            tokens,
            "ModelAgent completed"
        );

        Ok(AgentResult::success(response.content)
            .with_backend(model_used, self.model.provider())
            .with_usage(tokens, cost)
            .with_execution_time(elapsed))
    }
}
