//! Worker abstraction layer for ARCH.
//!
//! This module defines the task vocabulary shared between the orchestrator and the
//! workers it drives, the `Agent` capability every worker exposes, and the `Model`
//! seam an agent may use to reach an execution backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Represents an error that can occur when calling an execution backend.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelError {
    /// An error occurred during the request (e.g., network issues, invalid request).
    #[error("Request Error: {0}")]
    RequestError(String),

    /// The backend returned an error (e.g., invalid input, rate limiting).
    #[error("Model Response Error: {0}")]
    ModelResponseError(String),

    /// Provider quota exceeded or rate limit hit.
    #[error("Provider '{provider}' quota exceeded{}", message.as_ref().map(|m| format!(": {}", m)).unwrap_or_default())]
    QuotaExceeded {
        /// The provider name (e.g., "openai", "anthropic").
        provider: String,
        /// Optional error message from the provider.
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// Other unexpected errors.
    #[error("Other Model Error: {0}")]
    Other(String),
}

/// Represents an error raised by an agent while processing a task.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentError {
    /// The agent's execution backend failed.
    #[error("Backend error: {0}")]
    Model(#[from] ModelError),

    /// The agent refused the task as malformed or outside its expertise.
    #[error("Invalid task: {0}")]
    InvalidTask(String),

    /// The agent is not running (e.g., already shut down).
    #[error("Agent unavailable: {0}")]
    Unavailable(String),

    /// Other unexpected errors.
    #[error("Agent error: {0}")]
    Other(String),
}

/// A tag that does not name a known variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct ParseTagError {
    /// What was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Kind of work a task represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Produce source code.
    CodeGeneration,
    /// Build an HTTP API surface.
    ApiDevelopment,
    /// Produce an architecture or design document.
    SystemDesign,
    /// Write or run tests.
    Testing,
    /// Ship an artifact to an environment.
    Deployment,
    /// Review someone else's change.
    CodeReview,
    /// Write documentation.
    Documentation,
    /// Provision or change infrastructure.
    Infrastructure,
    /// Audit for security problems.
    SecurityAudit,
    /// Anything else.
    General,
}

impl TaskType {
    /// Returns the snake_case tag used in configuration and logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CodeGeneration => "code_generation",
            Self::ApiDevelopment => "api_development",
            Self::SystemDesign => "system_design",
            Self::Testing => "testing",
            Self::Deployment => "deployment",
            Self::CodeReview => "code_review",
            Self::Documentation => "documentation",
            Self::Infrastructure => "infrastructure",
            Self::SecurityAudit => "security_audit",
            Self::General => "general",
        }
    }
}

impl FromStr for TaskType {
    type Err = ParseTagError;

    /// Parses a task type tag, accepting snake_case or kebab-case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "code_generation" => Ok(Self::CodeGeneration),
            "api_development" => Ok(Self::ApiDevelopment),
            "system_design" => Ok(Self::SystemDesign),
            "testing" => Ok(Self::Testing),
            "deployment" => Ok(Self::Deployment),
            "code_review" => Ok(Self::CodeReview),
            "documentation" => Ok(Self::Documentation),
            "infrastructure" => Ok(Self::Infrastructure),
            "security_audit" => Ok(Self::SecurityAudit),
            "general" => Ok(Self::General),
            _ => Err(ParseTagError { kind: "task type", value: s.to_string() }),
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Can wait.
    Low,
    /// Normal work.
    #[default]
    Medium,
    /// Should be picked up soon.
    High,
    /// Drop everything.
    Critical,
}

impl FromStr for Priority {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(ParseTagError { kind: "priority", value: s.to_string() }),
        }
    }
}

/// An immutable unit of work handed to an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// What kind of work this is.
    pub task_type: TaskType,
    /// Free-text description of the work.
    pub description: String,
    /// Complexity on a 1-10 scale.
    pub complexity: u8,
    /// Scheduling priority.
    pub priority: Priority,
    /// Arbitrary caller-supplied context.
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Task {
    /// Creates a task with medium priority, complexity 5 and no metadata.
    #[must_use]
    pub fn new(task_type: TaskType, description: impl Into<String>) -> Self {
        Self {
            task_type,
            description: description.into(),
            complexity: 5,
            priority: Priority::Medium,
            metadata: BTreeMap::new(),
        }
    }

    /// Sets the complexity.
    #[must_use]
    pub fn with_complexity(mut self, complexity: u8) -> Self {
        self.complexity = complexity;
        self
    }

    /// Sets the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Replaces the metadata map.
    #[must_use]
    pub fn with_metadata(mut self, metadata: BTreeMap<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// The outcome of an agent processing one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    /// Whether the agent considers the task done.
    pub success: bool,
    /// Produced artifact (usually source text).
    pub output: Option<String>,
    /// Cost of producing the output, in USD.
    pub cost: f64,
    /// Tokens consumed by the backend.
    pub tokens_used: u64,
    /// Model identifier that produced the output.
    pub model_used: String,
    /// Provider identifier that served the model.
    pub provider_used: String,
    /// Wall-clock execution time in seconds.
    pub execution_time: f64,
    /// Error description when `success` is false.
    pub error: Option<String>,
}

impl AgentResult {
    /// Creates a successful result carrying `output` and zeroed accounting.
    #[must_use]
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: Some(output.into()),
            cost: 0.0,
            tokens_used: 0,
            model_used: String::new(),
            provider_used: String::new(),
            execution_time: 0.0,
            error: None,
        }
    }

    /// Creates an unsuccessful result carrying `error`.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self { success: false, output: None, error: Some(error.into()), ..Self::success("") }
    }

    /// Records which backend served the request.
    #[must_use]
    pub fn with_backend(mut self, model: impl Into<String>, provider: impl Into<String>) -> Self {
        self.model_used = model.into();
        self.provider_used = provider.into();
        self
    }

    /// Records token and cost accounting.
    #[must_use]
    pub fn with_usage(mut self, tokens_used: u64, cost: f64) -> Self {
        self.tokens_used = tokens_used;
        self.cost = cost;
        self
    }

    /// Records the execution time in seconds.
    #[must_use]
    pub fn with_execution_time(mut self, seconds: f64) -> Self {
        self.execution_time = seconds;
        self
    }
}

/// A worker that turns a task into a result.
///
/// The orchestrator treats an agent purely as this capability; how the agent picks a
/// backend or model is its own business.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Returns the unique ID of this agent instance.
    fn id(&self) -> &str;

    /// Returns a description of the agent's purpose and capabilities.
    fn description(&self) -> &str;

    /// Processes a task.
    ///
    /// This call may suspend for a long time (it usually waits on a network call).
    ///
    /// # Errors
    /// Returns an `AgentError` if the agent could not process the task at all.
    async fn process(&self, task: &Task) -> Result<AgentResult, AgentError>;

    /// Releases any resources held by the agent.
    async fn shutdown(&self) -> Result<(), AgentError> {
        Ok(())
    }
}

/// The response from a text generation backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelResponse {
    /// The generated content.
    pub content: String,

    /// Optional: The ID of the model used to generate the response.
    pub model_id: Option<String>,

    /// Optional: Usage statistics for the request.
    pub usage: Option<ModelUsage>,
}

/// Usage statistics for a model request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ModelUsage {
    /// Number of tokens in the prompt.
    pub prompt_tokens: u32,

    /// Number of tokens in the completion.
    pub completion_tokens: u32,

    /// Total number of tokens used.
    pub total_tokens: u32,
}

/// A text generation backend an agent may delegate to.
#[async_trait]
pub trait Model: Send + Sync {
    /// Generates a completion for `prompt`.
    ///
    /// # Errors
    /// Returns a `ModelError` if generation fails.
    async fn generate_text(&self, prompt: &str) -> Result<ModelResponse, ModelError>;

    /// Returns the ID of the model.
    fn model_id(&self) -> &str;

    /// Returns the provider serving the model.
    fn provider(&self) -> &str;
}
