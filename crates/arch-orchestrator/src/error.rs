// Error types for orchestration

use crate::assignment::TaskId;
use crate::config::ConfigError;
use crate::lifecycle::TaskStatus;
use arch_abstraction::AgentError;
use std::time::Duration;
use thiserror::Error;

/// Result type for orchestration operations
pub type Result<T> = std::result::Result<T, OrchestrationError>;

/// Orchestration errors
#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// No assignment exists for the task id
    #[error("Task {0} not found")]
    NotFound(TaskId),

    /// The assignment is not in a state that permits the operation
    #[error("Task {task_id} cannot {operation} while {status}")]
    InvalidState {
        /// Task id
        task_id: TaskId,
        /// Current status
        status: TaskStatus,
        /// Operation that was attempted
        operation: &'static str,
    },

    /// A revision was already requested for this attempt
    #[error("Task {task_id} was already revised as {successor}")]
    AlreadyRevised {
        /// Task id
        task_id: TaskId,
        /// The attempt created by the earlier request
        successor: TaskId,
    },

    /// No worker is registered under the requested agent type
    #[error("Agent type '{agent_type}' not available. Active agents: {available:?}")]
    UnknownAgentType {
        /// Requested agent type
        agent_type: String,
        /// Agent types currently registered
        available: Vec<String>,
    },

    /// Complexity outside 1..=10
    #[error("Complexity {0} is outside the range 1-10")]
    InvalidComplexity(u8),

    /// The agent reported `success = false`
    #[error("Task {task_id} failed: {reason}")]
    ExecutionFailed {
        /// Task id
        task_id: TaskId,
        /// Error reported by the agent
        reason: String,
    },

    /// The agent raised an error
    #[error("Task {task_id} failed: {source}")]
    Agent {
        /// Task id
        task_id: TaskId,
        /// Underlying agent error
        #[source]
        source: AgentError,
    },

    /// The agent did not finish in time
    #[error("Task {task_id} timed out after {after:?}")]
    Timeout {
        /// Task id
        task_id: TaskId,
        /// Configured timeout
        after: Duration,
    },

    /// Execution was cancelled by the caller
    #[error("Task {0} execution cancelled")]
    Cancelled(TaskId),

    /// The orchestrator has been shut down
    #[error("Orchestrator has been shut down")]
    ShutDown,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl OrchestrationError {
    /// Returns `true` for errors that came out of running an agent.
    ///
    /// Each of these moves the assignment to `Failed`.
    #[must_use]
    pub const fn is_execution_failure(&self) -> bool {
        matches!(
            self,
            Self::ExecutionFailed { .. } | Self::Agent { .. } | Self::Timeout { .. } | Self::Cancelled(_)
        )
    }
}
