//! Assignment records.
//!
//! An assignment tracks one attempt at a task through the lifecycle: which agent it
//! is bound to, when each transition happened, what the agent produced and what the
//! reviewer said about it.

use crate::lifecycle::TaskStatus;
use crate::review::ReviewOutcome;
use arch_abstraction::{AgentResult, Priority, Task, TaskType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error};

/// Opaque identifier of an assignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Generates a fresh identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Estimates the hours a task should take.
///
/// `base_hours(task_type) * (complexity / 5.0)`; unknown task types use 2.0 base hours.
#[must_use]
pub fn estimate_hours(task_type: TaskType, complexity: u8) -> f64 {
    let base = match task_type {
        TaskType::SystemDesign => 4.0,
        TaskType::Testing => 2.5,
        _ => 2.0,
    };
    base * (f64::from(complexity) / 5.0)
}

fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 3_600_000.0
}

/// One attempt at a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    /// Unique id, never reused.
    pub id: TaskId,
    /// Id of the agent instance bound to this attempt.
    pub agent_id: String,
    /// Agent pool name the attempt was assigned under.
    pub agent_type: String,
    /// The work to do.
    pub task: Task,
    /// Current status.
    pub status: TaskStatus,
    /// When the assignment was created.
    pub assigned_at: DateTime<Utc>,
    /// When execution started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the agent's result was recorded.
    pub submitted_at: Option<DateTime<Utc>>,
    /// When the result was approved.
    pub completed_at: Option<DateTime<Utc>>,
    /// Agent output, once execution has finished.
    pub result: Option<AgentResult>,
    /// Review summaries, oldest first.
    pub review_notes: Vec<String>,
    /// Outcome of the most recent review.
    pub review_outcome: Option<ReviewOutcome>,
    /// Revision cycles requested along the chain leading to this attempt.
    pub revision_count: u32,
    /// The attempt this one revises.
    pub revision_of: Option<TaskId>,
    /// The attempt created to revise this one.
    pub superseded_by: Option<TaskId>,
    /// Estimated effort in hours.
    pub estimated_hours: f64,
    /// Measured effort in hours (`submitted_at - started_at`).
    pub actual_hours: Option<f64>,
}

impl Assignment {
    /// Creates an assignment in `Assigned` status.
    #[must_use]
    pub fn new(agent_id: impl Into<String>, agent_type: impl Into<String>, task: Task) -> Self {
        let estimated_hours = estimate_hours(task.task_type, task.complexity);
        Self {
            id: TaskId::generate(),
            agent_id: agent_id.into(),
            agent_type: agent_type.into(),
            task,
            status: TaskStatus::Assigned,
            assigned_at: Utc::now(),
            started_at: None,
            submitted_at: None,
            completed_at: None,
            result: None,
            review_notes: Vec::new(),
            review_outcome: None,
            revision_count: 0,
            revision_of: None,
            superseded_by: None,
            estimated_hours,
            actual_hours: None,
        }
    }

    /// Moves the assignment to `to`.
    ///
    /// # Returns
    /// Returns `Ok` with the previous status if the transition is valid, or `Err` with
    /// the current status if it is not.
    pub fn transition(&mut self, to: TaskStatus) -> Result<TaskStatus, TaskStatus> {
        let from = self.status;
        if !from.can_transition_to(to) {
            error!(task_id = %self.id, from = ?from, to = ?to, "Invalid status transition");
            return Err(from);
        }

        debug!(task_id = %self.id, from = ?from, to = ?to, "Status transition");
        self.status = to;

        let now = Utc::now();
        match to {
            TaskStatus::InProgress => {
                self.started_at.get_or_insert(now);
            }
            TaskStatus::Submitted => {
                let submitted = *self.submitted_at.get_or_insert(now);
                if let Some(started) = self.started_at {
                    self.actual_hours = Some(hours_between(started, submitted));
                }
            }
            TaskStatus::Approved => {
                self.completed_at.get_or_insert(now);
            }
            _ => {}
        }

        Ok(from)
    }

    /// Hours from assignment to approval, when both are known.
    #[must_use]
    pub fn completion_hours(&self) -> Option<f64> {
        self.completed_at.map(|done| hours_between(self.assigned_at, done))
    }

    /// Builds a read-only projection of this assignment.
    #[must_use]
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            task_id: self.id.clone(),
            status: self.status,
            agent_id: self.agent_id.clone(),
            agent_type: self.agent_type.clone(),
            task_type: self.task.task_type,
            complexity: self.task.complexity,
            priority: self.task.priority,
            assigned_at: self.assigned_at,
            started_at: self.started_at,
            submitted_at: self.submitted_at,
            completed_at: self.completed_at,
            estimated_hours: self.estimated_hours,
            actual_hours: self.actual_hours,
            revision_count: self.revision_count,
            revision_of: self.revision_of.clone(),
            superseded_by: self.superseded_by.clone(),
            result: self.result.clone(),
            review_outcome: self.review_outcome,
            review_notes: self.review_notes.clone(),
        }
    }
}

/// Read-only view of an assignment, safe to hand to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Task id.
    pub task_id: TaskId,
    /// Current status.
    pub status: TaskStatus,
    /// Agent instance id.
    pub agent_id: String,
    /// Agent pool name.
    pub agent_type: String,
    /// Kind of work.
    pub task_type: TaskType,
    /// Complexity on a 1-10 scale.
    pub complexity: u8,
    /// Priority.
    pub priority: Priority,
    /// Creation time.
    pub assigned_at: DateTime<Utc>,
    /// Execution start.
    pub started_at: Option<DateTime<Utc>>,
    /// Result recorded.
    pub submitted_at: Option<DateTime<Utc>>,
    /// Approval time.
    pub completed_at: Option<DateTime<Utc>>,
    /// Estimated effort in hours.
    pub estimated_hours: f64,
    /// Measured effort in hours.
    pub actual_hours: Option<f64>,
    /// Revision cycles on the chain so far.
    pub revision_count: u32,
    /// Attempt this one revises.
    pub revision_of: Option<TaskId>,
    /// Attempt that revises this one.
    pub superseded_by: Option<TaskId>,
    /// Agent output, when executed.
    pub result: Option<AgentResult>,
    /// Most recent review outcome.
    pub review_outcome: Option<ReviewOutcome>,
    /// Review summaries, oldest first.
    pub review_notes: Vec<String>,
}
