//! Task lifecycle states.
//!
//! This module defines the status an assignment moves through between assignment and
//! approval, and which moves between them are legal.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Assignment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is known but not yet bound to an agent.
    Planned,
    /// Task is bound to an agent and waiting to execute.
    Assigned,
    /// The agent is working on the task.
    InProgress,
    /// The agent returned a result that has not been reviewed.
    Submitted,
    /// The result is being reviewed.
    UnderReview,
    /// Review failed; a revision may be requested.
    NeedsRevision,
    /// Review passed.
    Approved,
    /// Approved work was shipped by the caller.
    Completed,
    /// Execution failed or the revision ceiling was hit.
    Failed,
}

impl TaskStatus {
    /// Checks if the assignment can move to the given status.
    #[must_use]
    #[allow(clippy::match_same_arms)] // Each arm represents a distinct transition rule
    pub const fn can_transition_to(&self, to: Self) -> bool {
        match (self, to) {
            (Self::Planned, Self::Assigned | Self::Failed) => true,
            (Self::Assigned, Self::InProgress | Self::Failed) => true,
            (Self::InProgress, Self::Submitted | Self::Failed) => true,
            (Self::Submitted, Self::UnderReview) => true,
            (Self::UnderReview, Self::Approved | Self::NeedsRevision) => true,
            // A revision request either spawns a successor or fails the chain
            (Self::NeedsRevision, Self::Failed) => true,
            (Self::Approved, Self::Completed) => true,
            _ => false,
        }
    }

    /// Returns `true` once no further transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns `true` for statuses that count as delivered work.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        matches!(self, Self::Approved | Self::Completed)
    }

    /// Returns the snake_case tag used in logs and snapshots.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Submitted => "submitted",
            Self::UnderReview => "under_review",
            Self::NeedsRevision => "needs_revision",
            Self::Approved => "approved",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
