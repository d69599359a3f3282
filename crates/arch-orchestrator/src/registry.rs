//! Task assignment registry.
//!
//! Plain in-memory store of every assignment and every review produced. It does no
//! locking of its own; the orchestrator owns it behind a single lock.

use crate::assignment::{Assignment, TaskId};
use crate::error::{OrchestrationError, Result};
use crate::review::Review;
use std::collections::HashMap;

/// Store of assignments keyed by task id, plus the review log.
#[derive(Debug, Default)]
pub struct AssignmentRegistry {
    assignments: HashMap<TaskId, Assignment>,
    /// Task ids in creation order.
    order: Vec<TaskId>,
    /// Every review, in the order produced.
    reviews: Vec<Review>,
}

impl AssignmentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a new assignment.
    pub fn insert(&mut self, assignment: Assignment) {
        let id = assignment.id.clone();
        if self.assignments.insert(id.clone(), assignment).is_none() {
            self.order.push(id);
        }
    }

    /// Looks up an assignment.
    #[must_use]
    pub fn get(&self, task_id: &TaskId) -> Option<&Assignment> {
        self.assignments.get(task_id)
    }

    /// Looks up an assignment, failing with `NotFound`.
    pub fn require(&self, task_id: &TaskId) -> Result<&Assignment> {
        self.assignments.get(task_id).ok_or_else(|| OrchestrationError::NotFound(task_id.clone()))
    }

    /// Looks up an assignment for mutation, failing with `NotFound`.
    pub fn require_mut(&mut self, task_id: &TaskId) -> Result<&mut Assignment> {
        self.assignments
            .get_mut(task_id)
            .ok_or_else(|| OrchestrationError::NotFound(task_id.clone()))
    }

    /// Iterates assignments in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Assignment> {
        self.order.iter().filter_map(|id| self.assignments.get(id))
    }

    /// Number of assignments ever created.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Returns `true` when nothing has been assigned yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Appends a review to the log.
    pub fn record_review(&mut self, review: Review) {
        self.reviews.push(review);
    }

    /// Every review, oldest first.
    #[must_use]
    pub fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    /// Reviews of one assignment, oldest first.
    pub fn reviews_for<'a>(&'a self, task_id: &'a TaskId) -> impl Iterator<Item = &'a Review> + 'a {
        self.reviews.iter().filter(move |r| &r.task_id == task_id)
    }

    /// Walks `revision_of` links from `task_id` back to the first attempt.
    ///
    /// The result is ordered root first and ends with `task_id`.
    pub fn chain(&self, task_id: &TaskId) -> Result<Vec<TaskId>> {
        let mut chain = vec![self.require(task_id)?.id.clone()];
        let mut cursor = self.require(task_id)?.revision_of.clone();
        while let Some(parent) = cursor {
            let assignment = self.require(&parent)?;
            chain.push(parent);
            cursor = assignment.revision_of.clone();
        }
        chain.reverse();
        Ok(chain)
    }
}
