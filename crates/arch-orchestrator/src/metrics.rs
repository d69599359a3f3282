//! Orchestration metrics.
//!
//! Metrics are recomputed from the registry on every call.

use crate::lifecycle::TaskStatus;
use crate::registry::AssignmentRegistry;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Per-agent-type performance figures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentPerformance {
    /// Assignments bound to this agent type.
    pub tasks_assigned: usize,
    /// Assignments approved or completed.
    pub tasks_approved: usize,
    /// Assignments that ended in `Failed`.
    pub tasks_failed: usize,
    /// Mean review score, 0.0 when never reviewed.
    pub average_quality: f64,
    /// Sum of agent-reported cost.
    pub total_cost: f64,
    /// Sum of agent-reported tokens.
    pub total_tokens: u64,
}

/// Summary statistics over every assignment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationMetrics {
    /// Assignments ever created.
    pub total_tasks: usize,
    /// Assignments approved or completed.
    pub completed_tasks: usize,
    /// Mean hours from assignment to approval.
    pub average_completion_time: f64,
    /// Mean `revision_count` across all assignments.
    pub average_review_cycles: f64,
    /// Every review score, in the order reviews were produced.
    pub quality_trends: Vec<u8>,
    /// Figures per agent type.
    pub agent_performance: BTreeMap<String, AgentPerformance>,
}

fn mean(sum: f64, count: usize) -> f64 {
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Computes metrics over the full registry.
#[must_use]
pub fn aggregate(registry: &AssignmentRegistry) -> OrchestrationMetrics {
    let mut completed_tasks = 0;
    let mut completion_sum = 0.0;
    let mut completion_count = 0;
    let mut revision_sum = 0.0;
    let mut agent_performance: BTreeMap<String, AgentPerformance> = BTreeMap::new();

    for assignment in registry.iter() {
        if assignment.status.is_done() {
            completed_tasks += 1;
        }
        if let Some(hours) = assignment.completion_hours() {
            completion_sum += hours;
            completion_count += 1;
        }
        revision_sum += f64::from(assignment.revision_count);

        let perf = agent_performance.entry(assignment.agent_type.clone()).or_default();
        perf.tasks_assigned += 1;
        if assignment.status.is_done() {
            perf.tasks_approved += 1;
        }
        if assignment.status == TaskStatus::Failed {
            perf.tasks_failed += 1;
        }
        if let Some(result) = &assignment.result {
            perf.total_cost += result.cost;
            perf.total_tokens += result.tokens_used;
        }
    }

    let mut quality: HashMap<&str, (f64, usize)> = HashMap::new();
    for review in registry.reviews() {
        if let Some(assignment) = registry.get(&review.task_id) {
            let entry = quality.entry(assignment.agent_type.as_str()).or_default();
            entry.0 += f64::from(review.quality_score);
            entry.1 += 1;
        }
    }
    for (agent_type, (sum, count)) in quality {
        if let Some(perf) = agent_performance.get_mut(agent_type) {
            perf.average_quality = mean(sum, count);
        }
    }

    OrchestrationMetrics {
        total_tasks: registry.len(),
        completed_tasks,
        average_completion_time: mean(completion_sum, completion_count),
        average_review_cycles: mean(revision_sum, registry.len()),
        quality_trends: registry.reviews().iter().map(|r| r.quality_score).collect(),
        agent_performance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::Assignment;
    use crate::review::{HeuristicReviewer, QualityReviewer};
    use arch_abstraction::{AgentResult, Task, TaskType};
    use chrono::Duration;

    fn assignment(agent_type: &str) -> Assignment {
        Assignment::new(format!("{agent_type}-1"), agent_type, Task::new(TaskType::Testing, "t"))
    }

    #[test]
    fn test_empty_registry_is_all_zero() {
        let metrics = aggregate(&AssignmentRegistry::new());
        assert_eq!(metrics.total_tasks, 0);
        assert_eq!(metrics.completed_tasks, 0);
        assert!(metrics.average_completion_time.abs() < f64::EPSILON);
        assert!(metrics.average_review_cycles.abs() < f64::EPSILON);
        assert!(metrics.quality_trends.is_empty());
        assert!(metrics.agent_performance.is_empty());
    }

    #[test]
    fn test_in_flight_only_has_zero_completion_time() {
        let mut registry = AssignmentRegistry::new();
        let mut a = assignment("backend");
        a.transition(TaskStatus::InProgress).unwrap();
        registry.insert(a);
        registry.insert(assignment("backend"));

        let metrics = aggregate(&registry);
        assert_eq!(metrics.total_tasks, 2);
        assert_eq!(metrics.completed_tasks, 0);
        assert!(metrics.average_completion_time.abs() < f64::EPSILON);
    }

    #[test]
    fn test_completion_time_and_review_cycles() {
        let mut registry = AssignmentRegistry::new();

        let mut done = assignment("backend");
        done.status = TaskStatus::Approved;
        done.completed_at = Some(done.assigned_at + Duration::hours(2));
        done.revision_count = 2;
        registry.insert(done);

        let mut other = assignment("backend");
        other.status = TaskStatus::Completed;
        other.completed_at = Some(other.assigned_at + Duration::hours(4));
        registry.insert(other);

        let mut in_flight = assignment("qa");
        in_flight.revision_count = 1;
        registry.insert(in_flight);

        let metrics = aggregate(&registry);
        assert_eq!(metrics.completed_tasks, 2);
        assert!((metrics.average_completion_time - 3.0).abs() < 1e-9);
        assert!((metrics.average_review_cycles - 1.0).abs() < 1e-9);
        assert_eq!(metrics.agent_performance["backend"].tasks_approved, 2);
        assert_eq!(metrics.agent_performance["qa"].tasks_assigned, 1);
    }

    #[test]
    fn test_quality_trend_follows_review_order() {
        let mut registry = AssignmentRegistry::new();
        let mut a = assignment("backend");
        a.result = Some(AgentResult::success("x").with_usage(120, 0.25));
        let id = a.id.clone();
        let task = a.task.clone();
        registry.insert(a);

        let reviewer = HeuristicReviewer::default();
        let low = reviewer.review(&id, &task, &AgentResult::success("password"));
        let high = reviewer.review(
            &id,
            &task,
            &AgentResult::success("def f():\n  try: pass\n  except: raise\ndef test_f(): pass\n".repeat(10)),
        );
        let scores = vec![low.quality_score, high.quality_score];
        registry.record_review(low);
        registry.record_review(high);

        let metrics = aggregate(&registry);
        assert_eq!(metrics.quality_trends, scores);
        let perf = &metrics.agent_performance["backend"];
        assert!((perf.average_quality - f64::from(scores[0] + scores[1]) / 2.0).abs() < 1e-9);
        assert_eq!(perf.total_tokens, 120);
        assert!((perf.total_cost - 0.25).abs() < f64::EPSILON);
    }
}
