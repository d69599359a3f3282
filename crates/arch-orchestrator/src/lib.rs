//! Task orchestration and review engine for ARCH.
//!
//! The [`Orchestrator`] assigns tasks to workers registered in its [`AgentPool`],
//! runs them, reviews the output against a quality gate and cycles failing work
//! through a bounded number of revisions.
//!
//! ```text
//! ASSIGNED -> IN_PROGRESS -> SUBMITTED -> UNDER_REVIEW -> APPROVED -> COMPLETED
//!                 |                                   -> NEEDS_REVISION -> (new ASSIGNED)
//!                 |                                                     -> FAILED
//!                 +-> FAILED
//! ```

pub mod agents;
pub mod assignment;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod metrics;
pub mod pool;
pub mod registry;
pub mod review;

use arch_abstraction::{Agent, AgentError, AgentResult, Priority, Task, TaskType};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub use agents::{ModelAgent, ScriptedAgent};
pub use assignment::{Assignment, StatusSnapshot, TaskId, estimate_hours};
pub use config::{ConfigError, OrchestratorConfig, ReviewConfig};
pub use error::{OrchestrationError, Result};
pub use lifecycle::TaskStatus;
pub use metrics::{AgentPerformance, OrchestrationMetrics};
pub use pool::{AgentMetadata, AgentPool};
pub use registry::AssignmentRegistry;
pub use review::{HeuristicReviewer, QualityReviewer, Review, ReviewOutcome};

fn invalid_state(task_id: &TaskId, status: TaskStatus, operation: &'static str) -> OrchestrationError {
    OrchestrationError::InvalidState { task_id: task_id.clone(), status, operation }
}

fn orchestrator_id() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("arch-cto-{}", &uuid[..8])
}

fn preview(text: &str) -> String {
    text.chars().take(100).collect()
}

/// Checks that a revision may be requested for `assignment`.
fn ensure_revisable(assignment: &Assignment) -> Result<()> {
    if assignment.status != TaskStatus::NeedsRevision {
        return Err(invalid_state(&assignment.id, assignment.status, "request revision"));
    }
    if let Some(successor) = &assignment.superseded_by {
        return Err(OrchestrationError::AlreadyRevised {
            task_id: assignment.id.clone(),
            successor: successor.clone(),
        });
    }
    Ok(())
}

/// Moves an abandoned `InProgress` assignment to `Failed`.
fn fail_abandoned(registry: &mut AssignmentRegistry, task_id: &TaskId) {
    let Ok(assignment) = registry.require_mut(task_id) else {
        return;
    };
    if assignment.status != TaskStatus::InProgress {
        return;
    }
    match assignment.transition(TaskStatus::Failed) {
        Ok(_) => warn!(task_id = %task_id, "Execution dropped before completion, task failed"),
        Err(status) => error!(task_id = %task_id, status = %status, "Could not fail abandoned task"),
    }
}

/// Fails the assignment if the executing future is dropped before it records a result.
struct InProgressGuard {
    registry: Arc<RwLock<AssignmentRegistry>>,
    task_id: TaskId,
    armed: bool,
}

impl InProgressGuard {
    fn new(registry: Arc<RwLock<AssignmentRegistry>>, task_id: TaskId) -> Self {
        Self { registry, task_id, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for InProgressGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        if let Ok(mut registry) = self.registry.try_write() {
            fail_abandoned(&mut registry, &self.task_id);
            return;
        }

        let registry = Arc::clone(&self.registry);
        let task_id = self.task_id.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    fail_abandoned(&mut *registry.write().await, &task_id);
                });
            }
            Err(_) => {
                error!(task_id = %task_id, "No runtime to fail abandoned task");
            }
        }
    }
}

/// Drives tasks through assignment, execution, review and revision.
pub struct Orchestrator {
    /// Identifier used in logs.
    id: String,
    config: OrchestratorConfig,
    /// Registered workers.
    pool: Arc<AgentPool>,
    /// Assignments and reviews; every mutation goes through this lock.
    registry: Arc<RwLock<AssignmentRegistry>>,
    reviewer: Arc<dyn QualityReviewer>,
    shut_down: AtomicBool,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("pool", &self.pool)
            .field("task_count", &self.registry.try_read().map(|r| r.len()).unwrap_or(0))
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Creates an orchestrator with the heuristic reviewer.
    ///
    /// # Errors
    /// Returns `Config` if the configuration fails validation.
    pub fn new(config: OrchestratorConfig) -> Result<Self> {
        config.validate()?;
        let reviewer = Arc::new(HeuristicReviewer::from_config(&config));
        let id = orchestrator_id();

        info!(orchestrator_id = %id, max_revision_cycles = config.max_revision_cycles, quality_threshold = config.quality_threshold, "Orchestrator created");

        Ok(Self {
            id,
            config,
            pool: Arc::new(AgentPool::new()),
            registry: Arc::new(RwLock::new(AssignmentRegistry::new())),
            reviewer,
            shut_down: AtomicBool::new(false),
        })
    }

    /// Replaces the quality reviewer.
    #[must_use]
    pub fn with_reviewer(mut self, reviewer: Arc<dyn QualityReviewer>) -> Self {
        self.reviewer = reviewer;
        self
    }

    /// Returns the orchestrator's log identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Registers a worker under `agent_type`.
    ///
    /// # Returns
    /// Returns `true` if the type was newly registered, `false` if it replaced a worker.
    pub async fn register_agent(&self, agent_type: &str, agent: Arc<dyn Agent>) -> bool {
        self.pool.register_agent(agent_type, agent).await
    }

    /// Removes the worker registered under `agent_type`.
    pub async fn unregister_agent(&self, agent_type: &str) -> bool {
        self.pool.unregister_agent(agent_type).await
    }

    /// Registered agent type names, sorted.
    pub async fn agent_types(&self) -> Vec<String> {
        self.pool.agent_types().await
    }

    /// Metadata of every registered worker.
    pub async fn list_agents(&self) -> Vec<AgentMetadata> {
        self.pool.list_agents().await
    }

    /// Assigns a new task to the worker registered under `agent_type`.
    ///
    /// # Errors
    /// Returns `UnknownAgentType` if no such worker exists, `InvalidComplexity` if
    /// `complexity` is outside 1..=10, or `ShutDown` after [`Self::shutdown`].
    pub async fn assign(
        &self,
        description: &str,
        task_type: TaskType,
        agent_type: &str,
        complexity: u8,
        priority: Priority,
        metadata: BTreeMap<String, serde_json::Value>,
    ) -> Result<TaskId> {
        let task = Task::new(task_type, description)
            .with_complexity(complexity)
            .with_priority(priority)
            .with_metadata(metadata);
        self.assign_task(agent_type, task).await
    }

    /// Assigns a prepared task to the worker registered under `agent_type`.
    pub async fn assign_task(&self, agent_type: &str, task: Task) -> Result<TaskId> {
        let assignment = self.new_assignment(agent_type, task).await?;
        let task_id = assignment.id.clone();

        info!(
            task_id = %task_id,
            agent_type = %agent_type,
            complexity = assignment.task.complexity,
            priority = ?assignment.task.priority,
            estimated_hours = assignment.estimated_hours,
            task = %preview(&assignment.task.description),
            "Task assigned"
        );

        self.registry.write().await.insert(assignment);
        Ok(task_id)
    }

    /// Validates a task and binds it to a worker without storing it.
    async fn new_assignment(&self, agent_type: &str, task: Task) -> Result<Assignment> {
        if self.shut_down.load(Ordering::SeqCst) {
            return Err(OrchestrationError::ShutDown);
        }

        if !(1..=10).contains(&task.complexity) {
            return Err(OrchestrationError::InvalidComplexity(task.complexity));
        }

        let Some(agent) = self.pool.get_agent(agent_type).await else {
            return Err(OrchestrationError::UnknownAgentType {
                agent_type: agent_type.to_string(),
                available: self.pool.agent_types().await,
            });
        };

        Ok(Assignment::new(agent.id(), agent_type, task))
    }

    /// Executes an assigned task and records the agent's result.
    ///
    /// # Errors
    /// Returns `NotFound` for unknown ids, `InvalidState` unless the assignment is
    /// `Assigned`, and an execution failure (after marking the assignment `Failed`)
    /// if the agent errors, reports `success = false` or times out.
    pub async fn execute(&self, task_id: &TaskId) -> Result<AgentResult> {
        self.execute_with_cancellation(task_id, CancellationToken::new()).await
    }

    /// Like [`Self::execute`], but gives up with `Cancelled` when `token` fires.
    pub async fn execute_with_cancellation(
        &self,
        task_id: &TaskId,
        token: CancellationToken,
    ) -> Result<AgentResult> {
        let (task, agent_type) = {
            let mut registry = self.registry.write().await;
            let assignment = registry.require_mut(task_id)?;
            if assignment.status != TaskStatus::Assigned {
                return Err(invalid_state(task_id, assignment.status, "execute"));
            }
            assignment
                .transition(TaskStatus::InProgress)
                .map_err(|status| invalid_state(task_id, status, "execute"))?;
            (assignment.task.clone(), assignment.agent_type.clone())
        };
        let mut guard = InProgressGuard::new(Arc::clone(&self.registry), task_id.clone());

        let outcome = match self.pool.get_agent(&agent_type).await {
            Some(agent) => {
                info!(task_id = %task_id, agent_type = %agent_type, "Executing task");
                self.run_agent(task_id, agent.as_ref(), &task, &token).await
            }
            None => Err(OrchestrationError::UnknownAgentType {
                agent_type: agent_type.clone(),
                available: self.pool.agent_types().await,
            }),
        };

        let mut registry = self.registry.write().await;
        guard.disarm();
        let assignment = registry.require_mut(task_id)?;
        match outcome {
            Ok(result) if result.success => {
                assignment.result = Some(result.clone());
                assignment
                    .transition(TaskStatus::Submitted)
                    .map_err(|status| invalid_state(task_id, status, "submit"))?;
                info!(
                    task_id = %task_id,
                    agent_type = %agent_type,
                    cost = result.cost,
                    tokens = result.tokens_used,
                    "Task submitted"
                );
                Ok(result)
            }
            Ok(result) => {
                let reason =
                    result.error.clone().unwrap_or_else(|| "agent reported failure".to_string());
                assignment.result = Some(result);
                assignment
                    .transition(TaskStatus::Failed)
                    .map_err(|status| invalid_state(task_id, status, "fail"))?;
                error!(task_id = %task_id, agent_type = %agent_type, reason = %reason, "Task failed");
                Err(OrchestrationError::ExecutionFailed { task_id: task_id.clone(), reason })
            }
            Err(err) => {
                assignment
                    .transition(TaskStatus::Failed)
                    .map_err(|status| invalid_state(task_id, status, "fail"))?;
                error!(task_id = %task_id, agent_type = %agent_type, error = %err, "Task failed");
                Err(err)
            }
        }
    }

    /// Runs the agent outside the registry lock, bounded by timeout and cancellation.
    async fn run_agent(
        &self,
        task_id: &TaskId,
        agent: &dyn Agent,
        task: &Task,
        token: &CancellationToken,
    ) -> Result<AgentResult> {
        let processing = async {
            let processed = match self.config.execution_timeout() {
                Some(limit) => match tokio::time::timeout(limit, agent.process(task)).await {
                    Ok(processed) => processed,
                    Err(_) => {
                        return Err(OrchestrationError::Timeout {
                            task_id: task_id.clone(),
                            after: limit,
                        });
                    }
                },
                None => agent.process(task).await,
            };
            processed.map_err(|source| OrchestrationError::Agent { task_id: task_id.clone(), source })
        };

        tokio::select! {
            outcome = processing => outcome,
            () = token.cancelled() => {
                info!(task_id = %task_id, "Task execution cancelled");
                Err(OrchestrationError::Cancelled(task_id.clone()))
            }
        }
    }

    /// Reviews a submitted task.
    ///
    /// # Errors
    /// Returns `NotFound` for unknown ids and `InvalidState` unless the assignment is
    /// `Submitted` (reviewing twice without re-execution is a caller error).
    pub async fn review(&self, task_id: &TaskId) -> Result<Review> {
        let mut registry = self.registry.write().await;
        let assignment = registry.require_mut(task_id)?;

        if assignment.status != TaskStatus::Submitted {
            return Err(invalid_state(task_id, assignment.status, "review"));
        }
        let Some(result) = assignment.result.clone() else {
            return Err(invalid_state(task_id, assignment.status, "review"));
        };

        assignment
            .transition(TaskStatus::UnderReview)
            .map_err(|status| invalid_state(task_id, status, "review"))?;

        debug!(task_id = %task_id, "Reviewing task");
        let review = self.reviewer.review(task_id, &assignment.task, &result);

        assignment.review_notes.push(review.summary.clone());
        assignment.review_outcome = Some(review.outcome);

        let next =
            if review.requires_revision { TaskStatus::NeedsRevision } else { TaskStatus::Approved };
        assignment.transition(next).map_err(|status| invalid_state(task_id, status, "review"))?;

        if review.requires_revision {
            info!(
                task_id = %task_id,
                quality_score = review.quality_score,
                security_issues = review.security_issues.len(),
                revision_count = assignment.revision_count,
                "Task needs revision"
            );
        } else {
            info!(task_id = %task_id, quality_score = review.quality_score, "Task approved");
        }

        registry.record_review(review.clone());
        Ok(review)
    }

    /// Requests another attempt at a task that failed review.
    ///
    /// Creates a new assignment whose description carries `revision_notes` and whose
    /// `revision_count` is one higher. Once the chain has used up
    /// `max_revision_cycles`, the assignment is marked `Failed` instead and the same
    /// id is returned.
    ///
    /// # Errors
    /// Returns `NotFound` for unknown ids, `InvalidState` unless the assignment is
    /// `NeedsRevision`, `AlreadyRevised` if a successor already exists, and
    /// `UnknownAgentType` if the worker has since been unregistered.
    pub async fn request_revision(&self, task_id: &TaskId, revision_notes: &str) -> Result<TaskId> {
        let (agent_type, revised, revision_count) = {
            let mut registry = self.registry.write().await;
            let assignment = registry.require_mut(task_id)?;
            ensure_revisable(assignment)?;

            if assignment.revision_count >= self.config.max_revision_cycles {
                warn!(
                    task_id = %task_id,
                    max_revision_cycles = self.config.max_revision_cycles,
                    "Task exceeded max revision cycles"
                );
                assignment
                    .transition(TaskStatus::Failed)
                    .map_err(|status| invalid_state(task_id, status, "request revision"))?;
                return Ok(task_id.clone());
            }

            let revised = Task {
                description: format!(
                    "{}\n\nREVISION NOTES:\n{}",
                    assignment.task.description, revision_notes
                ),
                ..assignment.task.clone()
            };
            (assignment.agent_type.clone(), revised, assignment.revision_count + 1)
        };

        let mut successor = self.new_assignment(&agent_type, revised).await?;
        successor.revision_count = revision_count;
        successor.revision_of = Some(task_id.clone());
        let successor_id = successor.id.clone();

        let mut registry = self.registry.write().await;
        let assignment = registry.require_mut(task_id)?;
        ensure_revisable(assignment)?;
        assignment.superseded_by = Some(successor_id.clone());
        registry.insert(successor);

        info!(
            task_id = %task_id,
            revision_task_id = %successor_id,
            revision_count,
            "Revision requested"
        );

        Ok(successor_id)
    }

    /// Marks approved work as shipped.
    ///
    /// # Errors
    /// Returns `NotFound` for unknown ids and `InvalidState` unless the assignment is
    /// `Approved`.
    pub async fn complete(&self, task_id: &TaskId) -> Result<StatusSnapshot> {
        let mut registry = self.registry.write().await;
        let assignment = registry.require_mut(task_id)?;
        assignment
            .transition(TaskStatus::Completed)
            .map_err(|status| invalid_state(task_id, status, "complete"))?;
        info!(task_id = %task_id, "Task completed");
        Ok(assignment.snapshot())
    }

    /// Returns a read-only view of one assignment.
    ///
    /// # Errors
    /// Returns `NotFound` for unknown ids.
    pub async fn status(&self, task_id: &TaskId) -> Result<StatusSnapshot> {
        let registry = self.registry.read().await;
        Ok(registry.require(task_id)?.snapshot())
    }

    /// Returns every review produced for one assignment, oldest first.
    pub async fn reviews(&self, task_id: &TaskId) -> Result<Vec<Review>> {
        let registry = self.registry.read().await;
        registry.require(task_id)?;
        Ok(registry.reviews_for(task_id).cloned().collect())
    }

    /// Returns the ids of every attempt leading to `task_id`, root first.
    pub async fn revision_chain(&self, task_id: &TaskId) -> Result<Vec<TaskId>> {
        self.registry.read().await.chain(task_id)
    }

    /// Returns snapshots of every assignment in creation order.
    pub async fn list_tasks(&self) -> Vec<StatusSnapshot> {
        self.registry.read().await.iter().map(Assignment::snapshot).collect()
    }

    /// Recomputes metrics over every assignment.
    pub async fn metrics(&self) -> OrchestrationMetrics {
        metrics::aggregate(&*self.registry.read().await)
    }

    /// Returns `true` once [`Self::shutdown`] has been called.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// Stops accepting new tasks and shuts down every worker.
    ///
    /// Assignments stay readable after shutdown.
    ///
    /// # Returns
    /// Returns the agent types whose shutdown failed, with the error.
    pub async fn shutdown(&self) -> Vec<(String, AgentError)> {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            debug!(orchestrator_id = %self.id, "Orchestrator already shut down");
            return Vec::new();
        }

        info!(orchestrator_id = %self.id, "Shutting down orchestrator");
        let failures = self.pool.shutdown_all().await;
        info!(orchestrator_id = %self.id, failures = failures.len(), "Orchestrator shutdown complete");
        failures
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        let config = OrchestratorConfig::default();
        Self {
            id: orchestrator_id(),
            reviewer: Arc::new(HeuristicReviewer::from_config(&config)),
            config,
            pool: Arc::new(AgentPool::new()),
            registry: Arc::new(RwLock::new(AssignmentRegistry::new())),
            shut_down: AtomicBool::new(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD_OUTPUT: &str = r#"
@router.get("/health", response_model=HealthResponse)
def health() -> HealthResponse:
    try:
        return HealthResponse(status="ok")
    except Exception as exc:
        raise HTTPException(status_code=500) from exc

def test_health(client):
    assert client.get("/health").status_code == 200
"#;

    async fn orchestrator_with(outputs: &[&str]) -> Orchestrator {
        let orchestrator = Orchestrator::default();
        let agent = ScriptedAgent::new("backend-1", outputs.iter().map(ToString::to_string).collect());
        orchestrator.register_agent("backend", Arc::new(agent)).await;
        orchestrator
    }

    async fn assign(orchestrator: &Orchestrator) -> TaskId {
        orchestrator
            .assign("health endpoint", TaskType::CodeGeneration, "backend", 5, Priority::Medium, BTreeMap::new())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_new_rejects_invalid_config() {
        let config = OrchestratorConfig { quality_threshold: 0, ..OrchestratorConfig::default() };
        assert!(matches!(Orchestrator::new(config), Err(OrchestrationError::Config(_))));
    }

    #[tokio::test]
    async fn test_assign_creates_assigned_task() {
        let orchestrator = orchestrator_with(&[GOOD_OUTPUT]).await;
        let task_id = assign(&orchestrator).await;

        let status = orchestrator.status(&task_id).await.unwrap();
        assert_eq!(status.status, TaskStatus::Assigned);
        assert_eq!(status.revision_count, 0);
        assert_eq!(status.agent_id, "backend-1");
        assert!((status.estimated_hours - 2.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_assign_unknown_agent_type() {
        let orchestrator = orchestrator_with(&[GOOD_OUTPUT]).await;
        let err = orchestrator
            .assign("x", TaskType::Testing, "frontend", 5, Priority::Low, BTreeMap::new())
            .await
            .unwrap_err();
        match err {
            OrchestrationError::UnknownAgentType { agent_type, available } => {
                assert_eq!(agent_type, "frontend");
                assert_eq!(available, vec!["backend".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(orchestrator.list_tasks().await.is_empty());
    }

    #[tokio::test]
    async fn test_assign_rejects_complexity_out_of_range() {
        let orchestrator = orchestrator_with(&[GOOD_OUTPUT]).await;
        for complexity in [0, 11] {
            let err = orchestrator
                .assign("x", TaskType::Testing, "backend", complexity, Priority::Low, BTreeMap::new())
                .await
                .unwrap_err();
            assert!(matches!(err, OrchestrationError::InvalidComplexity(c) if c == complexity));
        }
    }

    #[tokio::test]
    async fn test_execute_then_review_approves() {
        let orchestrator = orchestrator_with(&[GOOD_OUTPUT]).await;
        let task_id = assign(&orchestrator).await;

        let result = orchestrator.execute(&task_id).await.unwrap();
        assert!(result.success);
        let status = orchestrator.status(&task_id).await.unwrap();
        assert_eq!(status.status, TaskStatus::Submitted);
        assert!(status.started_at.is_some());
        assert!(status.submitted_at.is_some());
        assert!(status.actual_hours.is_some());

        let review = orchestrator.review(&task_id).await.unwrap();
        assert_eq!(review.outcome, ReviewOutcome::Approved);

        let status = orchestrator.status(&task_id).await.unwrap();
        assert_eq!(status.status, TaskStatus::Approved);
        assert!(status.completed_at.is_some());
        assert_eq!(status.review_notes, vec![review.summary]);
        assert_eq!(status.review_outcome, Some(ReviewOutcome::Approved));
    }

    #[tokio::test]
    async fn test_execute_twice_is_rejected() {
        let orchestrator = orchestrator_with(&[GOOD_OUTPUT]).await;
        let task_id = assign(&orchestrator).await;
        orchestrator.execute(&task_id).await.unwrap();

        let err = orchestrator.execute(&task_id).await.unwrap_err();
        assert!(matches!(
            err,
            OrchestrationError::InvalidState { status: TaskStatus::Submitted, operation: "execute", .. }
        ));
    }

    #[tokio::test]
    async fn test_review_before_execute_is_rejected() {
        let orchestrator = orchestrator_with(&[GOOD_OUTPUT]).await;
        let task_id = assign(&orchestrator).await;
        let err = orchestrator.review(&task_id).await.unwrap_err();
        assert!(matches!(err, OrchestrationError::InvalidState { status: TaskStatus::Assigned, .. }));
    }

    #[tokio::test]
    async fn test_review_twice_is_rejected() {
        let orchestrator = orchestrator_with(&[GOOD_OUTPUT]).await;
        let task_id = assign(&orchestrator).await;
        orchestrator.execute(&task_id).await.unwrap();
        orchestrator.review(&task_id).await.unwrap();

        let err = orchestrator.review(&task_id).await.unwrap_err();
        assert!(matches!(err, OrchestrationError::InvalidState { status: TaskStatus::Approved, .. }));
        assert_eq!(orchestrator.reviews(&task_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_agent_failure_result_marks_failed() {
        let orchestrator = Orchestrator::default();
        orchestrator.register_agent("backend", Arc::new(ScriptedAgent::new("b", Vec::new()))).await;
        let task_id = assign(&orchestrator).await;

        let err = orchestrator.execute(&task_id).await.unwrap_err();
        assert!(err.is_execution_failure());
        assert!(matches!(err, OrchestrationError::ExecutionFailed { ref reason, .. } if reason == "no scripted output"));

        let status = orchestrator.status(&task_id).await.unwrap();
        assert_eq!(status.status, TaskStatus::Failed);
        assert!(status.result.is_some());
    }

    #[tokio::test]
    async fn test_unregistered_agent_fails_execution() {
        let orchestrator = orchestrator_with(&[GOOD_OUTPUT]).await;
        let task_id = assign(&orchestrator).await;
        orchestrator.unregister_agent("backend").await;

        let err = orchestrator.execute(&task_id).await.unwrap_err();
        assert!(matches!(err, OrchestrationError::UnknownAgentType { .. }));
        assert_eq!(orchestrator.status(&task_id).await.unwrap().status, TaskStatus::Failed);
    }

    #[tokio::test]
    async fn test_complete_requires_approval() {
        let orchestrator = orchestrator_with(&[GOOD_OUTPUT]).await;
        let task_id = assign(&orchestrator).await;
        assert!(orchestrator.complete(&task_id).await.is_err());

        orchestrator.execute(&task_id).await.unwrap();
        orchestrator.review(&task_id).await.unwrap();
        let snapshot = orchestrator.complete(&task_id).await.unwrap();
        assert_eq!(snapshot.status, TaskStatus::Completed);
        assert_eq!(orchestrator.metrics().await.completed_tasks, 1);
    }

    #[tokio::test]
    async fn test_shutdown_rejects_new_tasks() {
        let orchestrator = orchestrator_with(&[GOOD_OUTPUT]).await;
        let task_id = assign(&orchestrator).await;

        assert!(orchestrator.shutdown().await.is_empty());
        assert!(orchestrator.is_shut_down());
        assert!(orchestrator.shutdown().await.is_empty());

        let err = orchestrator
            .assign("x", TaskType::Testing, "backend", 5, Priority::Low, BTreeMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestrationError::ShutDown));
        assert!(orchestrator.status(&task_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_custom_reviewer() {
        struct AlwaysReject;

        impl QualityReviewer for AlwaysReject {
            fn review(&self, task_id: &TaskId, _task: &Task, _result: &AgentResult) -> Review {
                Review {
                    task_id: task_id.clone(),
                    reviewer: "strict".to_string(),
                    outcome: ReviewOutcome::Rejected,
                    quality_score: 1,
                    detailed_feedback: Vec::new(),
                    security_issues: Vec::new(),
                    requires_revision: true,
                    summary: "rejected".to_string(),
                    approval_notes: String::new(),
                    reviewed_at: chrono::Utc::now(),
                }
            }
        }

        let orchestrator = orchestrator_with(&[GOOD_OUTPUT]).await.with_reviewer(Arc::new(AlwaysReject));
        let task_id = assign(&orchestrator).await;
        orchestrator.execute(&task_id).await.unwrap();
        let review = orchestrator.review(&task_id).await.unwrap();
        assert_eq!(review.reviewer, "strict");
        assert_eq!(orchestrator.status(&task_id).await.unwrap().status, TaskStatus::NeedsRevision);
    }
}
