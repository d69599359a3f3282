//! Quality review of submitted work.
//!
//! The reviewer is a pure function from a submitted result to a [`Review`]. The
//! shipped [`HeuristicReviewer`] is a keyword scan; other reviewers plug in through
//! [`QualityReviewer`].

use crate::assignment::TaskId;
use crate::config::OrchestratorConfig;
use arch_abstraction::{AgentResult, Task, TaskType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Verdict of a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewOutcome {
    /// Ready to ship.
    Approved,
    /// Small fixes needed.
    NeedsMinorChanges,
    /// Substantial rework needed.
    NeedsMajorChanges,
    /// Unusable.
    Rejected,
}

impl fmt::Display for ReviewOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Approved => "Approved",
            Self::NeedsMinorChanges => "Needs Minor Changes",
            Self::NeedsMajorChanges => "Needs Major Changes",
            Self::Rejected => "Rejected",
        })
    }
}

/// Result of reviewing one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Reviewed assignment.
    pub task_id: TaskId,
    /// Who reviewed it.
    pub reviewer: String,
    /// Verdict.
    pub outcome: ReviewOutcome,
    /// Score in `[1, 10]`.
    pub quality_score: u8,
    /// Non-security findings.
    pub detailed_feedback: Vec<String>,
    /// Security findings.
    pub security_issues: Vec<String>,
    /// Whether the work must go through another revision cycle.
    pub requires_revision: bool,
    /// One-line human-readable summary.
    pub summary: String,
    /// Sign-off text, empty when a revision is required.
    pub approval_notes: String,
    /// When the review was produced.
    pub reviewed_at: DateTime<Utc>,
}

/// A pluggable scoring function.
pub trait QualityReviewer: Send + Sync {
    /// Reviews `result`, produced for `task` under assignment `task_id`.
    fn review(&self, task_id: &TaskId, task: &Task, result: &AgentResult) -> Review;
}

const DEFINITION_MARKERS: &[&str] =
    &["def ", "class ", "fn ", "function ", "struct ", "enum ", "trait ", "interface ", "func "];
const ERROR_HANDLING_MARKERS: &[&str] =
    &["try:", "try {", "except", "catch", "result<", "?;", "raise", "throw", "err("];
const ROUTING_MARKERS: &[&str] =
    &["@router", "@app", "route", "#[get", "#[post", "app.get", "app.post"];
const SECRET_MARKERS: &[&str] = &["api_key", "apikey", "secret"];

const APPROVAL_NOTES: &str = "Code meets quality standards and is approved for production use.";

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

/// Task types whose output is expected to expose an HTTP interface.
const fn is_http_facing(task_type: TaskType) -> bool {
    matches!(task_type, TaskType::CodeGeneration | TaskType::ApiDevelopment)
}

/// Keyword-based reviewer.
#[derive(Debug, Clone)]
pub struct HeuristicReviewer {
    quality_threshold: u8,
    min_output_chars_per_complexity: usize,
    reviewer: String,
}

impl HeuristicReviewer {
    /// Creates a reviewer with the given threshold and default length rule.
    #[must_use]
    pub fn new(quality_threshold: u8) -> Self {
        let defaults = OrchestratorConfig::default();
        Self {
            quality_threshold,
            min_output_chars_per_complexity: defaults.review.min_output_chars_per_complexity,
            reviewer: defaults.review.reviewer,
        }
    }

    /// Creates a reviewer from orchestrator configuration.
    #[must_use]
    pub fn from_config(config: &OrchestratorConfig) -> Self {
        Self {
            quality_threshold: config.quality_threshold,
            min_output_chars_per_complexity: config.review.min_output_chars_per_complexity,
            reviewer: config.review.reviewer.clone(),
        }
    }

    /// Minimum output length for a task of the given complexity.
    #[must_use]
    pub fn min_output_len(&self, complexity: u8) -> usize {
        self.min_output_chars_per_complexity * usize::from(complexity)
    }

    fn rejected_empty(&self, task_id: &TaskId) -> Review {
        Review {
            task_id: task_id.clone(),
            reviewer: self.reviewer.clone(),
            outcome: ReviewOutcome::Rejected,
            quality_score: 1,
            detailed_feedback: vec!["No output provided".to_string()],
            security_issues: Vec::new(),
            requires_revision: true,
            summary: "No output provided".to_string(),
            approval_notes: String::new(),
            reviewed_at: Utc::now(),
        }
    }
}

impl Default for HeuristicReviewer {
    fn default() -> Self {
        Self::from_config(&OrchestratorConfig::default())
    }
}

impl QualityReviewer for HeuristicReviewer {
    fn review(&self, task_id: &TaskId, task: &Task, result: &AgentResult) -> Review {
        let raw = match result.output.as_deref() {
            Some(output) if !output.trim().is_empty() => output,
            _ => return self.rejected_empty(task_id),
        };
        let output = raw.to_lowercase();

        let mut feedback = Vec::new();
        let mut security_issues = Vec::new();
        let mut score: i32 = 10;

        if !contains_any(&output, DEFINITION_MARKERS) {
            feedback.push(
                "No function or type definitions found - possibly incomplete implementation"
                    .to_string(),
            );
            score -= 2;
        }

        if !contains_any(&output, ERROR_HANDLING_MARKERS) {
            feedback.push("Missing error handling".to_string());
            score -= 1;
        }

        if !output.contains("test") {
            feedback.push("No tests provided".to_string());
            score -= 2;
        }

        if raw.len() < self.min_output_len(task.complexity) {
            feedback.push("Output seems too brief for the task complexity".to_string());
            score -= 1;
        }

        if is_http_facing(task.task_type) {
            if !contains_any(&output, ROUTING_MARKERS) {
                feedback.push("Missing router or route declarations".to_string());
                score -= 2;
            }
            if !output.contains("response") {
                feedback.push("Missing response model specification".to_string());
                score -= 1;
            }
        }

        if output.contains("password") && !output.contains("hash") {
            security_issues.push("Password handling without proper hashing".to_string());
            score -= 3;
        }

        if contains_any(&output, SECRET_MARKERS) {
            security_issues.push("Potential hardcoded secrets".to_string());
            score -= 2;
        }

        let quality_score = score.clamp(1, 10) as u8;
        let has_security_issues = !security_issues.is_empty();
        let requires_revision = quality_score < self.quality_threshold || has_security_issues;

        let mut outcome = match quality_score {
            9.. if !has_security_issues => ReviewOutcome::Approved,
            7.. if !has_security_issues => ReviewOutcome::NeedsMinorChanges,
            5.. => ReviewOutcome::NeedsMajorChanges,
            _ => ReviewOutcome::Rejected,
        };
        // A threshold above 9 can demand revision of otherwise approvable work
        if requires_revision && outcome == ReviewOutcome::Approved {
            outcome = ReviewOutcome::NeedsMinorChanges;
        }

        let summary = summarize(quality_score, &feedback, &security_issues, outcome);

        Review {
            task_id: task_id.clone(),
            reviewer: self.reviewer.clone(),
            outcome,
            quality_score,
            detailed_feedback: feedback,
            security_issues,
            requires_revision,
            summary,
            approval_notes: if requires_revision { String::new() } else { APPROVAL_NOTES.to_string() },
            reviewed_at: Utc::now(),
        }
    }
}

fn summarize(
    quality_score: u8,
    feedback: &[String],
    security_issues: &[String],
    outcome: ReviewOutcome,
) -> String {
    let mut parts = vec![format!("Quality score: {quality_score}/10")];
    if !security_issues.is_empty() {
        parts.push(format!("{} security issue(s) found", security_issues.len()));
    }
    if !feedback.is_empty() {
        parts.push(format!("{} improvement(s) suggested", feedback.len()));
    }
    parts.push(format!("Decision: {outcome}"));
    parts.join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOLID_HANDLER: &str = r#"
from fastapi import APIRouter, HTTPException

router = APIRouter()

@router.post("/items", response_model=ItemResponse)
async def create_item(item: ItemCreate) -> ItemResponse:
    try:
        return await repository.insert(item)
    except DuplicateError as exc:
        raise HTTPException(status_code=409, detail=str(exc))

def test_create_item(client):
    response = client.post("/items", json={"name": "widget"})
    assert response.status_code == 200
"#;

    fn task(task_type: TaskType, complexity: u8) -> Task {
        Task::new(task_type, "implement endpoint").with_complexity(complexity)
    }

    fn review(task: &Task, output: &str) -> Review {
        HeuristicReviewer::default().review(&TaskId::from("t-1"), task, &AgentResult::success(output))
    }

    #[test]
    fn test_complete_output_is_approved() {
        let review = review(&task(TaskType::CodeGeneration, 5), SOLID_HANDLER);
        assert_eq!(review.quality_score, 10);
        assert_eq!(review.outcome, ReviewOutcome::Approved);
        assert!(!review.requires_revision);
        assert!(review.detailed_feedback.is_empty());
        assert_eq!(review.approval_notes, APPROVAL_NOTES);
        assert_eq!(review.summary, "Quality score: 10/10 | Decision: Approved");
    }

    #[test]
    fn test_missing_definitions_costs_two() {
        let output = "try: run() except: pass\ntest it\n".repeat(20);
        let review = review(&task(TaskType::Documentation, 5), &output);
        assert_eq!(review.quality_score, 8);
        assert_eq!(review.outcome, ReviewOutcome::NeedsMinorChanges);
        assert!(!review.requires_revision);
    }

    #[test]
    fn test_short_output_costs_one() {
        let output = "def f():\n    try: pass\n    except: raise\ndef test_f(): f()";
        let review = review(&task(TaskType::Testing, 10), output);
        assert_eq!(review.quality_score, 9);
        assert!(review.detailed_feedback.iter().any(|f| f.contains("too brief")));
    }

    #[test]
    fn test_http_markers_only_for_http_tasks() {
        let output = "fn handler() -> Result<(), Error> { work()?; Ok(()) }\n#[test]\nfn t() {}\n"
            .repeat(10);
        let design = review(&task(TaskType::SystemDesign, 5), &output);
        assert_eq!(design.quality_score, 10);

        let api = review(&task(TaskType::ApiDevelopment, 5), &output);
        assert_eq!(api.quality_score, 7);
        assert_eq!(api.detailed_feedback.len(), 2);
    }

    #[test]
    fn test_password_without_hash_forces_revision() {
        let output = format!("{SOLID_HANDLER}\nuser.password = form.password\n");
        let review = review(&task(TaskType::CodeGeneration, 5), &output);
        assert_eq!(review.security_issues, vec!["Password handling without proper hashing"]);
        assert_eq!(review.quality_score, 7);
        assert!(review.requires_revision);
        assert_eq!(review.outcome, ReviewOutcome::NeedsMajorChanges);
        assert!(review.approval_notes.is_empty());
        assert!(review.summary.contains("1 security issue(s) found"));
    }

    #[test]
    fn test_hashed_password_is_fine() {
        let output = format!("{SOLID_HANDLER}\nuser.password = bcrypt.hash(form.password)\n");
        let review = review(&task(TaskType::CodeGeneration, 5), &output);
        assert!(review.security_issues.is_empty());
        assert!(!review.requires_revision);
    }

    #[test]
    fn test_hardcoded_secret_flagged() {
        let output = format!("{SOLID_HANDLER}\nAPI_KEY = 'sk-live-1234'\n");
        let review = review(&task(TaskType::CodeGeneration, 5), &output);
        assert_eq!(review.security_issues, vec!["Potential hardcoded secrets"]);
        assert_eq!(review.quality_score, 8);
        assert!(review.requires_revision);
        assert_ne!(review.outcome, ReviewOutcome::Approved);
    }

    #[test]
    fn test_score_is_clamped_to_one() {
        let review = review(&task(TaskType::CodeGeneration, 10), "password secret");
        assert_eq!(review.quality_score, 1);
        assert_eq!(review.outcome, ReviewOutcome::Rejected);
        assert_eq!(review.security_issues.len(), 2);
        assert!(review.requires_revision);
    }

    #[test]
    fn test_empty_output_rejected() {
        let reviewer = HeuristicReviewer::default();
        let task = task(TaskType::CodeGeneration, 5);
        for result in [AgentResult::success("   "), AgentResult::failure("nothing")] {
            let review = reviewer.review(&TaskId::from("t-2"), &task, &result);
            assert_eq!(review.quality_score, 1);
            assert_eq!(review.outcome, ReviewOutcome::Rejected);
            assert!(review.requires_revision);
            assert_eq!(review.summary, "No output provided");
        }
    }

    #[test]
    fn test_strict_threshold_never_approves_with_revision() {
        let reviewer = HeuristicReviewer::new(10);
        let output = "def f():\n    try: pass\n    except: raise\ndef test_f(): f()";
        let review = reviewer.review(
            &TaskId::from("t-3"),
            &task(TaskType::Testing, 10),
            &AgentResult::success(output),
        );
        assert_eq!(review.quality_score, 9);
        assert!(review.requires_revision);
        assert_eq!(review.outcome, ReviewOutcome::NeedsMinorChanges);
    }

    #[test]
    fn test_score_always_in_range() {
        let reviewer = HeuristicReviewer::default();
        let samples = ["", "x", "password", SOLID_HANDLER, "secret api_key password token"];
        for task_type in [TaskType::CodeGeneration, TaskType::Testing, TaskType::General] {
            for complexity in [1, 5, 10] {
                for sample in samples {
                    let review = reviewer.review(
                        &TaskId::from("t"),
                        &task(task_type, complexity),
                        &AgentResult::success(sample),
                    );
                    assert!((1..=10).contains(&review.quality_score));
                    if review.requires_revision {
                        assert_ne!(review.outcome, ReviewOutcome::Approved);
                    }
                }
            }
        }
    }
}
