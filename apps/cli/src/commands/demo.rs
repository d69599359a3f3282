//! Demo command implementation.
//!
//! Runs a single task through assign, execute, review and revise with a scripted
//! worker and reports the outcome.

use anyhow::Context;
use arch_abstraction::{Priority, TaskType};
use arch_orchestrator::{
    Orchestrator, OrchestratorConfig, Review, ScriptedAgent, TaskId, TaskStatus,
};
use colored::Colorize;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

const WORKER_TYPE: &str = "backend";

const DRAFT_OUTPUT: &str = "print('ok')";

const REVISED_OUTPUT: &str = r#"
from fastapi import APIRouter, HTTPException

router = APIRouter()

@router.get("/health", response_model=HealthResponse)
def health() -> HealthResponse:
    try:
        return HealthResponse(status="ok", database=db.ping())
    except ConnectionError as exc:
        raise HTTPException(status_code=503) from exc

def test_health_reports_ok(client):
    assert client.get("/health").json()["status"] == "ok"
"#;

/// Options for the demo command.
#[derive(Debug)]
pub struct DemoOptions {
    pub config: Option<PathBuf>,
    pub description: String,
    pub task_type: String,
    pub complexity: u8,
    pub priority: String,
    pub outputs: Vec<String>,
    pub json: bool,
}

/// Execute the demo command.
pub async fn execute(options: DemoOptions) -> anyhow::Result<()> {
    let config = match &options.config {
        Some(path) => OrchestratorConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => OrchestratorConfig::default(),
    };

    let task_type: TaskType = options.task_type.parse()?;
    let priority: Priority = options.priority.parse()?;

    let outputs = if options.outputs.is_empty() {
        vec![DRAFT_OUTPUT.to_string(), REVISED_OUTPUT.to_string()]
    } else {
        options.outputs
    };

    let orchestrator = Orchestrator::new(config)?;
    let worker = ScriptedAgent::new(format!("{WORKER_TYPE}-1"), outputs)
        .with_description("Scripted backend developer");
    orchestrator.register_agent(WORKER_TYPE, Arc::new(worker)).await;

    let mut task_id = orchestrator
        .assign(
            &options.description,
            task_type,
            WORKER_TYPE,
            options.complexity,
            priority,
            BTreeMap::new(),
        )
        .await?;

    if !options.json {
        println!("{} {}", "Assigned".bold().cyan(), task_id);
    }

    loop {
        match orchestrator.execute(&task_id).await {
            Ok(_) => {}
            Err(e) if e.is_execution_failure() => {
                if !options.json {
                    println!("  {} {}", "Execution failed:".red(), e);
                }
                break;
            }
            Err(e) => return Err(e.into()),
        }

        let review = orchestrator.review(&task_id).await?;
        if !options.json {
            print_review(&review);
        }

        if !review.requires_revision {
            orchestrator.complete(&task_id).await?;
            break;
        }

        let next = orchestrator.request_revision(&task_id, &revision_notes(&review)).await?;
        if next == task_id {
            break;
        }
        if !options.json {
            println!("{} {}", "Revision".bold().yellow(), next);
        }
        task_id = next;
    }

    report(&orchestrator, &task_id, options.json).await?;

    for (agent_type, err) in orchestrator.shutdown().await {
        tracing::warn!(agent_type = %agent_type, error = %err, "Worker shutdown failed");
    }

    Ok(())
}

fn revision_notes(review: &Review) -> String {
    review
        .security_issues
        .iter()
        .chain(review.detailed_feedback.iter())
        .map(|line| format!("- {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn print_review(review: &Review) {
    let summary = if review.requires_revision {
        review.summary.yellow()
    } else {
        review.summary.green()
    };
    println!("  {summary}");
    for issue in &review.security_issues {
        println!("    {} {}", "security:".red(), issue);
    }
    for item in &review.detailed_feedback {
        println!("    {} {}", "-".dimmed(), item);
    }
}

async fn report(orchestrator: &Orchestrator, task_id: &TaskId, json_output: bool) -> anyhow::Result<()> {
    let status = orchestrator.status(task_id).await?;
    let chain = orchestrator.revision_chain(task_id).await?;
    let metrics = orchestrator.metrics().await;

    if json_output {
        let report = json!({
            "status": status,
            "revision_chain": chain,
            "metrics": metrics,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let label = match status.status {
        TaskStatus::Completed | TaskStatus::Approved => status.status.to_string().bold().green(),
        TaskStatus::Failed => status.status.to_string().bold().red(),
        _ => status.status.to_string().bold(),
    };
    println!();
    println!("{} {}", "Final status:".bold(), label);
    println!("  Attempts: {}", chain.len());
    println!("  Revision count: {}", status.revision_count);
    println!("  Estimated hours: {:.1}", status.estimated_hours);
    println!("  Total tasks: {}", metrics.total_tasks);
    println!("  Average review cycles: {:.2}", metrics.average_review_cycles);
    println!(
        "  Quality trend: {}",
        metrics.quality_trends.iter().map(ToString::to_string).collect::<Vec<_>>().join(" -> ")
    );

    Ok(())
}
