//! Check-config command implementation.

use arch_orchestrator::OrchestratorConfig;
use colored::Colorize;
use std::path::Path;

/// Loads and validates `path`, printing the effective settings.
pub fn execute(path: &Path) -> anyhow::Result<()> {
    let config = OrchestratorConfig::load(path)?;

    println!("{}", "Configuration OK".bold().green());
    println!("  max_revision_cycles: {}", config.max_revision_cycles);
    println!("  quality_threshold: {}", config.quality_threshold);
    match config.execution_timeout_secs {
        Some(secs) => println!("  execution_timeout_secs: {secs}"),
        None => println!("  execution_timeout_secs: {}", "none".dimmed()),
    }
    println!(
        "  review.min_output_chars_per_complexity: {}",
        config.review.min_output_chars_per_complexity
    );
    println!("  review.reviewer: {}", config.review.reviewer);

    Ok(())
}
