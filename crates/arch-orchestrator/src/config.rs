//! TOML configuration for the orchestrator.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading the file.
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("Failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error.
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Orchestrator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Revision requests allowed along one chain before it fails.
    #[serde(default = "default_max_revision_cycles")]
    pub max_revision_cycles: u32,

    /// Reviews scoring below this force a revision.
    #[serde(default = "default_quality_threshold")]
    pub quality_threshold: u8,

    /// Upper bound on a single agent call, if any.
    #[serde(default)]
    pub execution_timeout_secs: Option<u64>,

    /// Reviewer settings.
    #[serde(default)]
    pub review: ReviewConfig,
}

fn default_max_revision_cycles() -> u32 {
    3
}

fn default_quality_threshold() -> u8 {
    7
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_revision_cycles: default_max_revision_cycles(),
            quality_threshold: default_quality_threshold(),
            execution_timeout_secs: None,
            review: ReviewConfig::default(),
        }
    }
}

/// Settings for the heuristic reviewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Output shorter than this many characters per complexity point loses a point.
    #[serde(default = "default_min_output_chars")]
    pub min_output_chars_per_complexity: usize,

    /// Name stamped on every review.
    #[serde(default = "default_reviewer")]
    pub reviewer: String,
}

fn default_min_output_chars() -> usize {
    40
}

fn default_reviewer() -> String {
    "arch-cto".to_string()
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self { min_output_chars_per_complexity: default_min_output_chars(), reviewer: default_reviewer() }
    }
}

impl OrchestratorConfig {
    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    /// Returns error if the text is not valid TOML or fails validation.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns error if file cannot be read, parsed or validated.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns error if a value is out of range.
    pub fn validate(&self) -> Result<()> {
        if !(1..=10).contains(&self.quality_threshold) {
            return Err(ConfigError::Validation(format!(
                "Invalid quality_threshold: {}. Must be between 1 and 10",
                self.quality_threshold
            )));
        }

        if self.execution_timeout_secs == Some(0) {
            return Err(ConfigError::Validation(
                "execution_timeout_secs must be greater than 0 when set".to_string(),
            ));
        }

        if self.review.min_output_chars_per_complexity == 0 {
            return Err(ConfigError::Validation(
                "review.min_output_chars_per_complexity must be greater than 0".to_string(),
            ));
        }

        if self.review.reviewer.trim().is_empty() {
            return Err(ConfigError::Validation("review.reviewer must not be empty".to_string()));
        }

        Ok(())
    }

    /// Returns the execution timeout as a `Duration`.
    #[must_use]
    pub fn execution_timeout(&self) -> Option<Duration> {
        self.execution_timeout_secs.map(Duration::from_secs)
    }
}
