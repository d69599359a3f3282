//! ARCH CLI - Command-line interface for the ARCH task orchestrator
//!
//! This CLI provides an `arch` command for running the assign / execute / review /
//! revise loop against scripted workers and for checking orchestrator configuration.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{check_config, demo};

/// ARCH CLI - Review-gated task orchestration
#[derive(Parser, Debug)]
#[command(
    name = "arch",
    author,
    version,
    about = "ARCH - Review-gated task orchestration",
    long_about = "ARCH assigns tasks to worker agents, reviews their output against a quality gate\nand cycles failing work through a bounded number of revisions."
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a task through the orchestrator with a scripted worker
    ///
    /// The worker answers with each `--output` in turn. The task is executed, reviewed
    /// and revised until it is approved or the revision ceiling fails it.
    Demo {
        /// Orchestrator configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Task description
        #[arg(short, long, default_value = "Implement a health check endpoint")]
        description: String,

        /// Task type (code_generation, api_development, system_design, testing, ...)
        #[arg(short = 't', long, default_value = "code_generation")]
        task_type: String,

        /// Complexity on a 1-10 scale
        #[arg(long, default_value_t = 5)]
        complexity: u8,

        /// Priority (low, medium, high, critical)
        #[arg(short, long, default_value = "medium")]
        priority: String,

        /// Scripted worker outputs, replayed in order
        #[arg(short, long = "output")]
        outputs: Vec<String>,

        /// Print the final status and metrics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate an orchestrator configuration file
    CheckConfig {
        /// Configuration file (TOML)
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Demo { config, description, task_type, complexity, priority, outputs, json } => {
            demo::execute(demo::DemoOptions {
                config,
                description,
                task_type,
                complexity,
                priority,
                outputs,
                json,
            })
            .await
        }
        Command::CheckConfig { path } => check_config::execute(&path),
    }
}
