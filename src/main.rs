//! # Topic Queue
//!
//! The stateful core of a small content pipeline (topic → article → image →
//! email). Every stage runs as its own short-lived process and hands work to
//! the next one through files; this binary owns the file of pending topics.
//!
//! ## Usage
//!
//! ```sh
//! topic_queue replenish            # topic stage
//! topic_queue claim                # article stage
//! topic_queue status
//! ```
//!
//! ## Architecture
//!
//! 1. **Load**: read the persisted queue (missing or corrupt ⇒ empty)
//! 2. **Decide**: replenish only when fewer than `--threshold` topics wait
//! 3. **Generate**: ask the LLM for `--count` candidates (with retry/backoff)
//! 4. **Merge & Save**: append unseen topics, replace the file atomically
//!
//! `claim` pops the oldest topic, writes the optional hand-off file, saves the
//! rest, and prints the topic.

use clap::Parser;
use std::error::Error;
use std::process::ExitCode;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod manager;
mod models;
mod outputs;
mod queue;
mod source;
mod store;
mod utils;

use cli::{Cli, Command};
use manager::{ClaimOutcome, QueueManager, ReplenishOutcome};
use source::LlmTopicSource;

#[tokio::main]
#[instrument]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let start_time = std::time::Instant::now();
    info!("topic_queue starting up");

    let args = Cli::parse();
    debug!(queue_file = %args.queue_file.display(), threshold = args.threshold, command = ?args.command, "Parsed CLI arguments");

    let result = run(&args).await;

    let elapsed = start_time.elapsed();
    match &result {
        Ok((state, _)) => info!(
            ?elapsed,
            secs = elapsed.as_secs(),
            millis = elapsed.subsec_millis(),
            state,
            "Execution complete"
        ),
        Err(e) => error!(?elapsed, error = %e, state = "FAILED", "Execution aborted"),
    }

    result.map(|(_, code)| code)
}

/// Dispatch the selected subcommand.
///
/// Returns the final state label for the run summary and the exit code.
async fn run(args: &Cli) -> Result<(&'static str, ExitCode), Box<dyn Error>> {
    let config = args.queue_config();

    match &args.command {
        Command::Replenish {
            config: llm_config,
            template,
            ..
        } => {
            let source = LlmTopicSource::new(llm_config.clone(), template.clone());
            let manager = QueueManager::new(config, source);

            let outcome = manager.replenish().await?;
            let code = match &outcome {
                ReplenishOutcome::Failed { reason } => {
                    error!(%reason, "Replenishment failed");
                    ExitCode::FAILURE
                }
                _ => ExitCode::SUCCESS,
            };
            Ok((outcome.label(), code))
        }
        Command::Claim { handoff_file } => {
            let manager = QueueManager::new(config, ());

            match manager.claim(handoff_file.as_deref()).await? {
                ClaimOutcome::Claimed(topic) => {
                    println!("{topic}");
                    Ok(("CLAIMED", ExitCode::SUCCESS))
                }
                ClaimOutcome::Empty => Ok(("EMPTY", ExitCode::SUCCESS)),
            }
        }
        Command::Status => {
            let manager = QueueManager::new(config, ());

            println!("{}", manager.status().await);
            Ok(("STATUS", ExitCode::SUCCESS))
        }
    }
}
