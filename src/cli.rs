//! Command-line interface definitions for the topic queue.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Queue location and threshold can also come from environment variables so
//! scheduled jobs can share one setting across stages.

use crate::models::QueueConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the topic queue.
///
/// # Examples
///
/// ```sh
/// # Topic stage: top the queue up when fewer than 3 topics are pending
/// topic_queue replenish --count 10
///
/// # Article stage: claim the next topic and leave a hand-off file
/// topic_queue --queue-file 01_temas/temas_pendientes.json claim --handoff-file 01_temas/tema_actual.json
///
/// # Inspect the queue
/// topic_queue status
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path of the persisted pending-topic queue (JSON array)
    #[arg(short, long, global = true, env = "TOPIC_QUEUE_FILE", default_value = "temas_pendientes.json")]
    pub queue_file: PathBuf,

    /// Replenish when fewer than this many topics are pending
    #[arg(short, long, global = true, env = "TOPIC_QUEUE_THRESHOLD", default_value_t = 3)]
    pub threshold: usize,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Generate new topics if the queue is below the threshold
    Replenish {
        /// Number of topics to request from the model
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,

        /// Optional path to the awful_aj config.yaml file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Name of the awful_aj chat template used for topic generation
        #[arg(long, default_value = "topic_generator")]
        template: String,
    },
    /// Claim the oldest pending topic and print it
    Claim {
        /// Also write the claimed topic to this JSON file
        #[arg(long)]
        handoff_file: Option<PathBuf>,
    },
    /// Show the queue state without changing it
    Status,
}

impl Cli {
    /// Build the manager configuration; `batch_size` is only meaningful for `replenish`.
    pub fn queue_config(&self) -> QueueConfig {
        let batch_size = match &self.command {
            Command::Replenish { count, .. } => *count,
            _ => 0,
        };
        QueueConfig {
            queue_file: self.queue_file.clone(),
            threshold: self.threshold,
            batch_size,
        }
    }
}
