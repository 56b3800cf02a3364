//! Data models shared by the queue stages.
//!
//! - [`QueueDocument`]: shapes the queue file is accepted in when read back
//! - [`ClaimedTopic`]: hand-off record written for the article stage
//! - [`QueueConfig`]: explicit runtime configuration for the queue manager

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// On-disk representation of the pending-topic queue.
///
/// The canonical format is a bare JSON array of strings. Older runs of the
/// pipeline wrote an object with a `temas` key; it is still accepted on read
/// and rewritten as a bare array on the next save.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum QueueDocument {
    /// `["topic one", "topic two"]`
    List(Vec<String>),
    /// `{"temas": ["topic one", "topic two"]}`
    Legacy { temas: Vec<String> },
}

impl QueueDocument {
    pub fn into_entries(self) -> Vec<String> {
        match self {
            QueueDocument::List(entries) => entries,
            QueueDocument::Legacy { temas } => temas,
        }
    }
}

/// A topic claimed by the article stage.
///
/// Serialized as:
///
/// ```json
/// { "tema": "Edge AI for fraud detection", "generado_en": "2025-05-06T08:00:00Z" }
/// ```
///
/// The keys match what the article stage reads from `tema_actual.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClaimedTopic {
    /// The topic text, as it was stored in the queue.
    #[serde(rename = "tema")]
    pub topic: String,
    /// RFC 3339 UTC timestamp of the claim.
    #[serde(rename = "generado_en")]
    pub claimed_at: String,
}

impl ClaimedTopic {
    /// Stamp `topic` with the current UTC time.
    pub fn now(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            claimed_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// Runtime settings for the queue manager.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Location of the persisted queue file.
    pub queue_file: PathBuf,
    /// Replenish when fewer than this many topics are pending.
    pub threshold: usize,
    /// How many topics to request from the source per replenishment.
    pub batch_size: usize,
}
