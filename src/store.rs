//! Durable storage for the pending-topic queue.
//!
//! The queue lives in a single JSON file holding an array of strings:
//!
//! ```json
//! [
//!   "Optimización de carteras con aprendizaje por refuerzo",
//!   "Detección de anomalías en pagos instantáneos"
//! ]
//! ```
//!
//! # Recovery
//!
//! A missing file is a fresh queue. A file that cannot be parsed as one of the
//! accepted [`QueueDocument`] shapes is logged and treated as empty, so a
//! corrupted hand-off never blocks the pipeline.
//!
//! # Atomicity
//!
//! [`QueueStore::save`] goes through [`write_atomic`], which stages the new
//! contents beside the target and renames them into place.

use crate::models::QueueDocument;
use crate::queue::TopicQueue;
use crate::utils::{truncate_for_log, write_atomic};
use std::error::Error;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

/// File-backed home of a [`TopicQueue`].
#[derive(Debug, Clone)]
pub struct QueueStore {
    path: PathBuf,
}

impl QueueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted queue.
    ///
    /// Never fails: a missing, unreadable or malformed file yields an empty
    /// queue and a warning in the log.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    pub async fn load(&self) -> TopicQueue {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No persisted queue yet; starting empty");
                return TopicQueue::new();
            }
            Err(e) => {
                warn!(error = %e, "Queue file unreadable; treating as empty");
                return TopicQueue::new();
            }
        };

        if raw.trim().is_empty() {
            warn!("Queue file is empty; treating as empty queue");
            return TopicQueue::new();
        }

        match serde_json::from_str::<QueueDocument>(&raw) {
            Ok(doc) => {
                let entries = doc.into_entries();
                let stored = entries.len();
                let queue = TopicQueue::from_entries(entries);
                if queue.len() != stored {
                    warn!(
                        stored,
                        kept = queue.len(),
                        "Dropped blank or duplicate entries from persisted queue"
                    );
                }
                info!(pending = queue.len(), "Loaded topic queue");
                queue
            }
            Err(e) => {
                warn!(
                    error = %e,
                    content_preview = %truncate_for_log(&raw, 200),
                    "Queue file is corrupt; treating as empty"
                );
                TopicQueue::new()
            }
        }
    }

    /// Persist the full queue, replacing the previous file atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the atomic write fails. The
    /// previously persisted queue is left intact in that case.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display(), pending = queue.len()))]
    pub async fn save(&self, queue: &TopicQueue) -> Result<(), Box<dyn Error>> {
        let mut json = serde_json::to_string_pretty(&queue.to_vec())?;
        json.push('\n');
        write_atomic(&self.path, json.as_bytes()).await?;
        debug!(bytes = json.len(), "Serialized topic queue");
        info!("Saved topic queue");
        Ok(())
    }
}
