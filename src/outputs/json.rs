//! JSON hand-off of the claimed topic.
//!
//! The article stage runs as a separate process and picks up the topic it
//! should write about from a small JSON file:
//!
//! ```json
//! {
//!   "tema": "Detección de anomalías en pagos instantáneos",
//!   "generado_en": "2025-05-06T08:00:00Z"
//! }
//! ```
//!
//! The file is replaced atomically so the consumer never reads half a record.

use crate::models::ClaimedTopic;
use crate::utils::write_atomic;
use std::error::Error;
use std::path::Path;
use tracing::{info, instrument};

/// Write `claimed` to `path`, replacing any previous hand-off.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_claimed_topic(claimed: &ClaimedTopic, path: &Path) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(claimed)?;
    write_atomic(path, json.as_bytes()).await?;
    info!(topic = %claimed.topic, "Wrote claimed topic hand-off");
    Ok(())
}
