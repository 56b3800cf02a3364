//! Utility functions for text cleanup, log formatting and atomic file writes.
//!
//! This module provides helper functions used throughout the application:
//! - Cleanup of raw LLM lines into usable topic titles
//! - String truncation for logging
//! - All-or-nothing file replacement for persisted state

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};

static LIST_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:\d+[.)]\s+|[-*•](?:\s+|$))").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Clean one line of model output into a bare topic title.
///
/// Removes a leading list marker, i.e. numbering (`1. `, `2) `) or a bullet
/// (`- `, `* `, `• `) followed by whitespace, then markdown emphasis and
/// wrapping quotes, and collapses runs of whitespace. Digits that are part of
/// the title itself (`3.5 …`, `2025: …`) are kept.
///
/// # Returns
///
/// The cleaned title, or an empty string if nothing usable remains.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(clean_topic("1. \"Edge AI  en banca\""), "Edge AI en banca");
/// assert_eq!(clean_topic("• **MLOps**"), "MLOps");
/// ```
pub fn clean_topic(line: &str) -> String {
    let t = LIST_MARKER.replace(line.trim(), "");
    let t = t.trim().trim_matches('*').trim();
    let t = t.trim_matches(|c: char| matches!(c, '"' | '“' | '”' | '\'' | '«' | '»'));
    WHITESPACE.replace_all(t.trim(), " ").into_owned()
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes, backing off to the nearest
/// character boundary, with an ellipsis and byte count appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

/// Sibling path used as the staging file for an atomic write.
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}

/// Replace `path` with `contents` so readers see either the old or the new
/// file, never a mix.
///
/// The bytes are written to a staging file next to `path`, synced, and then
/// renamed over the target. The parent directory is created if missing. On
/// failure the staging file is removed and the original is left untouched.
///
/// # Errors
///
/// Returns an error if the directory cannot be created, the staging file
/// cannot be written or synced, or the rename fails.
#[instrument(level = "info", skip_all, fields(path = %path.display(), bytes = contents.len()))]
pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    let staging = staging_path(path);
    let result = async {
        let mut file = fs::File::create(&staging).await?;
        file.write_all(contents).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&staging, path).await
    }
    .await;

    if let Err(e) = result {
        if let Err(cleanup) = fs::remove_file(&staging).await {
            debug!(staging = %staging.display(), error = %cleanup, "Staging file not removed");
        }
        warn!(error = %e, "Atomic write failed; previous contents kept");
        return Err(Box::new(e));
    }

    debug!("Atomic write committed");
    Ok(())
}
