//! Topic queue manager: the only component that mutates the persisted queue.
//!
//! Each process run performs one complete load-mutate-save cycle:
//!
//! ```text
//! replenish: load → below threshold? ──no──▶ Skipped
//!                         │ yes
//!                         ▼
//!                  source.generate(batch)
//!                  ├─ Topics ─▶ merge_new ─▶ save ─▶ Merged
//!                  └─ Empty / Failed ──────────────▶ Failed (nothing written)
//!
//! claim:     load → dequeue_one ─┬─ Some ─▶ write hand-off ─▶ save ─▶ Claimed
//!                                └─ None ──────────────────────────▶ Empty
//! ```
//!
//! Source failures are outcomes, not errors. Only storage failures surface as
//! `Err`, since at that point the run cannot guarantee its result was kept.

use crate::models::{ClaimedTopic, QueueConfig};
use crate::outputs::json::write_claimed_topic;
use crate::source::{SourceOutcome, TopicSource};
use crate::store::QueueStore;
use std::error::Error;
use std::fmt;
use std::path::Path;
use tracing::{info, instrument, warn};

/// How a replenishment run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplenishOutcome {
    /// Enough topics were pending; the source was not called.
    Skipped { pending: usize },
    /// Candidates were merged; `added` may be zero if all were known.
    Merged { added: usize, pending: usize },
    /// The source failed or produced nothing; the queue was not touched.
    Failed { reason: String },
}

impl ReplenishOutcome {
    /// Final state label for the run summary.
    pub fn label(&self) -> &'static str {
        match self {
            ReplenishOutcome::Skipped { .. } => "SKIPPED",
            ReplenishOutcome::Merged { .. } => "SUCCESS",
            ReplenishOutcome::Failed { .. } => "FAILED",
        }
    }
}

/// How a claim run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    Claimed(String),
    /// No topics available yet.
    Empty,
}

/// Read-only snapshot of the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueStatus {
    pub pending: usize,
    pub threshold: usize,
    pub needs_replenishment: bool,
    pub next: Option<String>,
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "pending: {}", self.pending)?;
        writeln!(f, "threshold: {}", self.threshold)?;
        writeln!(f, "needs_replenishment: {}", self.needs_replenishment)?;
        write!(f, "next: {}", self.next.as_deref().unwrap_or("-"))
    }
}

/// Owns every state transition of the persisted topic queue.
#[derive(Debug)]
pub struct QueueManager<S> {
    config: QueueConfig,
    store: QueueStore,
    source: S,
}

impl<S> QueueManager<S> {
    /// Create a manager; stages that never replenish may pass `()` as source.
    pub fn new(config: QueueConfig, source: S) -> Self {
        let store = QueueStore::new(config.queue_file.clone());
        Self {
            config,
            store,
            source,
        }
    }

    pub fn store(&self) -> &QueueStore {
        &self.store
    }

    /// Claim the oldest pending topic.
    ///
    /// When `handoff` is given the claimed topic is written there before the
    /// shortened queue is saved, so a topic only leaves the queue once the
    /// article stage can find it.
    ///
    /// # Errors
    ///
    /// Returns an error if the hand-off or the shortened queue cannot be
    /// written; the topic is then still pending on disk and will be handed
    /// out again.
    #[instrument(level = "info", skip_all, fields(handoff = ?handoff))]
    pub async fn claim(&self, handoff: Option<&Path>) -> Result<ClaimOutcome, Box<dyn Error>> {
        let mut queue = self.store.load().await;

        let Some(topic) = queue.dequeue_one() else {
            warn!("No pending topics to claim");
            return Ok(ClaimOutcome::Empty);
        };

        if let Some(path) = handoff {
            write_claimed_topic(&ClaimedTopic::now(topic.as_str()), path).await?;
        }

        self.store.save(&queue).await?;
        info!(%topic, remaining = queue.len(), "Claimed topic");
        Ok(ClaimOutcome::Claimed(topic))
    }

    /// Report the queue state without changing it.
    pub async fn status(&self) -> QueueStatus {
        let queue = self.store.load().await;
        QueueStatus {
            pending: queue.len(),
            threshold: self.config.threshold,
            needs_replenishment: queue.needs_replenishment(self.config.threshold),
            next: queue.iter().next().cloned(),
        }
    }
}

impl<S> QueueManager<S>
where
    S: TopicSource,
{
    /// Top the queue up from the source when it has fallen below the threshold.
    ///
    /// # Errors
    ///
    /// Only a failed save is returned as an error. Source problems become
    /// [`ReplenishOutcome::Failed`] and leave the persisted queue untouched.
    #[instrument(level = "info", skip_all, fields(threshold = self.config.threshold, batch = self.config.batch_size))]
    pub async fn replenish(&self) -> Result<ReplenishOutcome, Box<dyn Error>> {
        let mut queue = self.store.load().await;
        info!(pending = queue.len(), "Current pending topics");

        if !queue.needs_replenishment(self.config.threshold) {
            info!(
                pending = queue.len(),
                "Enough topics pending; skipping generation"
            );
            return Ok(ReplenishOutcome::Skipped {
                pending: queue.len(),
            });
        }

        let candidates = match self.source.generate(self.config.batch_size).await {
            SourceOutcome::Topics(candidates) => candidates,
            other => {
                warn!(outcome = %other, "No topics generated; queue left unchanged");
                return Ok(ReplenishOutcome::Failed {
                    reason: other.to_string(),
                });
            }
        };

        let offered = candidates.len();
        let added = queue.merge_new(candidates);
        if added == 0 {
            info!(offered, "No new unique topics to add");
            return Ok(ReplenishOutcome::Merged {
                added,
                pending: queue.len(),
            });
        }

        self.store.save(&queue).await?;
        info!(offered, added, pending = queue.len(), "New topics added to queue");
        Ok(ReplenishOutcome::Merged {
            added,
            pending: queue.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::TopicQueue;
    use std::cell::Cell;
    use std::path::Path;

    /// Source that replays a fixed outcome and counts calls.
    struct FakeSource {
        outcome: SourceOutcome,
        calls: Cell<usize>,
        last_n: Cell<usize>,
    }

    impl FakeSource {
        fn new(outcome: SourceOutcome) -> Self {
            Self {
                outcome,
                calls: Cell::new(0),
                last_n: Cell::new(0),
            }
        }

        fn topics(items: &[&str]) -> Self {
            Self::new(SourceOutcome::Topics(
                items.iter().map(|s| s.to_string()).collect(),
            ))
        }
    }

    impl TopicSource for FakeSource {
        async fn generate(&self, n: usize) -> SourceOutcome {
            self.calls.set(self.calls.get() + 1);
            self.last_n.set(n);
            self.outcome.clone()
        }
    }

    fn manager(path: &Path, threshold: usize, source: FakeSource) -> QueueManager<FakeSource> {
        let config = QueueConfig {
            queue_file: path.to_path_buf(),
            threshold,
            batch_size: 10,
        };
        QueueManager::new(config, source)
    }

    async fn seed(path: &Path, items: &[&str]) {
        QueueStore::new(path)
            .save(&TopicQueue::from_entries(items.iter().copied()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_replenish_merges_without_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.json");
        seed(&path, &["A", "B"]).await;

        let mgr = manager(&path, 3, FakeSource::topics(&["B", "C", "D"]));
        let outcome = mgr.replenish().await.unwrap();

        assert_eq!(outcome, ReplenishOutcome::Merged { added: 2, pending: 4 });
        assert_eq!(mgr.source.last_n.get(), 10);
        assert_eq!(mgr.store().load().await.to_vec(), vec!["A", "B", "C", "D"]);
    }

    #[tokio::test]
    async fn test_replenish_skips_when_enough_pending() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.json");
        seed(&path, &["A", "B", "C", "D"]).await;

        let mgr = manager(&path, 3, FakeSource::topics(&["E"]));
        let outcome = mgr.replenish().await.unwrap();

        assert_eq!(outcome, ReplenishOutcome::Skipped { pending: 4 });
        assert_eq!(mgr.source.calls.get(), 0);
        assert_eq!(outcome.label(), "SKIPPED");
    }

    #[tokio::test]
    async fn test_replenish_at_threshold_skips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.json");
        seed(&path, &["A", "B", "C"]).await;

        let mgr = manager(&path, 3, FakeSource::topics(&["E"]));
        assert!(matches!(
            mgr.replenish().await.unwrap(),
            ReplenishOutcome::Skipped { .. }
        ));
        assert_eq!(mgr.source.calls.get(), 0);
    }

    #[tokio::test]
    async fn test_replenish_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.json");

        let mgr = manager(&path, 3, FakeSource::topics(&["A", "", "A", "B"]));
        let outcome = mgr.replenish().await.unwrap();

        assert_eq!(outcome, ReplenishOutcome::Merged { added: 2, pending: 2 });
        assert_eq!(mgr.store().load().await.to_vec(), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_failed_source_leaves_queue_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.json");
        seed(&path, &["A"]).await;
        let before = std::fs::read(&path).unwrap();

        let mgr = manager(&path, 3, FakeSource::new(SourceOutcome::Failed("rate limited".into())));
        let outcome = mgr.replenish().await.unwrap();

        assert_eq!(
            outcome,
            ReplenishOutcome::Failed {
                reason: "source failed: rate limited".into()
            }
        );
        assert_eq!(outcome.label(), "FAILED");
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn test_empty_source_leaves_queue_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.json");
        seed(&path, &["A"]).await;
        let before = std::fs::read(&path).unwrap();

        let mgr = manager(&path, 3, FakeSource::new(SourceOutcome::Empty));
        assert!(matches!(
            mgr.replenish().await.unwrap(),
            ReplenishOutcome::Failed { .. }
        ));
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn test_failed_source_on_missing_file_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.json");

        let mgr = manager(&path, 3, FakeSource::new(SourceOutcome::Empty));
        mgr.replenish().await.unwrap();

        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_all_known_candidates_is_successful_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.json");
        seed(&path, &["A", "B"]).await;

        let mgr = manager(&path, 3, FakeSource::topics(&["A", "B"]));
        let outcome = mgr.replenish().await.unwrap();

        assert_eq!(outcome, ReplenishOutcome::Merged { added: 0, pending: 2 });
        assert_eq!(outcome.label(), "SUCCESS");
        assert_eq!(mgr.store().load().await.to_vec(), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_replenish_recovers_from_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.json");
        std::fs::write(&path, "not json at all").unwrap();

        let mgr = manager(&path, 3, FakeSource::topics(&["A"]));
        mgr.replenish().await.unwrap();

        assert_eq!(mgr.store().load().await.to_vec(), vec!["A"]);
    }

    #[tokio::test]
    async fn test_claim_sequence_never_repeats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.json");
        seed(&path, &["a", "b", "c"]).await;

        let mgr = manager(&path, 3, FakeSource::new(SourceOutcome::Empty));
        assert_eq!(mgr.claim(None).await.unwrap(), ClaimOutcome::Claimed("a".into()));
        assert_eq!(mgr.store().load().await.to_vec(), vec!["b", "c"]);
        assert_eq!(mgr.claim(None).await.unwrap(), ClaimOutcome::Claimed("b".into()));
        assert_eq!(mgr.claim(None).await.unwrap(), ClaimOutcome::Claimed("c".into()));
        assert_eq!(mgr.claim(None).await.unwrap(), ClaimOutcome::Empty);
        assert!(mgr.store().load().await.is_empty());
    }

    #[tokio::test]
    async fn test_claim_writes_handoff() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.json");
        let handoff = dir.path().join("tema_actual.json");
        seed(&path, &["a", "b"]).await;

        let mgr = manager(&path, 3, FakeSource::new(SourceOutcome::Empty));
        assert_eq!(
            mgr.claim(Some(handoff.as_path())).await.unwrap(),
            ClaimOutcome::Claimed("a".into())
        );

        let claimed: ClaimedTopic =
            serde_json::from_str(&std::fs::read_to_string(&handoff).unwrap()).unwrap();
        assert_eq!(claimed.topic, "a");
        assert_eq!(mgr.store().load().await.to_vec(), vec!["b"]);
    }

    #[tokio::test]
    async fn test_failed_handoff_keeps_topic_pending() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.json");
        seed(&path, &["a", "b"]).await;
        let before = std::fs::read(&path).unwrap();

        // An existing directory at the hand-off path makes the write fail.
        let handoff = dir.path().join("tema_actual.json");
        std::fs::create_dir(&handoff).unwrap();
        std::fs::write(handoff.join("keep"), "x").unwrap();

        let mgr = manager(&path, 3, FakeSource::new(SourceOutcome::Empty));
        assert!(mgr.claim(Some(handoff.as_path())).await.is_err());

        assert_eq!(std::fs::read(&path).unwrap(), before);
        assert_eq!(mgr.store().load().await.to_vec(), vec!["a", "b"]);
        assert_eq!(mgr.claim(None).await.unwrap(), ClaimOutcome::Claimed("a".into()));
    }

    #[tokio::test]
    async fn test_claim_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.json");

        let mgr = manager(&path, 3, FakeSource::new(SourceOutcome::Empty));
        assert_eq!(mgr.claim(None).await.unwrap(), ClaimOutcome::Empty);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_status_is_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.json");
        seed(&path, &["A", "B"]).await;
        let before = std::fs::read(&path).unwrap();

        let mgr = manager(&path, 3, FakeSource::new(SourceOutcome::Empty));
        let status = mgr.status().await;

        assert_eq!(
            status,
            QueueStatus {
                pending: 2,
                threshold: 3,
                needs_replenishment: true,
                next: Some("A".into()),
            }
        );
        assert!(status.to_string().contains("next: A"));
        assert_eq!(std::fs::read(&path).unwrap(), before);
        assert_eq!(mgr.source.calls.get(), 0);
    }

    #[tokio::test]
    async fn test_save_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        // The queue path is an existing directory, so the final rename fails.
        let path = dir.path().join("queue.json");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), "x").unwrap();

        let mgr = manager(&path, 3, FakeSource::topics(&["A"]));
        assert!(mgr.replenish().await.is_err());
        assert!(path.join("keep").exists());
    }
}
