//! In-memory topic queue with set-backed deduplication.
//!
//! A [`TopicQueue`] is an ordered, duplicate-free sequence of pending topics.
//! Topics are consumed from the front (FIFO) and new candidates are appended
//! to the back, so the oldest generated topic is always claimed first.
//!
//! Identity is the exact, case-sensitive text of the trimmed topic. A
//! `HashSet` mirrors the vector so membership checks stay cheap no matter how
//! large the backlog grows; the vector remains the source of truth for order.
//!
//! Nothing in this module touches the file system. Persistence lives in
//! [`crate::store`], orchestration in [`crate::manager`].

use itertools::Itertools;
use std::collections::{HashSet, VecDeque};

/// Ordered, duplicate-free collection of pending topics.
#[derive(Debug, Clone, Default)]
pub struct TopicQueue {
    items: VecDeque<String>,
    index: HashSet<String>,
}

impl TopicQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a queue from raw entries.
    ///
    /// Entries are trimmed, blanks are dropped and repeated values keep only
    /// their first occurrence, so the result always satisfies the queue
    /// invariants regardless of what the input looked like.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut queue = Self::new();
        queue.push_unique(entries);
        queue
    }

    /// Number of pending topics.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether `topic` (after trimming) is already pending.
    pub fn contains(&self, topic: &str) -> bool {
        self.index.contains(topic.trim())
    }

    /// Iterate pending topics front to back.
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.items.iter()
    }

    /// Snapshot of the pending topics in queue order.
    pub fn to_vec(&self) -> Vec<String> {
        self.items.iter().cloned().collect()
    }

    /// `true` when fewer than `threshold` topics are pending.
    ///
    /// A queue holding exactly `threshold` topics does not need replenishing.
    pub fn needs_replenishment(&self, threshold: usize) -> bool {
        self.items.len() < threshold
    }

    /// Merge freshly generated candidates into the queue.
    ///
    /// Candidates are trimmed and blanks discarded. Values already pending, or
    /// repeated earlier in `candidates`, are skipped. Survivors are appended in
    /// their original relative order after every existing entry.
    ///
    /// Returns the number of topics actually added; zero is a normal outcome.
    pub fn merge_new<I, S>(&mut self, candidates: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.push_unique(candidates)
    }

    /// Remove and return the front topic, or `None` when nothing is pending.
    pub fn dequeue_one(&mut self) -> Option<String> {
        let topic = self.items.pop_front()?;
        self.index.remove(&topic);
        Some(topic)
    }

    fn push_unique<I, S>(&mut self, candidates: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fresh = candidates
            .into_iter()
            .map(|c| c.as_ref().trim().to_string())
            .filter(|c| !c.is_empty())
            .unique()
            .filter(|c| !self.index.contains(c))
            .collect::<Vec<String>>();

        let added = fresh.len();
        for topic in fresh {
            self.index.insert(topic.clone());
            self.items.push_back(topic);
        }
        added
    }
}

impl PartialEq for TopicQueue {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl Eq for TopicQueue {}
