//! Scored-set counter store
//!
//! The four operations the popularity tracker needs, modeled after a Redis
//! sorted set. Keeping the interface this narrow makes the decay/prune logic
//! testable against the in-memory implementation.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Add `score` to `member` within the set at `key` (creating both as
    /// needed). Increments are atomic per key; concurrent callers never lose
    /// updates.
    async fn increment_scored_set(&self, key: &str, score: f64, member: &str) -> Result<()>;

    /// Members of the set at `key`, highest score first, positions
    /// `start..=stop` inclusive.
    async fn range_scored_set_desc(
        &self,
        key: &str,
        start: usize,
        stop: usize,
    ) -> Result<Vec<(String, f64)>>;

    /// Drop members whose score is strictly below `threshold`; returns how
    /// many were removed.
    async fn remove_scored_set_below(&self, key: &str, threshold: f64) -> Result<u64>;

    /// Bound the lifetime of the whole set at `key`.
    async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<()>;
}

struct ScoredSet {
    members: HashMap<String, f64>,
    expires_at: Option<Instant>,
}

impl ScoredSet {
    fn new() -> Self {
        Self {
            members: HashMap::new(),
            expires_at: None,
        }
    }

    fn is_expired(&self) -> bool {
        matches!(self.expires_at, Some(at) if at <= Instant::now())
    }
}

/// In-memory scored sets
#[derive(Default)]
pub struct MemoryCounterStore {
    sets: Arc<RwLock<HashMap<String, ScoredSet>>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn increment_scored_set(&self, key: &str, score: f64, member: &str) -> Result<()> {
        let mut sets = self.sets.write().await;
        let set = sets.entry(key.to_string()).or_insert_with(ScoredSet::new);
        if set.is_expired() {
            *set = ScoredSet::new();
        }
        *set.members.entry(member.to_string()).or_insert(0.0) += score;
        Ok(())
    }

    async fn range_scored_set_desc(
        &self,
        key: &str,
        start: usize,
        stop: usize,
    ) -> Result<Vec<(String, f64)>> {
        let sets = self.sets.read().await;
        let Some(set) = sets.get(key).filter(|s| !s.is_expired()) else {
            return Ok(Vec::new());
        };

        let mut members: Vec<(String, f64)> = set
            .members
            .iter()
            .map(|(m, s)| (m.clone(), *s))
            .collect();
        // Tie-break by member name so ranges are deterministic.
        members.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        if start >= members.len() {
            return Ok(Vec::new());
        }
        let stop = stop.min(members.len() - 1);
        Ok(members[start..=stop].to_vec())
    }

    async fn remove_scored_set_below(&self, key: &str, threshold: f64) -> Result<u64> {
        let mut sets = self.sets.write().await;
        let Some(set) = sets.get_mut(key) else {
            return Ok(0);
        };
        if set.is_expired() {
            let n = set.members.len();
            sets.remove(key);
            return Ok(n as u64);
        }

        let before = set.members.len();
        set.members.retain(|_, score| *score >= threshold);
        Ok((before - set.members.len()) as u64)
    }

    async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<()> {
        let mut sets = self.sets.write().await;
        if let Some(set) = sets.get_mut(key) {
            set.expires_at = Some(Instant::now() + Duration::from_secs(ttl_seconds));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_increment_accumulates() {
        let store = MemoryCounterStore::new();
        store.increment_scored_set("k", 1.0, "a").await.unwrap();
        store.increment_scored_set("k", 2.5, "a").await.unwrap();

        let top = store.range_scored_set_desc("k", 0, 10).await.unwrap();
        assert_eq!(top, vec![("a".to_string(), 3.5)]);
    }

    #[tokio::test]
    async fn test_range_is_descending_and_bounded() {
        let store = MemoryCounterStore::new();
        store.increment_scored_set("k", 1.0, "low").await.unwrap();
        store.increment_scored_set("k", 5.0, "high").await.unwrap();
        store.increment_scored_set("k", 3.0, "mid").await.unwrap();

        let top_two = store.range_scored_set_desc("k", 0, 1).await.unwrap();
        assert_eq!(top_two[0].0, "high");
        assert_eq!(top_two[1].0, "mid");

        let empty = store.range_scored_set_desc("k", 10, 20).await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_remove_below_threshold() {
        let store = MemoryCounterStore::new();
        store.increment_scored_set("k", 1.0, "stale").await.unwrap();
        store.increment_scored_set("k", 9.0, "fresh").await.unwrap();

        let removed = store.remove_scored_set_below("k", 5.0).await.unwrap();
        assert_eq!(removed, 1);

        let left = store.range_scored_set_desc("k", 0, 10).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].0, "fresh");
    }

    #[tokio::test]
    async fn test_expired_set_reads_empty() {
        let store = MemoryCounterStore::new();
        store.increment_scored_set("k", 1.0, "a").await.unwrap();
        store.expire("k", 0).await.unwrap();

        let members = store.range_scored_set_desc("k", 0, 10).await.unwrap();
        assert!(members.is_empty());
    }
}
