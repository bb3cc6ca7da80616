//! Result cache
//!
//! Read-through cache for search results, keyed by a digest of the full
//! (filters, options) tuple. The TTL is the only consistency bound; cached
//! pages may be briefly stale relative to the store. Every cache operation is
//! best-effort at the call site: failures are logged and swallowed, never
//! surfaced to the search request.

use anyhow::Result;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::search::types::{SearchFilters, SearchOptions};

pub const RESULT_KEY_PREFIX: &str = "search:results:";

/// Narrow cache-store contract (get/set/purge/list), so the engine does not
/// depend on any specific shared-cache technology.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()>;
    /// Remove every key matching a `*` glob pattern; returns how many.
    async fn delete_by_pattern(&self, pattern: &str) -> Result<u64>;
    async fn list_keys(&self, pattern: &str) -> Result<Vec<String>>;
}

/// Deterministic cache key for a search: any change to any filter or option
/// field changes the digest.
pub fn result_key(filters: &SearchFilters, options: &SearchOptions) -> String {
    let payload = serde_json::to_vec(&(filters, options)).unwrap_or_default();
    let digest = Sha256::digest(&payload);

    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(hex, "{byte:02x}");
    }
    format!("{RESULT_KEY_PREFIX}{hex}")
}

/// `*` glob matcher for purge patterns. Segments between wildcards must
/// appear in order; anchored at both ends.
pub(crate) fn pattern_matches(pattern: &str, key: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == key;
    }

    let segments: Vec<&str> = pattern.split('*').collect();
    let mut remainder = key;

    for (i, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            continue;
        }
        if i == 0 {
            match remainder.strip_prefix(segment) {
                Some(rest) => remainder = rest,
                None => return false,
            }
        } else if i == segments.len() - 1 {
            return remainder.ends_with(segment);
        } else {
            match remainder.find(segment) {
                Some(pos) => remainder = &remainder[pos + segment.len()..],
                None => return false,
            }
        }
    }

    // Pattern ended with '*' (or was all wildcards).
    true
}

struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// In-memory TTL cache. Single-key get/set are atomic under the lock;
/// last-writer-wins races between concurrent searches are acceptable since
/// both writers computed the same result for the same key.
#[derive(Default)]
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Ok(Some(entry.value.clone()));
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Entry looked expired under the read lock; re-check under the write
        // lock so a value a concurrent set just refreshed is not dropped.
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        let entry = CacheEntry {
            value: value.to_string(),
            expires_at: Instant::now() + Duration::from_secs(ttl_seconds),
        };
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete_by_pattern(&self, pattern: &str) -> Result<u64> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !pattern_matches(pattern, key));
        Ok((before - entries.len()) as u64)
    }

    async fn list_keys(&self, pattern: &str) -> Result<Vec<String>> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|(key, entry)| entry.expires_at > now && pattern_matches(pattern, key))
            .map(|(key, _)| key.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_matching() {
        assert!(pattern_matches("search:*", "search:results:abc"));
        assert!(pattern_matches("*", "anything"));
        assert!(pattern_matches("search:results:abc", "search:results:abc"));
        assert!(pattern_matches("search:*:abc", "search:results:abc"));
        assert!(!pattern_matches("search:*", "popular:queries"));
        assert!(!pattern_matches("search:results:abc", "search:results:def"));
    }

    #[test]
    fn test_result_key_changes_with_any_field() {
        let filters = SearchFilters::default();
        let options = SearchOptions::default();
        let base = result_key(&filters, &options);

        let mut changed = filters.clone();
        changed.min_price = Some(100.0);
        assert_ne!(result_key(&changed, &options), base);

        let mut changed = options.clone();
        changed.page = 2;
        assert_ne!(result_key(&filters, &changed), base);

        assert_eq!(result_key(&filters, &options), base);
    }

    #[tokio::test]
    async fn test_set_get_round_trip() {
        let cache = MemoryCache::new();
        cache.set("k", "v", 60).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some("v".to_string()));
        assert_eq!(cache.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_dropped() {
        let cache = MemoryCache::new();
        cache.set("k", "v", 0).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_refreshed_entry_survives_expiry_cleanup() {
        let cache = MemoryCache::new();
        cache.set("k", "old", 0).await.unwrap();
        cache.set("k", "new", 60).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some("new".to_string()));
        assert_eq!(cache.get("k").await.unwrap(), Some("new".to_string()));
    }

    #[tokio::test]
    async fn test_delete_by_pattern() {
        let cache = MemoryCache::new();
        cache.set("search:results:a", "1", 60).await.unwrap();
        cache.set("search:results:b", "2", 60).await.unwrap();
        cache.set("other:c", "3", 60).await.unwrap();

        let removed = cache.delete_by_pattern("search:*").await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(cache.get("other:c").await.unwrap(), Some("3".to_string()));
    }
}
