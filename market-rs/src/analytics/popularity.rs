//! Popularity and trending tracking
//!
//! Every free-text search bumps two counters: a cumulative "popular" count
//! and a time-decayed "trending" score. The trending increment is the number
//! of hours since a fixed epoch, so newer searches contribute strictly larger
//! increments; pruning drops members whose aggregate falls below the score a
//! single search would have earned at the edge of the window.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use super::CounterStore;

const POPULAR_KEY: &str = "popular:queries";
const TRENDING_KEY: &str = "trending:queries";
const CATEGORY_VIEWS_KEY: &str = "recent:category-views";

fn history_key(user: Uuid) -> String {
    format!("history:user:{user}")
}

/// Fixed epoch for the trending decay function.
fn trending_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn hours_since_epoch(at: DateTime<Utc>) -> f64 {
    (at - trending_epoch()).num_seconds() as f64 / 3600.0
}

/// Collapse whitespace and lowercase, so "Industrial  Mixer " and
/// "industrial mixer" count as the same query.
pub fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(|t| t.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone)]
pub struct PopularityConfig {
    pub trending_window_days: i64,
    pub history_max_entries: usize,
    pub history_retention_days: i64,
    /// How many popular entries a suggestion lookup scans
    pub suggestion_scan: usize,
}

impl Default for PopularityConfig {
    fn default() -> Self {
        Self {
            trending_window_days: 7,
            history_max_entries: 50,
            history_retention_days: 30,
            suggestion_scan: 100,
        }
    }
}

/// Best-effort popularity tracker. Write methods log and swallow failures;
/// they are called from spawned tasks and must never fail a search.
pub struct PopularityTracker {
    counters: Arc<dyn CounterStore>,
    config: PopularityConfig,
}

impl PopularityTracker {
    pub fn new(counters: Arc<dyn CounterStore>) -> Self {
        Self::with_config(counters, PopularityConfig::default())
    }

    pub fn with_config(counters: Arc<dyn CounterStore>, config: PopularityConfig) -> Self {
        Self { counters, config }
    }

    /// Record one execution of a free-text search (cache hit or miss alike).
    pub async fn track_search(&self, query: &str) {
        self.track_search_at(query, Utc::now()).await;
    }

    async fn track_search_at(&self, query: &str, now: DateTime<Utc>) {
        let normalized = normalize_query(query);
        if normalized.is_empty() {
            return;
        }

        if let Err(e) = self
            .counters
            .increment_scored_set(POPULAR_KEY, 1.0, &normalized)
            .await
        {
            warn!("popularity increment failed for {normalized:?}: {e}");
        }

        if let Err(e) = self
            .counters
            .increment_scored_set(TRENDING_KEY, hours_since_epoch(now), &normalized)
            .await
        {
            warn!("trending increment failed for {normalized:?}: {e}");
        }
    }

    /// Record a category being browsed.
    pub async fn track_category_view(&self, category_id: Uuid) {
        self.track_category_view_at(category_id, Utc::now()).await;
    }

    async fn track_category_view_at(&self, category_id: Uuid, now: DateTime<Utc>) {
        let member = category_id.to_string();
        let retention = Duration::days(self.config.history_retention_days);

        let result = async {
            self.counters
                .increment_scored_set(
                    CATEGORY_VIEWS_KEY,
                    now.timestamp_millis() as f64,
                    &member,
                )
                .await?;
            self.counters
                .remove_scored_set_below(
                    CATEGORY_VIEWS_KEY,
                    (now - retention).timestamp_millis() as f64,
                )
                .await?;
            self.counters
                .expire(CATEGORY_VIEWS_KEY, retention.num_seconds() as u64)
                .await
        }
        .await;

        if let Err(e) = result {
            warn!("category view tracking failed for {member}: {e}");
        }
    }

    /// Record a query in a user's search history (capped, time-bounded).
    pub async fn track_user_search(&self, user: Uuid, query: &str) {
        self.track_user_search_at(user, query, Utc::now()).await;
    }

    async fn track_user_search_at(&self, user: Uuid, query: &str, now: DateTime<Utc>) {
        let normalized = normalize_query(query);
        if normalized.is_empty() {
            return;
        }
        let key = history_key(user);
        let retention = Duration::days(self.config.history_retention_days);

        let result = async {
            // Score by recency millis: an incremented member moves to the
            // top of the log; old entries age out below the retention line.
            self.counters
                .increment_scored_set(&key, now.timestamp_millis() as f64, &normalized)
                .await?;
            self.counters
                .remove_scored_set_below(&key, (now - retention).timestamp_millis() as f64)
                .await?;
            self.counters
                .expire(&key, retention.num_seconds() as u64)
                .await
        }
        .await;

        if let Err(e) = result {
            warn!("history tracking failed for user {user}: {e}");
        }
    }

    /// Most-searched queries of all time.
    pub async fn popular(&self, limit: usize) -> Vec<(String, f64)> {
        if limit == 0 {
            return Vec::new();
        }
        match self
            .counters
            .range_scored_set_desc(POPULAR_KEY, 0, limit - 1)
            .await
        {
            Ok(entries) => entries,
            Err(e) => {
                warn!("popular lookup failed: {e}");
                Vec::new()
            }
        }
    }

    /// Recently-hot queries; prunes the stale tail first.
    pub async fn trending(&self, limit: usize) -> Vec<(String, f64)> {
        self.trending_at(limit, Utc::now()).await
    }

    async fn trending_at(&self, limit: usize, now: DateTime<Utc>) -> Vec<(String, f64)> {
        if limit == 0 {
            return Vec::new();
        }
        self.prune_trending_at(now).await;

        match self
            .counters
            .range_scored_set_desc(TRENDING_KEY, 0, limit - 1)
            .await
        {
            Ok(entries) => entries,
            Err(e) => {
                warn!("trending lookup failed: {e}");
                Vec::new()
            }
        }
    }

    /// Drop trending entries whose whole score predates the window. Safe to
    /// run concurrently; an early or late prune only shifts the cutoff by
    /// one call.
    pub async fn prune_trending(&self) {
        self.prune_trending_at(Utc::now()).await;
    }

    async fn prune_trending_at(&self, now: DateTime<Utc>) {
        let window = Duration::days(self.config.trending_window_days);
        let threshold = hours_since_epoch(now - window);
        if let Err(e) = self
            .counters
            .remove_scored_set_below(TRENDING_KEY, threshold)
            .await
        {
            warn!("trending prune failed: {e}");
        }
    }

    /// Prefix suggestions out of the popular set, best ranked first.
    pub async fn suggestions(&self, prefix: &str, limit: usize) -> Vec<String> {
        let normalized = normalize_query(prefix);
        if normalized.is_empty() || limit == 0 {
            return Vec::new();
        }

        let scan = match self
            .counters
            .range_scored_set_desc(POPULAR_KEY, 0, self.config.suggestion_scan.saturating_sub(1))
            .await
        {
            Ok(entries) => entries,
            Err(e) => {
                warn!("suggestion lookup failed: {e}");
                return Vec::new();
            }
        };

        scan.into_iter()
            .filter(|(member, _)| member.starts_with(&normalized))
            .map(|(member, _)| member)
            .take(limit)
            .collect()
    }

    /// A user's recent queries, newest first.
    pub async fn user_history(&self, user: Uuid) -> Vec<String> {
        let limit = self.config.history_max_entries;
        if limit == 0 {
            return Vec::new();
        }
        match self
            .counters
            .range_scored_set_desc(&history_key(user), 0, limit - 1)
            .await
        {
            Ok(entries) => entries.into_iter().map(|(member, _)| member).collect(),
            Err(e) => {
                warn!("history lookup failed for user {user}: {e}");
                Vec::new()
            }
        }
    }
}
