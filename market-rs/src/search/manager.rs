//! Search orchestrator
//!
//! Composes the filter compiler, cursor codec, ranking engine, facet
//! aggregator, cache and popularity tracker into the two search entry
//! points. The manager assumes validated input (page >= 1, limit in 1..=100,
//! known sort key/order); the API boundary enforces that.

use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::analytics::PopularityTracker;
use crate::cache::{self, CacheStore};
use crate::config::SearchConfig;
use crate::error::{MarketError, Result};
use crate::models::{CategoryIndex, SortKey, SortOrder};
use crate::store::{sort_value_of, ListingStore, Predicate, SortField, SortSpec};

use super::types::{CursorPage, SearchFilters, SearchOptions, SearchResult};
use super::{cursor, facets, filters, ranking};

pub struct SearchManager {
    store: Arc<dyn ListingStore>,
    cache: Arc<dyn CacheStore>,
    tracker: Arc<PopularityTracker>,
    config: SearchConfig,
}

fn store_err(e: anyhow::Error) -> MarketError {
    MarketError::Store(e.to_string())
}

impl SearchManager {
    pub fn new(
        store: Arc<dyn ListingStore>,
        cache: Arc<dyn CacheStore>,
        tracker: Arc<PopularityTracker>,
        config: SearchConfig,
    ) -> Self {
        Self {
            store,
            cache,
            tracker,
            config,
        }
    }

    /// Map the requested sort key onto a store-level sort. `relevance` has no
    /// store column; rows are selected by engagement (views) as a coarse
    /// proxy and re-ranked in memory within the page.
    fn store_sort(sort_by: SortKey, order: SortOrder) -> SortSpec {
        let field = match sort_by {
            SortKey::Relevance => SortField::Views,
            SortKey::Price => SortField::Price,
            SortKey::CreatedAt => SortField::CreatedAt,
            SortKey::Views => SortField::Views,
            SortKey::Saves => SortField::Saves,
        };
        SortSpec { field, order }
    }

    async fn category_index(&self) -> Result<CategoryIndex> {
        Ok(CategoryIndex::new(
            self.store.categories().await.map_err(store_err)?,
        ))
    }

    /// Page-based search with facets on the first page.
    pub async fn search(
        &self,
        filters: &SearchFilters,
        options: &SearchOptions,
        user: Option<Uuid>,
    ) -> Result<SearchResult> {
        let key = cache::result_key(filters, options);

        match self.cache.get(&key).await {
            Ok(Some(cached)) => {
                if let Ok(result) = serde_json::from_str::<SearchResult>(&cached) {
                    debug!("search cache hit: {key}");
                    self.spawn_tracking(filters, user);
                    return Ok(result);
                }
                // Corrupt entry; recompute and overwrite below.
            }
            Ok(None) => {}
            Err(e) => warn!("cache read failed: {e}"),
        }

        let categories = self.category_index().await?;
        let predicate = filters::compile(filters, options.include_inactive, &categories);
        let sort = Self::store_sort(options.sort_by, options.sort_order);
        // Offsets are u64: page * limit can exceed u32 for large page numbers.
        let offset = (u64::from(options.page) - 1) * u64::from(options.limit);

        // Count, page and facets are independent reads over the same
        // predicate; issue them concurrently.
        let facets_wanted = options.page == 1;
        let (total, page_rows, facet_rows) = tokio::join!(
            self.store.count(&predicate),
            self.store.fetch(&predicate, &sort, options.limit, offset),
            async {
                if facets_wanted {
                    Some(self.store.facet_rows(&predicate).await)
                } else {
                    None
                }
            }
        );

        let total = total.map_err(store_err)?;
        let mut listings = page_rows.map_err(store_err)?;
        let facet_rows = facet_rows.transpose().map_err(store_err)?;

        if let Some(terms) = filters.terms() {
            ranking::rank(&mut listings, &terms);
        }

        let result = SearchResult {
            listings,
            total,
            page: options.page,
            total_pages: (total.div_ceil(options.limit as u64)) as u32,
            facets: facet_rows.map(|rows| facets::build(rows, &categories, self.config.facet_limit)),
        };

        // Fire-and-forget cache write.
        match serde_json::to_string(&result) {
            Ok(serialized) => {
                let cache = Arc::clone(&self.cache);
                let ttl = self.config.cache_ttl_seconds;
                tokio::spawn(async move {
                    if let Err(e) = cache.set(&key, &serialized, ttl).await {
                        warn!("cache write failed for {key}: {e}");
                    }
                });
            }
            Err(e) => warn!("search result not cacheable: {e}"),
        }

        self.spawn_tracking(filters, user);
        Ok(result)
    }

    /// Cursor-based (infinite scroll) search. A malformed, expired or
    /// mismatched cursor degrades to "start from beginning".
    pub async fn search_cursor(
        &self,
        search_filters: &SearchFilters,
        cursor_token: Option<&str>,
        limit: u32,
        sort_by: SortKey,
        sort_order: SortOrder,
        user: Option<Uuid>,
    ) -> Result<CursorPage> {
        let categories = self.category_index().await?;
        let base = filters::compile(search_filters, false, &categories);
        let sort = Self::store_sort(sort_by, sort_order);

        let continuation = cursor_token
            .and_then(cursor::decode)
            .filter(|c| c.sort_key == sort_by)
            .and_then(|c| c.to_predicate(sort.field, sort_order));
        let resumed = continuation.is_some();

        let predicate = match continuation {
            Some(after) => Predicate::All(vec![base, after]),
            None => base,
        };

        // Over-fetch one row to detect whether a next page exists.
        let mut rows = self
            .store
            .fetch(&predicate, &sort, limit + 1, 0)
            .await
            .map_err(store_err)?;
        let has_next_page = rows.len() as u32 > limit;
        if has_next_page {
            rows.truncate(limit as usize);
        }

        // Anchor cursors on store order, before in-page re-ranking, so
        // iterating pages visits every listing exactly once.
        let next_cursor = if has_next_page {
            rows.last()
                .map(|l| cursor::encode(sort_by, &sort_value_of(l, sort.field), l.id))
        } else {
            None
        };
        let previous_cursor = if resumed {
            rows.first()
                .map(|l| cursor::encode(sort_by, &sort_value_of(l, sort.field), l.id))
        } else {
            None
        };

        if let Some(terms) = search_filters.terms() {
            ranking::rank(&mut rows, &terms);
        }

        self.spawn_tracking(search_filters, user);

        Ok(CursorPage {
            data: rows,
            has_next_page,
            next_cursor,
            previous_cursor,
        })
    }

    /// Spawned, best-effort analytics; never awaited as a precondition for
    /// returning a response.
    fn spawn_tracking(&self, filters: &SearchFilters, user: Option<Uuid>) {
        let query = filters.query.clone().filter(|q| !q.trim().is_empty());
        let category = filters.category_id;
        if query.is_none() && category.is_none() {
            return;
        }

        let tracker = Arc::clone(&self.tracker);
        tokio::spawn(async move {
            if let Some(q) = &query {
                tracker.track_search(q).await;
                if let Some(user) = user {
                    tracker.track_user_search(user, q).await;
                }
            }
            if let Some(category_id) = category {
                tracker.track_category_view(category_id).await;
            }
        });
    }

    pub async fn suggestions(&self, prefix: &str, limit: usize) -> Vec<String> {
        self.tracker.suggestions(prefix, limit).await
    }

    pub async fn popular(&self, limit: usize) -> Vec<(String, f64)> {
        self.tracker.popular(limit).await
    }

    pub async fn trending(&self, limit: usize) -> Vec<(String, f64)> {
        self.tracker.trending(limit).await
    }

    pub async fn user_history(&self, user: Uuid) -> Vec<String> {
        self.tracker.user_history(user).await
    }

    /// Administrative cache purge.
    pub async fn purge_cache(&self, pattern: &str) -> Result<u64> {
        self.cache
            .delete_by_pattern(pattern)
            .await
            .map_err(|e| MarketError::Cache(e.to_string()))
    }
}
