//! Integration tests for cursor-based (infinite scroll) search

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{Duration, Utc};
use market_rs::analytics::{MemoryCounterStore, PopularityTracker};
use market_rs::cache::MemoryCache;
use market_rs::config::SearchConfig;
use market_rs::models::{Condition, Listing, ListingStatus, SortKey, SortOrder};
use market_rs::search::{SearchFilters, SearchManager};
use market_rs::store::MemoryListingStore;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

fn listing(title: &str, minutes_ago: i64) -> Listing {
    Listing {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: String::new(),
        brand: None,
        model: None,
        category_id: Uuid::new_v4(),
        condition: Condition::Good,
        price: 100.0,
        city: "Austin".to_string(),
        state: "TX".to_string(),
        latitude: None,
        longitude: None,
        negotiable: false,
        pickup_available: false,
        shipping_available: false,
        status: ListingStatus::Live,
        is_active: true,
        views: 0,
        saves: 0,
        seller_id: Uuid::new_v4(),
        created_at: Utc::now() - Duration::minutes(minutes_ago),
        updated_at: Utc::now(),
    }
}

async fn manager_with(listings: Vec<Listing>) -> Arc<SearchManager> {
    let store = MemoryListingStore::new();
    for l in listings {
        store.add_listing(l).await;
    }
    Arc::new(SearchManager::new(
        Arc::new(store),
        Arc::new(MemoryCache::new()),
        Arc::new(PopularityTracker::new(Arc::new(MemoryCounterStore::new()))),
        SearchConfig {
            cache_ttl_seconds: 300,
            facet_limit: 10,
        },
    ))
}

#[tokio::test]
async fn test_scroll_visits_every_listing_exactly_once() {
    // 23 listings, some sharing a created_at, paged 5 at a time.
    let mut listings = Vec::new();
    for i in 0..23 {
        // Integer division gives pairs with identical timestamps.
        listings.push(listing(&format!("item {i}"), (i / 2) as i64));
    }
    let expected: HashSet<Uuid> = listings.iter().map(|l| l.id).collect();
    let manager = manager_with(listings).await;

    let mut seen = HashSet::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0;

    loop {
        let page = manager
            .search_cursor(
                &SearchFilters::default(),
                cursor.as_deref(),
                5,
                SortKey::CreatedAt,
                SortOrder::Desc,
                None,
            )
            .await
            .unwrap();

        pages += 1;
        for l in &page.data {
            assert!(seen.insert(l.id), "listing {} visited twice", l.id);
        }

        if !page.has_next_page {
            assert!(page.next_cursor.is_none());
            break;
        }
        assert!(page.next_cursor.is_some());
        cursor = page.next_cursor;
    }

    assert_eq!(pages, 5);
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn test_full_page_without_more_rows_has_no_next() {
    let manager = manager_with((0..5).map(|i| listing(&format!("item {i}"), i)).collect()).await;

    let page = manager
        .search_cursor(
            &SearchFilters::default(),
            None,
            5,
            SortKey::CreatedAt,
            SortOrder::Desc,
            None,
        )
        .await
        .unwrap();

    assert_eq!(page.data.len(), 5);
    assert!(!page.has_next_page);
    assert!(page.next_cursor.is_none());
    assert!(page.previous_cursor.is_none());
}

#[tokio::test]
async fn test_expired_cursor_starts_from_beginning() {
    let manager = manager_with((0..8).map(|i| listing(&format!("item {i}"), i)).collect()).await;

    let fresh = manager
        .search_cursor(
            &SearchFilters::default(),
            None,
            4,
            SortKey::CreatedAt,
            SortOrder::Desc,
            None,
        )
        .await
        .unwrap();

    // Hand-build a token issued 25 hours ago.
    let stale_payload = format!(
        "{{\"v\":1,\"s\":\"createdAt\",\"lv\":\"{}\",\"li\":\"{}\",\"ts\":{}}}",
        (Utc::now() - Duration::hours(1)).to_rfc3339(),
        Uuid::new_v4(),
        (Utc::now() - Duration::hours(25)).timestamp()
    );
    let stale_token = URL_SAFE_NO_PAD.encode(stale_payload.as_bytes());

    let resumed = manager
        .search_cursor(
            &SearchFilters::default(),
            Some(&stale_token),
            4,
            SortKey::CreatedAt,
            SortOrder::Desc,
            None,
        )
        .await
        .unwrap();

    let fresh_ids: Vec<Uuid> = fresh.data.iter().map(|l| l.id).collect();
    let resumed_ids: Vec<Uuid> = resumed.data.iter().map(|l| l.id).collect();
    assert_eq!(fresh_ids, resumed_ids);
    assert!(resumed.previous_cursor.is_none());
}

#[tokio::test]
async fn test_sort_key_mismatch_resets_to_first_page() {
    let manager = manager_with((0..8).map(|i| listing(&format!("item {i}"), i)).collect()).await;

    let first = manager
        .search_cursor(
            &SearchFilters::default(),
            None,
            4,
            SortKey::Price,
            SortOrder::Desc,
            None,
        )
        .await
        .unwrap();
    let price_cursor = first.next_cursor.unwrap();

    // Same token replayed against a createdAt sort must be ignored.
    let reset = manager
        .search_cursor(
            &SearchFilters::default(),
            Some(&price_cursor),
            4,
            SortKey::CreatedAt,
            SortOrder::Desc,
            None,
        )
        .await
        .unwrap();

    let fresh = manager
        .search_cursor(
            &SearchFilters::default(),
            None,
            4,
            SortKey::CreatedAt,
            SortOrder::Desc,
            None,
        )
        .await
        .unwrap();

    let reset_ids: Vec<Uuid> = reset.data.iter().map(|l| l.id).collect();
    let fresh_ids: Vec<Uuid> = fresh.data.iter().map(|l| l.id).collect();
    assert_eq!(reset_ids, fresh_ids);
    assert!(reset.previous_cursor.is_none());
}

#[tokio::test]
async fn test_resumed_page_carries_previous_cursor() {
    let manager = manager_with((0..8).map(|i| listing(&format!("item {i}"), i)).collect()).await;

    let first = manager
        .search_cursor(
            &SearchFilters::default(),
            None,
            4,
            SortKey::CreatedAt,
            SortOrder::Desc,
            None,
        )
        .await
        .unwrap();

    let second = manager
        .search_cursor(
            &SearchFilters::default(),
            first.next_cursor.as_deref(),
            4,
            SortKey::CreatedAt,
            SortOrder::Desc,
            None,
        )
        .await
        .unwrap();

    assert!(second.previous_cursor.is_some());
    assert!(!second.has_next_page);
}
