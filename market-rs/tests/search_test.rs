//! Integration tests for page-based search

use chrono::{Duration, Utc};
use market_rs::analytics::{MemoryCounterStore, PopularityTracker};
use market_rs::cache::MemoryCache;
use market_rs::config::SearchConfig;
use market_rs::models::{Category, Condition, Listing, ListingStatus, SortKey, SortOrder};
use market_rs::search::{SearchFilters, SearchOptions, SearchManager};
use market_rs::store::MemoryListingStore;
use std::sync::Arc;
use uuid::Uuid;

fn listing(title: &str, price: f64, status: ListingStatus) -> Listing {
    Listing {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: String::new(),
        brand: None,
        model: None,
        category_id: Uuid::new_v4(),
        condition: Condition::Good,
        price,
        city: "Austin".to_string(),
        state: "TX".to_string(),
        latitude: None,
        longitude: None,
        negotiable: false,
        pickup_available: false,
        shipping_available: false,
        status,
        is_active: status == ListingStatus::Live,
        views: 0,
        saves: 0,
        seller_id: Uuid::new_v4(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

async fn manager_with(listings: Vec<Listing>, categories: Vec<Category>) -> Arc<SearchManager> {
    let store = MemoryListingStore::new();
    for l in listings {
        store.add_listing(l).await;
    }
    for c in categories {
        store.add_category(c).await;
    }

    let counters = Arc::new(MemoryCounterStore::new());
    Arc::new(SearchManager::new(
        Arc::new(store),
        Arc::new(MemoryCache::new()),
        Arc::new(PopularityTracker::new(counters)),
        SearchConfig {
            cache_ttl_seconds: 300,
            facet_limit: 10,
        },
    ))
}

fn relevance_options() -> SearchOptions {
    SearchOptions {
        page: 1,
        limit: 20,
        sort_by: SortKey::Relevance,
        sort_order: SortOrder::Desc,
        include_inactive: false,
    }
}

#[tokio::test]
async fn test_price_range_and_status_scenario() {
    // One LIVE mixer at 250000 and one SOLD mixer at 200000: only the live
    // one may come back.
    let live = listing("Industrial Mixer", 250000.0, ListingStatus::Live);
    let live_id = live.id;
    let sold = listing("Industrial Mixer", 200000.0, ListingStatus::Sold);

    let manager = manager_with(vec![live, sold], vec![]).await;

    let filters = SearchFilters {
        query: Some("mixer".to_string()),
        min_price: Some(100000.0),
        max_price: Some(300000.0),
        ..Default::default()
    };

    let result = manager
        .search(&filters, &relevance_options(), None)
        .await
        .unwrap();

    assert_eq!(result.total, 1);
    assert_eq!(result.listings.len(), 1);
    assert_eq!(result.listings[0].id, live_id);
}

#[tokio::test]
async fn test_only_live_listings_unless_inactive_included() {
    let manager = manager_with(
        vec![
            listing("a", 10.0, ListingStatus::Live),
            listing("b", 10.0, ListingStatus::Sold),
            listing("c", 10.0, ListingStatus::Draft),
            listing("d", 10.0, ListingStatus::Live),
        ],
        vec![],
    )
    .await;

    let result = manager
        .search(&SearchFilters::default(), &relevance_options(), None)
        .await
        .unwrap();
    assert_eq!(result.total, 2);
    assert!(result
        .listings
        .iter()
        .all(|l| l.status == ListingStatus::Live && l.is_active));

    let admin_options = SearchOptions {
        include_inactive: true,
        ..relevance_options()
    };
    let all = manager
        .search(&SearchFilters::default(), &admin_options, None)
        .await
        .unwrap();
    assert_eq!(all.total, 4);
}

#[tokio::test]
async fn test_page_number_far_past_the_corpus_returns_empty_page() {
    let manager = manager_with(vec![listing("only", 10.0, ListingStatus::Live)], vec![]).await;

    // (page - 1) * limit exceeds u32 here; the offset must not wrap.
    let options = SearchOptions {
        page: 50_000_000,
        limit: 100,
        sort_by: SortKey::CreatedAt,
        sort_order: SortOrder::Desc,
        include_inactive: false,
    };
    let result = manager
        .search(&SearchFilters::default(), &options, None)
        .await
        .unwrap();

    assert_eq!(result.total, 1);
    assert!(result.listings.is_empty());
    assert_eq!(result.page, 50_000_000);
    assert_eq!(result.total_pages, 1);
}

#[tokio::test]
async fn test_category_filter_is_transitive() {
    let root = Category {
        id: Uuid::new_v4(),
        name: "Machinery".to_string(),
        parent_id: None,
    };
    let child = Category {
        id: Uuid::new_v4(),
        name: "Mixers".to_string(),
        parent_id: Some(root.id),
    };
    let grandchild = Category {
        id: Uuid::new_v4(),
        name: "Planetary Mixers".to_string(),
        parent_id: Some(child.id),
    };
    let unrelated = Category {
        id: Uuid::new_v4(),
        name: "Forklifts".to_string(),
        parent_id: None,
    };

    let mut in_root = listing("root item", 10.0, ListingStatus::Live);
    in_root.category_id = root.id;
    let mut in_grandchild = listing("leaf item", 10.0, ListingStatus::Live);
    in_grandchild.category_id = grandchild.id;
    let mut elsewhere = listing("forklift", 10.0, ListingStatus::Live);
    elsewhere.category_id = unrelated.id;

    let manager = manager_with(
        vec![in_root, in_grandchild, elsewhere],
        vec![root.clone(), child, grandchild, unrelated],
    )
    .await;

    let filters = SearchFilters {
        category_id: Some(root.id),
        ..Default::default()
    };
    let result = manager
        .search(&filters, &relevance_options(), None)
        .await
        .unwrap();

    assert_eq!(result.total, 2);
    assert!(result.listings.iter().all(|l| l.title != "forklift"));
}

#[tokio::test]
async fn test_facets_only_on_first_page() {
    let mut listings = Vec::new();
    for i in 0..25 {
        let mut l = listing(&format!("item {i}"), 10.0, ListingStatus::Live);
        l.created_at = Utc::now() - Duration::minutes(i);
        listings.push(l);
    }
    let manager = manager_with(listings, vec![]).await;

    let options = SearchOptions {
        page: 1,
        limit: 10,
        sort_by: SortKey::CreatedAt,
        sort_order: SortOrder::Desc,
        include_inactive: false,
    };
    let first = manager
        .search(&SearchFilters::default(), &options, None)
        .await
        .unwrap();
    assert!(first.facets.is_some());
    assert_eq!(first.total_pages, 3);

    let second = manager
        .search(
            &SearchFilters::default(),
            &SearchOptions { page: 2, ..options },
            None,
        )
        .await
        .unwrap();
    assert!(second.facets.is_none());
    assert_eq!(second.listings.len(), 10);
}

#[tokio::test]
async fn test_facets_cover_whole_corpus_not_just_page() {
    let mut listings = Vec::new();
    for i in 0..15 {
        let mut l = listing(&format!("item {i}"), 10.0, ListingStatus::Live);
        l.condition = if i % 3 == 0 {
            Condition::New
        } else {
            Condition::Good
        };
        listings.push(l);
    }
    let manager = manager_with(listings, vec![]).await;

    let options = SearchOptions {
        page: 1,
        limit: 5,
        sort_by: SortKey::CreatedAt,
        sort_order: SortOrder::Desc,
        include_inactive: false,
    };
    let result = manager
        .search(&SearchFilters::default(), &options, None)
        .await
        .unwrap();

    let facets = result.facets.unwrap();
    let total_in_conditions: u64 = facets.conditions.iter().map(|c| c.count).sum();
    assert_eq!(total_in_conditions, 15);
}

#[tokio::test]
async fn test_repeated_search_returns_identical_results() {
    let manager = manager_with(
        vec![
            listing("Industrial Mixer", 100.0, ListingStatus::Live),
            listing("Dough Mixer", 200.0, ListingStatus::Live),
        ],
        vec![],
    )
    .await;

    let filters = SearchFilters {
        query: Some("mixer".to_string()),
        ..Default::default()
    };

    let first = manager
        .search(&filters, &relevance_options(), None)
        .await
        .unwrap();
    let second = manager
        .search(&filters, &relevance_options(), None)
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_string(&first.listings).unwrap(),
        serde_json::to_string(&second.listings).unwrap()
    );
    assert_eq!(
        serde_json::to_string(&first.facets).unwrap(),
        serde_json::to_string(&second.facets).unwrap()
    );
}

#[tokio::test]
async fn test_ranking_prefers_title_matches() {
    let mut title_match = listing("Industrial Mixer", 10.0, ListingStatus::Live);
    title_match.views = 5;
    let mut description_match = listing("Restaurant Oven", 10.0, ListingStatus::Live);
    description_match.description = "comes with a mixer attachment".to_string();
    description_match.views = 5;
    let title_id = title_match.id;

    let manager = manager_with(vec![title_match, description_match], vec![]).await;

    let filters = SearchFilters {
        query: Some("mixer".to_string()),
        ..Default::default()
    };
    let result = manager
        .search(&filters, &relevance_options(), None)
        .await
        .unwrap();

    assert_eq!(result.listings[0].id, title_id);
}

#[tokio::test]
async fn test_text_query_matches_category_name() {
    let category = Category {
        id: Uuid::new_v4(),
        name: "Concrete Mixers".to_string(),
        parent_id: None,
    };
    let mut l = listing("Heavy duty unit", 10.0, ListingStatus::Live);
    l.category_id = category.id;

    let manager = manager_with(vec![l], vec![category]).await;

    let filters = SearchFilters {
        query: Some("concrete".to_string()),
        ..Default::default()
    };
    let result = manager
        .search(&filters, &relevance_options(), None)
        .await
        .unwrap();
    assert_eq!(result.total, 1);
}
