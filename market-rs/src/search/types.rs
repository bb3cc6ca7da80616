//! Search request and response types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Condition, Listing, ListingStatus, SortKey, SortOrder};

/// User-supplied filter set.
///
/// All present fields are ANDed together; the multi-value fields
/// (`conditions`, `category_ids`) are ORed within themselves.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchFilters {
    pub query: Option<String>,
    pub category_id: Option<Uuid>,
    pub category_ids: Option<Vec<Uuid>>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_km: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub condition: Option<Condition>,
    pub conditions: Option<Vec<Condition>>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub seller_id: Option<Uuid>,
    pub negotiable: Option<bool>,
    pub pickup_available: Option<bool>,
    pub shipping_available: Option<bool>,
    /// Explicit status override (admin moderation views)
    pub status: Option<ListingStatus>,
}

impl SearchFilters {
    /// Lowercased whitespace-split terms of the free-text query, if any.
    pub fn terms(&self) -> Option<Vec<String>> {
        let query = self.query.as_deref()?.trim();
        if query.is_empty() {
            return None;
        }
        Some(query.split_whitespace().map(|t| t.to_lowercase()).collect())
    }
}

/// Page-based search options. Validated at the API boundary; the orchestrator
/// assumes page >= 1 and 1 <= limit <= 100.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOptions {
    pub page: u32,
    pub limit: u32,
    pub sort_by: SortKey,
    pub sort_order: SortOrder,
    /// Admin-only: include listings that are not active/live
    pub include_inactive: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            sort_by: SortKey::CreatedAt,
            sort_order: SortOrder::Desc,
            include_inactive: false,
        }
    }
}

/// One facet bucket for a category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryFacet {
    pub id: Uuid,
    pub name: String,
    pub count: u64,
}

/// One facet bucket for a condition value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionFacet {
    pub condition: Condition,
    pub count: u64,
}

/// One facet bucket for a (city, state) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationFacet {
    pub city: String,
    pub state: String,
    pub count: u64,
}

/// Facets over the whole filtered corpus (not just the current page)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facets {
    pub categories: Vec<CategoryFacet>,
    pub conditions: Vec<ConditionFacet>,
    pub locations: Vec<LocationFacet>,
}

/// Result of a page-based search
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub listings: Vec<Listing>,
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facets: Option<Facets>,
}

/// Result of a cursor-based (infinite scroll) search
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorPage {
    pub data: Vec<Listing>,
    pub has_next_page: bool,
    pub next_cursor: Option<String>,
    pub previous_cursor: Option<String>,
}
