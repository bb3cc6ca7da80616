//! Listing store abstraction
//!
//! The search engine never talks to a concrete database directly; it compiles
//! filters into a [`Predicate`] tree and hands it to a [`ListingStore`]. Two
//! implementations ship with the crate: an SQLite-backed store and an
//! in-memory store for tests and development.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryListingStore;
pub use sqlite::SqliteListingStore;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use uuid::Uuid;

use crate::models::{Category, Condition, Listing, ListingStatus, SortOrder};

/// Listing fields a store can sort and anchor cursors on.
///
/// `relevance` is not a store-level field; the orchestrator maps it to a
/// coarse proxy before the query reaches the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Price,
    CreatedAt,
    Views,
    Saves,
}

/// A concrete value of a sort field, used for cursor anchoring
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Float(f64),
    Int(i64),
    Time(DateTime<Utc>),
}

impl SortValue {
    pub fn compare(&self, other: &SortValue) -> Ordering {
        match (self, other) {
            (SortValue::Float(a), SortValue::Float(b)) => a.total_cmp(b),
            (SortValue::Int(a), SortValue::Int(b)) => a.cmp(b),
            (SortValue::Time(a), SortValue::Time(b)) => a.cmp(b),
            // Mismatched variants only happen on corrupt cursors; order them
            // arbitrarily but consistently.
            _ => Ordering::Equal,
        }
    }

    /// Stringified form carried inside opaque cursors.
    pub fn to_cursor_string(&self) -> String {
        match self {
            SortValue::Float(v) => v.to_string(),
            SortValue::Int(v) => v.to_string(),
            SortValue::Time(v) => v.to_rfc3339(),
        }
    }

    /// Parse the stringified form back for a given sort field.
    pub fn from_cursor_string(field: SortField, s: &str) -> Option<Self> {
        match field {
            SortField::Price => s.parse::<f64>().ok().map(SortValue::Float),
            SortField::Views | SortField::Saves => s.parse::<i64>().ok().map(SortValue::Int),
            SortField::CreatedAt => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| SortValue::Time(dt.with_timezone(&Utc))),
        }
    }
}

/// Extract the sort-field value from a listing
pub fn sort_value_of(listing: &Listing, field: SortField) -> SortValue {
    match field {
        SortField::Price => SortValue::Float(listing.price),
        SortField::CreatedAt => SortValue::Time(listing.created_at),
        SortField::Views => SortValue::Int(listing.views),
        SortField::Saves => SortValue::Int(listing.saves),
    }
}

/// Store-level sort specification
#[derive(Debug, Clone, Copy)]
pub struct SortSpec {
    pub field: SortField,
    pub order: SortOrder,
}

/// Listing field a free-text term set is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Title,
    Description,
    BrandModel,
    CategoryName,
}

/// Structured predicate tree applied against the listing store.
///
/// Branch nodes combine children; leaf nodes test one listing dimension.
/// `TextAll` requires every term to match within its field (terms are
/// lowercased by the compiler). `After` is the cursor continuation predicate:
/// a strict inequality on the sort field, tie-broken by listing id.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
    ActiveEq(bool),
    StatusEq(ListingStatus),
    CategoryIn(Vec<Uuid>),
    SellerEq(Uuid),
    ConditionIn(Vec<Condition>),
    PriceGte(f64),
    PriceLte(f64),
    CreatedGte(DateTime<Utc>),
    CreatedLte(DateTime<Utc>),
    CityEq(String),
    StateEq(String),
    GeoBox {
        min_lat: f64,
        max_lat: f64,
        min_lon: f64,
        max_lon: f64,
    },
    NegotiableEq(bool),
    PickupEq(bool),
    ShippingEq(bool),
    TextAll {
        field: TextField,
        terms: Vec<String>,
    },
    After {
        field: SortField,
        value: SortValue,
        id: Uuid,
        order: SortOrder,
    },
}

/// Raw facet group counts, before top-N shaping and name resolution
#[derive(Debug, Clone, Default)]
pub struct FacetRows {
    pub categories: Vec<(Uuid, u64)>,
    pub conditions: Vec<(Condition, u64)>,
    pub locations: Vec<(String, String, u64)>,
}

/// Queryable listing store
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Count listings matching the predicate.
    async fn count(&self, predicate: &Predicate) -> Result<u64>;

    /// Fetch a sorted window of matching listings.
    async fn fetch(
        &self,
        predicate: &Predicate,
        sort: &SortSpec,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Listing>>;

    /// Group matching listings by category, condition and location.
    async fn facet_rows(&self, predicate: &Predicate) -> Result<FacetRows>;

    /// All categories, for tree expansion and facet naming.
    async fn categories(&self) -> Result<Vec<Category>>;
}
