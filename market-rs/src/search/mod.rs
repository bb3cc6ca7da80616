//! Search & discovery engine
//!
//! Faceted, rankable, cache-backed search over the listing store, with both
//! offset and cursor pagination. The orchestrator lives in [`manager`]; the
//! other modules are its leaves.

pub mod cursor;
pub mod facets;
pub mod filters;
pub mod manager;
pub mod ranking;
pub mod types;

pub use manager::SearchManager;
pub use types::{
    CategoryFacet, ConditionFacet, CursorPage, Facets, LocationFacet, SearchFilters,
    SearchOptions, SearchResult,
};
