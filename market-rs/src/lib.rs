//! market-rs: Search & discovery engine for a used-equipment marketplace
//!
//! Faceted, rankable, cache-backed search over a mutable listing corpus.
//!
//! # Features
//!
//! - **Filter compiler**: structured predicates with recursive category-tree
//!   expansion and graceful handling of malformed inputs
//! - **Two pagination modes**: offset pages and opaque-cursor infinite scroll
//! - **Relevance ranking**: weighted substring scoring with engagement boost
//! - **Facets**: category/condition/location counts over the filtered corpus
//! - **Read-through result cache** with TTL and pattern purge
//! - **Popularity analytics**: decayed trending scores, suggestions, history
//!
//! # Modules
//!
//! - [`config`]: Configuration management
//! - [`error`]: Error types and handling
//! - [`models`]: Listing and category domain types
//! - [`search`]: The search engine and its orchestrator
//! - [`store`]: Listing store trait plus SQLite and in-memory backends
//! - [`cache`]: Result cache
//! - [`analytics`]: Popularity and trending counters
//! - [`api`]: HTTP surface

pub mod analytics;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod search;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use error::{MarketError, Result};
pub use search::SearchManager;
