//! Domain models for the marketplace search engine
//!
//! Listings and categories are owned by the listing-management workflows;
//! this subsystem only reads them.

mod category;
mod listing;

pub use category::{Category, CategoryIndex};
pub use listing::{Condition, Listing, ListingStatus};

use serde::{Deserialize, Serialize};

/// Sort keys accepted by the search API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Relevance,
    Price,
    CreatedAt,
    Views,
    Saves,
}

impl SortKey {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "relevance" => Some(SortKey::Relevance),
            "price" => Some(SortKey::Price),
            "createdAt" => Some(SortKey::CreatedAt),
            "views" => Some(SortKey::Views),
            "saves" => Some(SortKey::Saves),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Relevance => "relevance",
            SortKey::Price => "price",
            SortKey::CreatedAt => "createdAt",
            SortKey::Views => "views",
            SortKey::Saves => "saves",
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}
