use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Physical condition of a listed item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Condition {
    New,
    LikeNew,
    Good,
    Fair,
    Poor,
}

impl Condition {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NEW" => Some(Condition::New),
            "LIKE_NEW" => Some(Condition::LikeNew),
            "GOOD" => Some(Condition::Good),
            "FAIR" => Some(Condition::Fair),
            "POOR" => Some(Condition::Poor),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::New => "NEW",
            Condition::LikeNew => "LIKE_NEW",
            Condition::Good => "GOOD",
            Condition::Fair => "FAIR",
            Condition::Poor => "POOR",
        }
    }
}

/// Lifecycle status of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListingStatus {
    Draft,
    Pending,
    Live,
    Sold,
    Expired,
    Rejected,
}

impl ListingStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DRAFT" => Some(ListingStatus::Draft),
            "PENDING" => Some(ListingStatus::Pending),
            "LIVE" => Some(ListingStatus::Live),
            "SOLD" => Some(ListingStatus::Sold),
            "EXPIRED" => Some(ListingStatus::Expired),
            "REJECTED" => Some(ListingStatus::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Draft => "DRAFT",
            ListingStatus::Pending => "PENDING",
            ListingStatus::Live => "LIVE",
            ListingStatus::Sold => "SOLD",
            ListingStatus::Expired => "EXPIRED",
            ListingStatus::Rejected => "REJECTED",
        }
    }
}

/// A marketplace listing, as read from the listing store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub category_id: Uuid,
    pub condition: Condition,
    pub price: f64,
    pub city: String,
    pub state: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub negotiable: bool,
    pub pickup_available: bool,
    pub shipping_available: bool,
    pub status: ListingStatus,
    pub is_active: bool,
    pub views: i64,
    pub saves: i64,
    pub seller_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
