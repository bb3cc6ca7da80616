//! In-memory listing store
//!
//! Interprets the predicate tree directly over a vector of listings. Used by
//! tests and the dev-mode server; the production path is the SQLite store.

use anyhow::Result;
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{sort_value_of, FacetRows, ListingStore, Predicate, SortSpec, TextField};
use crate::models::{Category, Condition, Listing, SortOrder};

#[derive(Default)]
pub struct MemoryListingStore {
    listings: Arc<RwLock<Vec<Listing>>>,
    categories: Arc<RwLock<Vec<Category>>>,
}

impl MemoryListingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_listing(&self, listing: Listing) {
        self.listings.write().await.push(listing);
    }

    pub async fn add_category(&self, category: Category) {
        self.categories.write().await.push(category);
    }

    fn matches(
        listing: &Listing,
        predicate: &Predicate,
        category_names: &HashMap<Uuid, String>,
    ) -> bool {
        match predicate {
            Predicate::All(children) => children
                .iter()
                .all(|p| Self::matches(listing, p, category_names)),
            Predicate::Any(children) => children
                .iter()
                .any(|p| Self::matches(listing, p, category_names)),
            Predicate::ActiveEq(v) => listing.is_active == *v,
            Predicate::StatusEq(s) => listing.status == *s,
            Predicate::CategoryIn(ids) => ids.contains(&listing.category_id),
            Predicate::SellerEq(id) => listing.seller_id == *id,
            Predicate::ConditionIn(conditions) => conditions.contains(&listing.condition),
            Predicate::PriceGte(v) => listing.price >= *v,
            Predicate::PriceLte(v) => listing.price <= *v,
            Predicate::CreatedGte(t) => listing.created_at >= *t,
            Predicate::CreatedLte(t) => listing.created_at <= *t,
            Predicate::CityEq(city) => listing.city.eq_ignore_ascii_case(city),
            Predicate::StateEq(state) => listing.state.eq_ignore_ascii_case(state),
            Predicate::GeoBox {
                min_lat,
                max_lat,
                min_lon,
                max_lon,
            } => match (listing.latitude, listing.longitude) {
                (Some(lat), Some(lon)) => {
                    lat >= *min_lat && lat <= *max_lat && lon >= *min_lon && lon <= *max_lon
                }
                _ => false,
            },
            Predicate::NegotiableEq(v) => listing.negotiable == *v,
            Predicate::PickupEq(v) => listing.pickup_available == *v,
            Predicate::ShippingEq(v) => listing.shipping_available == *v,
            Predicate::TextAll { field, terms } => {
                let haystack = match field {
                    TextField::Title => listing.title.to_lowercase(),
                    TextField::Description => listing.description.to_lowercase(),
                    TextField::BrandModel => format!(
                        "{} {}",
                        listing.brand.as_deref().unwrap_or(""),
                        listing.model.as_deref().unwrap_or("")
                    )
                    .to_lowercase(),
                    TextField::CategoryName => category_names
                        .get(&listing.category_id)
                        .map(|n| n.to_lowercase())
                        .unwrap_or_default(),
                };
                terms.iter().all(|t| haystack.contains(t.as_str()))
            }
            Predicate::After {
                field,
                value,
                id,
                order,
            } => {
                let own = sort_value_of(listing, *field);
                match (order, own.compare(value)) {
                    (SortOrder::Desc, Ordering::Less) => true,
                    (SortOrder::Desc, Ordering::Equal) => listing.id < *id,
                    (SortOrder::Asc, Ordering::Greater) => true,
                    (SortOrder::Asc, Ordering::Equal) => listing.id > *id,
                    _ => false,
                }
            }
        }
    }

    async fn filtered(&self, predicate: &Predicate) -> Vec<Listing> {
        let category_names: HashMap<Uuid, String> = self
            .categories
            .read()
            .await
            .iter()
            .map(|c| (c.id, c.name.clone()))
            .collect();

        self.listings
            .read()
            .await
            .iter()
            .filter(|l| Self::matches(l, predicate, &category_names))
            .cloned()
            .collect()
    }

    fn sort(listings: &mut [Listing], sort: &SortSpec) {
        listings.sort_by(|a, b| {
            let ordering = sort_value_of(a, sort.field).compare(&sort_value_of(b, sort.field));
            // Tie-break by id so pagination over equal sort values stays total.
            let ordering = ordering.then_with(|| a.id.cmp(&b.id));
            match sort.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
    }
}

#[async_trait]
impl ListingStore for MemoryListingStore {
    async fn count(&self, predicate: &Predicate) -> Result<u64> {
        Ok(self.filtered(predicate).await.len() as u64)
    }

    async fn fetch(
        &self,
        predicate: &Predicate,
        sort: &SortSpec,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Listing>> {
        let mut matching = self.filtered(predicate).await;
        Self::sort(&mut matching, sort);

        Ok(matching
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(limit as usize)
            .collect())
    }

    async fn facet_rows(&self, predicate: &Predicate) -> Result<FacetRows> {
        let matching = self.filtered(predicate).await;

        let mut categories: HashMap<Uuid, u64> = HashMap::new();
        let mut conditions: HashMap<Condition, u64> = HashMap::new();
        let mut locations: HashMap<(String, String), u64> = HashMap::new();

        for listing in &matching {
            *categories.entry(listing.category_id).or_default() += 1;
            *conditions.entry(listing.condition).or_default() += 1;
            *locations
                .entry((listing.city.clone(), listing.state.clone()))
                .or_default() += 1;
        }

        Ok(FacetRows {
            categories: categories.into_iter().collect(),
            conditions: conditions.into_iter().collect(),
            locations: locations
                .into_iter()
                .map(|((city, state), n)| (city, state, n))
                .collect(),
        })
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        Ok(self.categories.read().await.clone())
    }
}
