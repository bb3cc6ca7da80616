//! Filter compiler
//!
//! Turns a [`SearchFilters`] set into a [`Predicate`] tree for the listing
//! store. Malformed numeric inputs degrade to "no filter on that dimension";
//! the compiler never fails.

use crate::models::{CategoryIndex, ListingStatus};
use crate::store::{Predicate, TextField};

use super::types::SearchFilters;

/// Degrees of latitude/longitude per kilometer, using 1 degree ~ 111 km.
/// Known approximation: this yields a bounding box, not a great-circle
/// radius, and ignores longitude compression at high latitudes. Kept
/// deliberately; clients depend on the loose behavior.
const DEGREES_PER_KM: f64 = 1.0 / 111.0;

/// Compile a filter set into a predicate tree.
///
/// When `include_inactive` is false the compiler forces `is_active = true`
/// and `status = LIVE`, unless the filters explicitly override status.
pub fn compile(
    filters: &SearchFilters,
    include_inactive: bool,
    categories: &CategoryIndex,
) -> Predicate {
    let mut clauses = Vec::new();

    match (include_inactive, filters.status) {
        (_, Some(status)) => clauses.push(Predicate::StatusEq(status)),
        (false, None) => {
            clauses.push(Predicate::ActiveEq(true));
            clauses.push(Predicate::StatusEq(ListingStatus::Live));
        }
        (true, None) => {}
    }

    if let Some(terms) = filters.terms() {
        clauses.push(Predicate::Any(vec![
            Predicate::TextAll {
                field: TextField::Title,
                terms: terms.clone(),
            },
            Predicate::TextAll {
                field: TextField::Description,
                terms: terms.clone(),
            },
            Predicate::TextAll {
                field: TextField::BrandModel,
                terms: terms.clone(),
            },
            Predicate::TextAll {
                field: TextField::CategoryName,
                terms,
            },
        ]));
    }

    // Explicit id list wins over single-id tree expansion.
    if let Some(ids) = filters.category_ids.as_ref().filter(|ids| !ids.is_empty()) {
        clauses.push(Predicate::CategoryIn(ids.clone()));
    } else if let Some(id) = filters.category_id {
        clauses.push(Predicate::CategoryIn(categories.with_descendants(id)));
    }

    let mut conditions = Vec::new();
    if let Some(list) = &filters.conditions {
        conditions.extend(list.iter().copied());
    } else if let Some(condition) = filters.condition {
        conditions.push(condition);
    }
    if !conditions.is_empty() {
        clauses.push(Predicate::ConditionIn(conditions));
    }

    if let Some(v) = finite(filters.min_price) {
        clauses.push(Predicate::PriceGte(v));
    }
    if let Some(v) = finite(filters.max_price) {
        clauses.push(Predicate::PriceLte(v));
    }

    if let Some(t) = filters.created_after {
        clauses.push(Predicate::CreatedGte(t));
    }
    if let Some(t) = filters.created_before {
        clauses.push(Predicate::CreatedLte(t));
    }

    if let Some(id) = filters.seller_id {
        clauses.push(Predicate::SellerEq(id));
    }

    match (
        finite(filters.latitude),
        finite(filters.longitude),
        finite(filters.radius_km),
    ) {
        (Some(lat), Some(lon), Some(radius)) => {
            let delta = radius * DEGREES_PER_KM;
            clauses.push(Predicate::GeoBox {
                min_lat: lat - delta,
                max_lat: lat + delta,
                min_lon: lon - delta,
                max_lon: lon + delta,
            });
        }
        _ => {
            if let Some(city) = filters.city.as_ref().filter(|c| !c.trim().is_empty()) {
                clauses.push(Predicate::CityEq(city.trim().to_string()));
            }
            if let Some(state) = filters.state.as_ref().filter(|s| !s.trim().is_empty()) {
                clauses.push(Predicate::StateEq(state.trim().to_string()));
            }
        }
    }

    if let Some(v) = filters.negotiable {
        clauses.push(Predicate::NegotiableEq(v));
    }
    if let Some(v) = filters.pickup_available {
        clauses.push(Predicate::PickupEq(v));
    }
    if let Some(v) = filters.shipping_available {
        clauses.push(Predicate::ShippingEq(v));
    }

    Predicate::All(clauses)
}

/// NaN/infinite inputs are treated as "not specified".
fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}
