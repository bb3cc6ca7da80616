//! Facet aggregation
//!
//! Shapes the raw group counts returned by the store into the facet lists the
//! API exposes: top-N categories with resolved names, every condition value
//! present, and top-N (city, state) pairs. Facets are computed once per
//! search session, on the first page only.

use crate::models::CategoryIndex;
use crate::store::FacetRows;

use super::types::{CategoryFacet, ConditionFacet, Facets, LocationFacet};

pub fn build(rows: FacetRows, categories: &CategoryIndex, top_n: usize) -> Facets {
    let mut category_facets: Vec<CategoryFacet> = rows
        .categories
        .into_iter()
        .map(|(id, count)| CategoryFacet {
            id,
            name: categories
                .name_of(id)
                .unwrap_or("Unknown")
                .to_string(),
            count,
        })
        .collect();
    category_facets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    category_facets.truncate(top_n);

    let mut condition_facets: Vec<ConditionFacet> = rows
        .conditions
        .into_iter()
        .map(|(condition, count)| ConditionFacet { condition, count })
        .collect();
    condition_facets.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.condition.as_str().cmp(b.condition.as_str()))
    });

    let mut location_facets: Vec<LocationFacet> = rows
        .locations
        .into_iter()
        .map(|(city, state, count)| LocationFacet { city, state, count })
        .collect();
    location_facets.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| (&a.city, &a.state).cmp(&(&b.city, &b.state)))
    });
    location_facets.truncate(top_n);

    Facets {
        categories: category_facets,
        conditions: condition_facets,
        locations: location_facets,
    }
}
