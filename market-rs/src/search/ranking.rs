//! Relevance ranking
//!
//! Weighted substring scoring, applied in memory to the page already fetched
//! from the store. The store selects rows by a coarse proxy sort; this module
//! only reorders within the page. Scores are a best-effort heuristic, not an
//! IR model: no tokenization, no stemming.

use crate::models::Listing;

const TITLE_MATCH: f64 = 10.0;
const TITLE_PREFIX: f64 = 5.0;
const BRAND_MODEL_MATCH: f64 = 8.0;
const DESCRIPTION_MATCH: f64 = 3.0;

const VIEW_WEIGHT: f64 = 0.01;
const SAVE_WEIGHT: f64 = 0.1;

/// Score a single listing against lowercased query terms.
pub fn score(listing: &Listing, terms: &[String]) -> f64 {
    let title = listing.title.to_lowercase();
    let description = listing.description.to_lowercase();
    let brand_model = format!(
        "{} {}",
        listing.brand.as_deref().unwrap_or(""),
        listing.model.as_deref().unwrap_or("")
    )
    .to_lowercase();

    let mut total = 0.0;
    for term in terms {
        let term = term.as_str();
        if title.contains(term) {
            total += TITLE_MATCH;
        }
        // Additive with the substring bonus: a prefix hit earns both.
        if title.starts_with(term) {
            total += TITLE_PREFIX;
        }
        if brand_model.contains(term) {
            total += BRAND_MODEL_MATCH;
        }
        if description.contains(term) {
            total += DESCRIPTION_MATCH;
        }
    }

    total + listing.views as f64 * VIEW_WEIGHT + listing.saves as f64 * SAVE_WEIGHT
}

/// Reorder a fetched page by descending score. The sort is stable, so ties
/// keep the store's order.
pub fn rank(listings: &mut [Listing], terms: &[String]) {
    let mut scored: Vec<(f64, Listing)> = listings
        .iter()
        .cloned()
        .map(|l| (score(&l, terms), l))
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    for (slot, (_, listing)) in listings.iter_mut().zip(scored) {
        *slot = listing;
    }
}
