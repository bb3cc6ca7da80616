//! Search analytics
//!
//! Approximate popularity counters behind a narrow scored-set interface.
//! Everything in here is UX-grade: eventually consistent, best-effort, never
//! consulted for billing or authorization.

mod counters;
mod popularity;

pub use counters::{CounterStore, MemoryCounterStore};
pub use popularity::{normalize_query, PopularityConfig, PopularityTracker};
