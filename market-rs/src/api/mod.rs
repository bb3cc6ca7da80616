//! REST API module for market-rs
//!
//! Thin HTTP surface over the search engine: parameter parsing, boundary
//! validation and response envelopes live here, the engine itself assumes
//! validated input.

pub mod search;
pub mod server;

pub use server::ApiServer;
