//! HTTP API server

use axum::extract::State;
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::Result;
use crate::search::SearchManager;

use super::search as search_api;

/// Shared handler state
pub struct AppState {
    pub search: Arc<SearchManager>,
}

pub struct ApiServer {
    listen_addr: String,
    state: Arc<AppState>,
}

impl ApiServer {
    pub fn new(listen_addr: String, search: Arc<SearchManager>) -> Self {
        Self {
            listen_addr,
            state: Arc::new(AppState { search }),
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health))
            .route("/search", get(search_api::search))
            .route("/search/scroll", get(search_api::search_scroll))
            .route("/search/suggestions", get(search_api::suggestions))
            .route("/search/popular", get(search_api::popular))
            .route("/search/trending", get(search_api::trending))
            .route("/search/cache", delete(search_api::purge_cache))
            .with_state(Arc::clone(&self.state))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
    }

    pub async fn run(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.listen_addr).await?;
        info!("API server listening on {}", self.listen_addr);
        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

async fn health(State(_state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "success": true, "data": { "status": "ok" } }))
}
