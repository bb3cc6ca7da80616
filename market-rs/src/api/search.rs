//! Search API endpoints
//!
//! Query-parameter parsing follows the error taxonomy: pagination, sort and
//! enum values are validated strictly (400 on anything unknown), while
//! numeric filter values parse leniently and fall back to "not specified".

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Condition, ListingStatus, SortKey, SortOrder};
use crate::search::{SearchFilters, SearchOptions};

use super::server::AppState;

const MAX_PAGE_SIZE: u32 = 100;
const DEFAULT_PAGE_SIZE: u32 = 20;
const DEFAULT_SUGGESTION_LIMIT: usize = 10;
const MAX_LIST_LIMIT: usize = 50;

/// Error envelope: `{ "error": { "code", "message" } }`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn validation(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "VALIDATION_ERROR",
            message: message.into(),
        }
    }

    fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "INTERNAL_ERROR",
            message: "Search is temporarily unavailable".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "error": { "code": self.code, "message": self.message } });
        (self.status, Json(body)).into_response()
    }
}

type ApiResult = Result<Json<Value>, ApiError>;

fn envelope(data: impl serde::Serialize) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

/// Raw query parameters. Everything arrives as strings; typed parsing happens
/// in the helpers below so malformed filter values can degrade gracefully.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchParams {
    pub q: Option<String>,
    pub category_id: Option<String>,
    pub category_ids: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub radius_km: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub condition: Option<String>,
    pub conditions: Option<String>,
    pub created_after: Option<String>,
    pub created_before: Option<String>,
    pub seller_id: Option<String>,
    pub negotiable: Option<String>,
    pub pickup_available: Option<String>,
    pub shipping_available: Option<String>,
    pub status: Option<String>,
    pub include_inactive: Option<String>,
    pub user_id: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub cursor: Option<String>,
}

fn lenient_f64(raw: &Option<String>) -> Option<f64> {
    raw.as_deref()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn lenient_uuid(raw: &Option<String>) -> Option<Uuid> {
    raw.as_deref().and_then(|s| Uuid::parse_str(s.trim()).ok())
}

fn lenient_bool(raw: &Option<String>) -> Option<bool> {
    match raw.as_deref().map(|s| s.trim()) {
        Some("true") | Some("1") => Some(true),
        Some("false") | Some("0") => Some(false),
        _ => None,
    }
}

fn lenient_date(raw: &Option<String>) -> Option<DateTime<Utc>> {
    raw.as_deref().and_then(|s| {
        DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    })
}

fn strict_condition(raw: &str) -> Result<Condition, ApiError> {
    Condition::parse(raw.trim())
        .ok_or_else(|| ApiError::validation(format!("unknown condition: {raw}")))
}

fn parse_filters(params: &SearchParams) -> Result<SearchFilters, ApiError> {
    let condition = params
        .condition
        .as_deref()
        .map(strict_condition)
        .transpose()?;

    let conditions = params
        .conditions
        .as_deref()
        .map(|list| {
            list.split(',')
                .filter(|s| !s.trim().is_empty())
                .map(strict_condition)
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?
        .filter(|list: &Vec<Condition>| !list.is_empty());

    let status = params
        .status
        .as_deref()
        .map(|raw| {
            ListingStatus::parse(raw.trim())
                .ok_or_else(|| ApiError::validation(format!("unknown status: {raw}")))
        })
        .transpose()?;

    let category_ids = params.category_ids.as_deref().map(|list| {
        list.split(',')
            .filter_map(|s| Uuid::parse_str(s.trim()).ok())
            .collect::<Vec<_>>()
    });

    Ok(SearchFilters {
        query: params.q.clone().filter(|q| !q.trim().is_empty()),
        category_id: lenient_uuid(&params.category_id),
        category_ids: category_ids.filter(|ids| !ids.is_empty()),
        city: params.city.clone(),
        state: params.state.clone(),
        latitude: lenient_f64(&params.latitude),
        longitude: lenient_f64(&params.longitude),
        radius_km: lenient_f64(&params.radius_km),
        min_price: lenient_f64(&params.min_price),
        max_price: lenient_f64(&params.max_price),
        condition,
        conditions,
        created_after: lenient_date(&params.created_after),
        created_before: lenient_date(&params.created_before),
        seller_id: lenient_uuid(&params.seller_id),
        negotiable: lenient_bool(&params.negotiable),
        pickup_available: lenient_bool(&params.pickup_available),
        shipping_available: lenient_bool(&params.shipping_available),
        status,
    })
}

fn parse_page(params: &SearchParams) -> Result<u32, ApiError> {
    match params.page.as_deref() {
        None => Ok(1),
        Some(raw) => match raw.trim().parse::<u32>() {
            Ok(page) if page >= 1 => Ok(page),
            _ => Err(ApiError::validation("page must be a positive integer")),
        },
    }
}

fn parse_limit(params: &SearchParams) -> Result<u32, ApiError> {
    match params.limit.as_deref() {
        None => Ok(DEFAULT_PAGE_SIZE),
        Some(raw) => match raw.trim().parse::<u32>() {
            Ok(limit) if (1..=MAX_PAGE_SIZE).contains(&limit) => Ok(limit),
            _ => Err(ApiError::validation(format!(
                "limit must be between 1 and {MAX_PAGE_SIZE}"
            ))),
        },
    }
}

fn parse_sort(params: &SearchParams) -> Result<(SortKey, SortOrder), ApiError> {
    let sort_by = match params.sort_by.as_deref() {
        None => SortKey::CreatedAt,
        Some(raw) => SortKey::parse(raw.trim())
            .ok_or_else(|| ApiError::validation(format!("unknown sortBy: {raw}")))?,
    };
    let sort_order = match params.sort_order.as_deref() {
        None => SortOrder::Desc,
        Some(raw) => SortOrder::parse(raw.trim())
            .ok_or_else(|| ApiError::validation(format!("unknown sortOrder: {raw}")))?,
    };
    Ok((sort_by, sort_order))
}

/// `GET /search` — offset pagination, facets on page 1
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> ApiResult {
    let filters = parse_filters(&params)?;
    let (sort_by, sort_order) = parse_sort(&params)?;
    let options = SearchOptions {
        page: parse_page(&params)?,
        limit: parse_limit(&params)?,
        sort_by,
        sort_order,
        include_inactive: lenient_bool(&params.include_inactive).unwrap_or(false),
    };
    let user = lenient_uuid(&params.user_id);

    match state.search.search(&filters, &options, user).await {
        Ok(result) => Ok(envelope(result)),
        Err(e) => {
            tracing::error!("search failed: {e}");
            Err(ApiError::internal())
        }
    }
}

/// `GET /search/scroll` — cursor pagination
pub async fn search_scroll(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> ApiResult {
    let filters = parse_filters(&params)?;
    let (sort_by, sort_order) = parse_sort(&params)?;
    let limit = parse_limit(&params)?;
    let user = lenient_uuid(&params.user_id);

    match state
        .search
        .search_cursor(
            &filters,
            params.cursor.as_deref(),
            limit,
            sort_by,
            sort_order,
            user,
        )
        .await
    {
        Ok(page) => Ok(envelope(page)),
        Err(e) => {
            tracing::error!("cursor search failed: {e}");
            Err(ApiError::internal())
        }
    }
}

fn parse_list_limit(raw: &Option<String>) -> Result<usize, ApiError> {
    match raw.as_deref() {
        None => Ok(DEFAULT_SUGGESTION_LIMIT),
        Some(raw) => match raw.trim().parse::<usize>() {
            Ok(limit) if (1..=MAX_LIST_LIMIT).contains(&limit) => Ok(limit),
            _ => Err(ApiError::validation(format!(
                "limit must be between 1 and {MAX_LIST_LIMIT}"
            ))),
        },
    }
}

/// `GET /search/suggestions?q=`
pub async fn suggestions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> ApiResult {
    let prefix = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::validation("q is required"))?;
    let limit = parse_list_limit(&params.limit)?;

    let suggestions = state.search.suggestions(prefix, limit).await;
    Ok(envelope(suggestions))
}

/// `GET /search/popular`
pub async fn popular(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> ApiResult {
    let limit = parse_list_limit(&params.limit)?;
    let entries: Vec<Value> = state
        .search
        .popular(limit)
        .await
        .into_iter()
        .map(|(query, count)| json!({ "query": query, "count": count }))
        .collect();
    Ok(envelope(entries))
}

/// `GET /search/trending`
pub async fn trending(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> ApiResult {
    let limit = parse_list_limit(&params.limit)?;
    let entries: Vec<Value> = state
        .search
        .trending(limit)
        .await
        .into_iter()
        .map(|(query, score)| json!({ "query": query, "score": score }))
        .collect();
    Ok(envelope(entries))
}

#[derive(Debug, Deserialize)]
pub struct PurgeParams {
    pub pattern: Option<String>,
}

/// `DELETE /search/cache?pattern=` — administrative purge
pub async fn purge_cache(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PurgeParams>,
) -> ApiResult {
    let pattern = params.pattern.as_deref().unwrap_or("search:*");

    match state.search.purge_cache(pattern).await {
        Ok(removed) => Ok(envelope(json!({ "removed": removed }))),
        Err(e) => {
            tracing::error!("cache purge failed: {e}");
            Err(ApiError::internal())
        }
    }
}
