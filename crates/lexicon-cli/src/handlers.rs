use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use lexicon_types::NormalizedEntry;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::index::{LexiconIndex, SearchParams};

const DEFAULT_PAGE_SIZE: usize = 50;

#[derive(Clone)]
pub struct AppState {
    pub index: Arc<LexiconIndex>,
    pub max_page_size: usize,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub prefix: String,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

/// An entry as consumers read it: the first variant is authoritative.
#[derive(Serialize)]
pub struct EntryResponse {
    headword: String,
    primary: String,
    alternates: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    dialect_tags: BTreeMap<String, String>,
    line: usize,
}

impl From<&NormalizedEntry> for EntryResponse {
    fn from(entry: &NormalizedEntry) -> Self {
        Self {
            headword: entry.headword.clone(),
            primary: entry.primary().to_string(),
            alternates: entry.alternates().to_vec(),
            dialect_tags: entry.dialect_tags.clone(),
            line: entry.line,
        }
    }
}

#[derive(Serialize)]
pub struct SearchResponse {
    prefix: String,
    page: usize,
    page_size: usize,
    total: usize,
    has_more: bool,
    items: Vec<String>,
}

#[derive(Serialize)]
pub struct StatsResponse {
    total_entries: usize,
    total_variant_count: usize,
    average_variants_per_entry: f64,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/entries/{headword}", get(entry))
        .route("/v1/search", get(search))
        .route("/v1/stats", get(stats))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    "ok"
}

async fn entry(
    State(state): State<AppState>,
    Path(headword): Path<String>,
) -> Result<Json<EntryResponse>, ApiError> {
    state
        .index
        .lookup(&headword)
        .map(|entry| Json(EntryResponse::from(entry)))
        .ok_or_else(|| ApiError::NotFound(format!("no entry for {:?}", headword.trim())))
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let prefix = params.prefix.trim();
    if prefix.is_empty() {
        return Err(ApiError::bad_request("prefix is required"));
    }

    let page = params.page.unwrap_or(1);
    if page == 0 {
        return Err(ApiError::bad_request("page must be >= 1"));
    }
    let mut page_size = params.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    if page_size == 0 {
        return Err(ApiError::bad_request("page_size must be >= 1"));
    }
    if page_size > state.max_page_size {
        page_size = state.max_page_size;
    }

    let result = state.index.search(SearchParams {
        prefix,
        page,
        page_size,
    });

    Ok(Json(SearchResponse {
        prefix: prefix.to_string(),
        page,
        page_size,
        total: result.total,
        has_more: result.has_more,
        items: result.items,
    }))
}

async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.index.statistics();
    Json(StatsResponse {
        total_entries: stats.total_entries,
        total_variant_count: stats.total_variant_count,
        average_variants_per_entry: stats.average_variants_per_entry,
    })
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
}

impl ApiError {
    fn bad_request<T: Into<String>>(msg: T) -> Self {
        ApiError::BadRequest(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        };
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}
