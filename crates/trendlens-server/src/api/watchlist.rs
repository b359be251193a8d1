use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct RegionQuery {
    pub region: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ReplaceRequest {
    pub region: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PatchRequest {
    pub region: Option<String>,
    #[serde(default)]
    pub add: Vec<String>,
    #[serde(default)]
    pub remove: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct WatchlistData {
    pub region: String,
    pub keywords: Vec<String>,
}

fn region_or_default(state: &AppState, region: Option<String>) -> String {
    region.unwrap_or_else(|| state.config.default_region.clone())
}

pub(super) async fn get_keywords(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<RegionQuery>,
) -> Result<Json<ApiResponse<WatchlistData>>, ApiError> {
    let region = region_or_default(&state, query.region);
    let keywords = trendlens_db::get_watchlist(&state.pool, &region)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: WatchlistData { region, keywords },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn replace(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ReplaceRequest>,
) -> Result<Json<ApiResponse<WatchlistData>>, ApiError> {
    let region = region_or_default(&state, body.region);
    let keywords = trendlens_db::replace_watchlist(&state.pool, &region, &body.keywords)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: WatchlistData { region, keywords },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn patch(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<PatchRequest>,
) -> Result<Json<ApiResponse<WatchlistData>>, ApiError> {
    let region = region_or_default(&state, body.region);
    let keywords = trendlens_db::update_watchlist(&state.pool, &region, &body.add, &body.remove)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: WatchlistData { region, keywords },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn clear(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<RegionQuery>,
) -> Result<Json<ApiResponse<WatchlistData>>, ApiError> {
    let region = region_or_default(&state, query.region);
    trendlens_db::clear_watchlist(&state.pool, &region)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: WatchlistData {
            region,
            keywords: Vec::new(),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
