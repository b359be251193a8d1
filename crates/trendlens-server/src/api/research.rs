use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use trendlens_engine::{compute_themes, refresh_region, run_research, ResearchOutcome, ScoredTheme};

use crate::middleware::RequestId;

use super::{map_db_error, map_engine_error, ApiError, ApiResponse, AppState, ResponseMeta};

const THEMES_PREVIEW: usize = 10;
const LATEST_HITS_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub(super) struct RunRequest {
    pub region: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub window_days: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RefreshRequest {
    pub region: Option<String>,
    pub window_days: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RegionQuery {
    pub region: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct RunData {
    pub research: ResearchOutcome,
    pub themes: Vec<ScoredTheme>,
}

#[derive(Debug, Serialize)]
pub(super) struct LatestData {
    pub region: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub keywords: Value,
    pub content: Value,
    pub hits: Vec<HitItem>,
}

#[derive(Debug, Serialize)]
pub(super) struct HitItem {
    pub source: String,
    pub entity_raw: String,
    pub entity_mapped: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub ts_iso: String,
    pub volume: f64,
    pub trend: f64,
    pub fresh: f64,
    pub score: f64,
    pub url: Option<String>,
}

fn region_or_default(state: &AppState, region: Option<String>) -> String {
    region.unwrap_or_else(|| state.config.default_region.clone())
}

/// Trigger ingestion plus an immediate theme recompute, so the caller has
/// fresh content without a second request.
pub(super) async fn run(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<RunRequest>,
) -> Result<Json<ApiResponse<RunData>>, ApiError> {
    let region = region_or_default(&state, body.region);
    let window_days = body.window_days.unwrap_or(28);

    let research = run_research(
        &state.pool,
        &state.connectors,
        &region,
        &body.keywords,
        window_days,
    )
    .await
    .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;

    let mut themes = compute_themes(
        &state.pool,
        &state.locks,
        &region,
        None,
        state.config.default_lookback_days,
    )
    .await
    .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;
    themes.truncate(THEMES_PREVIEW);

    Ok(Json(ApiResponse {
        data: RunData { research, themes },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Watchlist-driven refresh for a region.
pub(super) async fn refresh(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<Vec<ScoredTheme>>>, ApiError> {
    let region = region_or_default(&state, body.region);
    let window_days = body.window_days.unwrap_or(28);

    let mut themes = refresh_region(
        &state.pool,
        &state.locks,
        &state.connectors,
        &region,
        window_days,
        state.config.default_lookback_days,
    )
    .await
    .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;
    themes.truncate(THEMES_PREVIEW);

    Ok(Json(ApiResponse {
        data: themes,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// The newest research run for a region with its top evidence hits.
pub(super) async fn latest(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<RegionQuery>,
) -> Result<Json<ApiResponse<LatestData>>, ApiError> {
    let region = region_or_default(&state, query.region);

    let Some(run) = trendlens_db::latest_research_run(&state.pool, &region)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
    else {
        return Err(ApiError::new(req_id.0, "not_found", "no research runs yet"));
    };

    let hits = trendlens_db::list_run_hits(&state.pool, run.id, LATEST_HITS_LIMIT)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .into_iter()
        .map(|hit| HitItem {
            source: hit.source,
            entity_raw: hit.entity_raw,
            entity_mapped: hit.entity_mapped,
            entity_type: hit.entity_type,
            ts_iso: hit.ts_iso,
            volume: hit.volume,
            trend: hit.trend,
            fresh: hit.fresh,
            score: hit.score,
            url: hit.url,
        })
        .collect();

    Ok(Json(ApiResponse {
        data: LatestData {
            region,
            created_at: run.created_at,
            keywords: run.keywords_json,
            content: run.content_json,
            hits,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
