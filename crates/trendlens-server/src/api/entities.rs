use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use trendlens_engine::entity_score::{score_post_batch, PostRecord};

use crate::middleware::RequestId;

use super::{map_db_error, map_engine_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct ScoreBatchRequest {
    #[serde(default)]
    pub posts: Vec<PostRecord>,
}

#[derive(Debug, Serialize)]
pub(super) struct ScoreBatchData {
    pub imported: usize,
    pub scored_keys: usize,
}

#[derive(Debug, Deserialize)]
pub(super) struct TopEntitiesQuery {
    #[serde(rename = "type")]
    pub entity_type: Option<String>,
    pub region: Option<String>,
    pub week: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TimeseriesQuery {
    #[serde(rename = "type")]
    pub entity_type: Option<String>,
    pub region: Option<String>,
    pub weeks: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct EntityScoreItem {
    pub entity: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub week: String,
    pub region: String,
    pub posts: i64,
    pub eng_sum: i64,
    pub eng_rate_median: f64,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub growth: Option<f64>,
}

impl From<trendlens_db::EntityScoreRow> for EntityScoreItem {
    fn from(row: trendlens_db::EntityScoreRow) -> Self {
        Self {
            entity: row.entity,
            entity_type: row.entity_type,
            week: row.week,
            region: row.region,
            posts: row.posts,
            eng_sum: row.eng_sum,
            eng_rate_median: row.eng_rate_median,
            score: row.score,
            growth: row.growth,
        }
    }
}

fn region_or_default(state: &AppState, region: Option<String>) -> String {
    region.unwrap_or_else(|| state.config.default_region.clone())
}

/// Score an uploaded social-post batch (parsed client-side into JSON).
pub(super) async fn score_batch(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ScoreBatchRequest>,
) -> Result<Json<ApiResponse<ScoreBatchData>>, ApiError> {
    let written = score_post_batch(&state.pool, &body.posts)
        .await
        .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: ScoreBatchData {
            imported: body.posts.len(),
            scored_keys: written.len(),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn top(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<TopEntitiesQuery>,
) -> Result<Json<ApiResponse<Vec<EntityScoreItem>>>, ApiError> {
    let entity_type = query.entity_type.unwrap_or_else(|| "hashtag".to_string());
    let region = region_or_default(&state, query.region);

    let data = trendlens_db::list_top_entities(
        &state.pool,
        &entity_type,
        &region,
        query.week.as_deref(),
        normalize_limit(query.limit),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?
    .into_iter()
    .map(EntityScoreItem::from)
    .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn timeseries(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(entity): Path<String>,
    Query(query): Query<TimeseriesQuery>,
) -> Result<Json<ApiResponse<Vec<EntityScoreItem>>>, ApiError> {
    let entity_type = query.entity_type.unwrap_or_else(|| "hashtag".to_string());
    let region = region_or_default(&state, query.region);
    let weeks = query.weeks.unwrap_or(8).clamp(1, 52);

    let data = trendlens_db::list_entity_timeseries(
        &state.pool,
        &entity.trim().to_lowercase(),
        &entity_type,
        &region,
        weeks,
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?
    .into_iter()
    .map(EntityScoreItem::from)
    .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
