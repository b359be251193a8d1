use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct ThemeItem {
    pub theme: String,
    pub week: String,
    pub heat: f64,
    pub momentum: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast_heat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub decision: String,
    pub sources: Value,
    pub links: Value,
}

impl From<trendlens_db::ThemeSnapshotRow> for ThemeItem {
    fn from(row: trendlens_db::ThemeSnapshotRow) -> Self {
        Self {
            theme: row.theme,
            week: row.week,
            heat: row.heat,
            momentum: row.momentum,
            forecast_heat: row.forecast_heat,
            confidence: row.confidence,
            decision: row.decision,
            sources: row.sources_json,
            links: row.top_links_json,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct TopThemesQuery {
    pub week: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ThemeHistoryQuery {
    pub weeks: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct SignalItem {
    pub date: NaiveDate,
    pub source: String,
    pub value: f64,
}

/// Top themes for a week (defaulting to the most recent week present),
/// ordered by heat descending.
pub(super) async fn top(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<TopThemesQuery>,
) -> Result<Json<ApiResponse<Vec<ThemeItem>>>, ApiError> {
    let week = match query.week {
        Some(week) => Some(week),
        None => trendlens_db::latest_snapshot_week(&state.pool)
            .await
            .map_err(|e| map_db_error(req_id.0.clone(), &e))?,
    };

    let data = match week {
        Some(week) => {
            trendlens_db::list_top_themes(&state.pool, &week, normalize_limit(query.limit))
                .await
                .map_err(|e| map_db_error(req_id.0.clone(), &e))?
                .into_iter()
                .map(ThemeItem::from)
                .collect()
        }
        None => Vec::new(),
    };

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Raw signal history for one theme over the last N weeks, for charting.
pub(super) async fn history(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(theme): Path<String>,
    Query(query): Query<ThemeHistoryQuery>,
) -> Result<Json<ApiResponse<Vec<SignalItem>>>, ApiError> {
    let weeks = query.weeks.unwrap_or(8).clamp(1, 52);
    let since = Utc::now().date_naive() - Duration::weeks(weeks);
    let theme = theme.trim().to_lowercase();

    let data = trendlens_db::list_signal_history(&state.pool, &theme, since)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .into_iter()
        .map(|row| SignalItem {
            date: row.date,
            source: row.source,
            value: row.value,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
