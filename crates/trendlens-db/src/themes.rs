//! Database operations for the `themes` snapshot table.
//!
//! One row per (week, theme), replaced on conflict so a recompute of the
//! same week is idempotent. The snapshot store owns these rows exclusively.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `themes` table.
///
/// `forecast_heat` and `confidence` are `Option` because rows written by
/// older engine versions lack them; absent values pass through as absent.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ThemeSnapshotRow {
    pub id: i64,
    pub week: String,
    pub theme: String,
    pub heat: f64,
    pub momentum: f64,
    pub forecast_heat: Option<f64>,
    pub confidence: Option<f64>,
    pub sources_json: Value,
    pub top_links_json: Value,
    pub decision: String,
    pub created_at: DateTime<Utc>,
}

/// Values for one snapshot upsert.
#[derive(Debug, Clone)]
pub struct NewThemeSnapshot {
    pub week: String,
    pub theme: String,
    pub heat: f64,
    pub momentum: f64,
    pub forecast_heat: f64,
    pub confidence: f64,
    pub sources_json: Value,
    pub top_links_json: Value,
    pub decision: String,
}

/// Upsert one scored-theme snapshot, replacing any existing row for the
/// same (week, theme).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_theme_snapshot(
    pool: &PgPool,
    snapshot: &NewThemeSnapshot,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO themes \
             (week, theme, heat, momentum, forecast_heat, confidence, \
              sources_json, top_links_json, decision) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         ON CONFLICT (week, theme) DO UPDATE SET \
             heat = EXCLUDED.heat, \
             momentum = EXCLUDED.momentum, \
             forecast_heat = EXCLUDED.forecast_heat, \
             confidence = EXCLUDED.confidence, \
             sources_json = EXCLUDED.sources_json, \
             top_links_json = EXCLUDED.top_links_json, \
             decision = EXCLUDED.decision, \
             created_at = NOW()",
    )
    .bind(&snapshot.week)
    .bind(&snapshot.theme)
    .bind(snapshot.heat)
    .bind(snapshot.momentum)
    .bind(snapshot.forecast_heat)
    .bind(snapshot.confidence)
    .bind(&snapshot.sources_json)
    .bind(&snapshot.top_links_json)
    .bind(&snapshot.decision)
    .execute(pool)
    .await?;

    Ok(())
}

/// The most recent week present in the snapshot table, or `None` when the
/// table is empty.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn latest_snapshot_week(pool: &PgPool) -> Result<Option<String>, DbError> {
    let week: Option<String> =
        sqlx::query_scalar("SELECT week FROM themes ORDER BY week DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(week)
}

/// Top-N themes for a week, ordered by heat descending.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_top_themes(
    pool: &PgPool,
    week: &str,
    limit: i64,
) -> Result<Vec<ThemeSnapshotRow>, DbError> {
    let rows = sqlx::query_as::<_, ThemeSnapshotRow>(
        "SELECT id, week, theme, heat, momentum, forecast_heat, confidence, \
                sources_json, top_links_json, decision, created_at \
         FROM themes \
         WHERE week = $1 \
         ORDER BY heat DESC, theme ASC \
         LIMIT $2",
    )
    .bind(week)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
