//! Database operations for `research_runs` and `research_hits`.
//!
//! A research run records which keywords were fetched and the synthesized
//! outcome; its hits are the mapped, lightly-scored evidence rows that back
//! citations and theme top-links.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `research_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ResearchRunRow {
    pub id: i64,
    pub region: String,
    pub keywords_json: Value,
    pub content_json: Value,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// A row from the `research_hits` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ResearchHitRow {
    pub id: i64,
    pub run_id: i64,
    pub source: String,
    pub entity_raw: String,
    pub entity_mapped: String,
    pub entity_type: String,
    pub ts_iso: String,
    pub volume: f64,
    pub trend: f64,
    pub fresh: f64,
    pub score: f64,
    pub url: Option<String>,
    pub metadata: Value,
}

/// Values for one research-hit insert.
#[derive(Debug, Clone)]
pub struct NewResearchHit {
    pub source: String,
    pub entity_raw: String,
    pub entity_mapped: String,
    pub entity_type: String,
    pub ts_iso: String,
    pub volume: f64,
    pub trend: f64,
    pub fresh: f64,
    pub score: f64,
    pub url: Option<String>,
    pub metadata: Value,
}

/// Insert a research run and return its generated id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_research_run(
    pool: &PgPool,
    region: &str,
    keywords_json: Value,
    content_json: Value,
    status: &str,
) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO research_runs (region, keywords_json, content_json, status) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id",
    )
    .bind(region)
    .bind(keywords_json)
    .bind(content_json)
    .bind(status)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Insert one evidence hit for a run.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_research_hit(
    pool: &PgPool,
    run_id: i64,
    hit: &NewResearchHit,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO research_hits \
             (run_id, source, entity_raw, entity_mapped, entity_type, ts_iso, \
              volume, trend, fresh, score, url, metadata) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
    )
    .bind(run_id)
    .bind(&hit.source)
    .bind(&hit.entity_raw)
    .bind(&hit.entity_mapped)
    .bind(&hit.entity_type)
    .bind(&hit.ts_iso)
    .bind(hit.volume)
    .bind(hit.trend)
    .bind(hit.fresh)
    .bind(hit.score)
    .bind(&hit.url)
    .bind(&hit.metadata)
    .execute(pool)
    .await?;

    Ok(())
}

/// The newest research run for a region, or `None` when there are none yet.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn latest_research_run(
    pool: &PgPool,
    region: &str,
) -> Result<Option<ResearchRunRow>, DbError> {
    let row = sqlx::query_as::<_, ResearchRunRow>(
        "SELECT id, region, keywords_json, content_json, status, created_at \
         FROM research_runs \
         WHERE region = $1 \
         ORDER BY created_at DESC, id DESC \
         LIMIT 1",
    )
    .bind(region)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// The hits of one run, highest-scored first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_run_hits(
    pool: &PgPool,
    run_id: i64,
    limit: i64,
) -> Result<Vec<ResearchHitRow>, DbError> {
    let rows = sqlx::query_as::<_, ResearchHitRow>(
        "SELECT id, run_id, source, entity_raw, entity_mapped, entity_type, \
                ts_iso, volume, trend, fresh, score, url, metadata \
         FROM research_hits \
         WHERE run_id = $1 \
         ORDER BY score DESC, id ASC \
         LIMIT $2",
    )
    .bind(run_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Highest-scoring recent evidence URLs for one theme, at most `limit`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn top_links_for_theme(
    pool: &PgPool,
    theme: &str,
    since_iso: &str,
    limit: i64,
) -> Result<Vec<String>, DbError> {
    let urls: Vec<String> = sqlx::query_scalar(
        "SELECT url FROM research_hits \
         WHERE entity_mapped = $1 AND url IS NOT NULL AND ts_iso >= $2 \
         ORDER BY score DESC \
         LIMIT $3",
    )
    .bind(theme)
    .bind(since_iso)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(urls)
}
