//! Database operations for the append-only `signals` table.
//!
//! The scoring engine only ever inserts and reads here; rows are never
//! updated or deleted.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `signals` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SignalRow {
    pub id: i64,
    pub date: NaiveDate,
    pub keyword: String,
    pub source: String,
    pub value: f64,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

/// Append one normalized signal row and return its generated id.
///
/// `source` must already be aliased to one of `search|news|social|video`;
/// the ingestor guarantees `keyword` is non-empty and lowercased.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_signal(
    pool: &PgPool,
    date: NaiveDate,
    keyword: &str,
    source: &str,
    value: f64,
    metadata: Value,
) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO signals (date, keyword, source, value, metadata) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id",
    )
    .bind(date)
    .bind(keyword)
    .bind(source)
    .bind(value)
    .bind(metadata)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Read all signals dated on or after `since`, the weekly aggregator's
/// lookback window.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_signals_since(pool: &PgPool, since: NaiveDate) -> Result<Vec<SignalRow>, DbError> {
    let rows = sqlx::query_as::<_, SignalRow>(
        "SELECT id, date, keyword, source, value, metadata, created_at \
         FROM signals \
         WHERE date >= $1 \
         ORDER BY date ASC, id ASC",
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Read the raw signal history for one theme, ascending by date — the
/// charting surface behind `getThemeOne`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_signal_history(
    pool: &PgPool,
    keyword: &str,
    since: NaiveDate,
) -> Result<Vec<SignalRow>, DbError> {
    let rows = sqlx::query_as::<_, SignalRow>(
        "SELECT id, date, keyword, source, value, metadata, created_at \
         FROM signals \
         WHERE keyword = $1 AND date >= $2 \
         ORDER BY date ASC, id ASC",
    )
    .bind(keyword)
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
