//! Database operations for the `entity_scores` table (uploaded-dataset mode).

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `entity_scores` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EntityScoreRow {
    pub id: i64,
    pub entity: String,
    pub entity_type: String,
    pub week: String,
    pub region: String,
    pub posts: i64,
    pub eng_sum: i64,
    pub eng_rate_median: f64,
    pub score: f64,
    pub growth: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Values for one entity-score upsert.
#[derive(Debug, Clone)]
pub struct NewEntityScore {
    pub entity: String,
    pub entity_type: String,
    pub week: String,
    pub region: String,
    pub posts: i64,
    pub eng_sum: i64,
    pub eng_rate_median: f64,
    pub score: f64,
    pub growth: Option<f64>,
}

/// Upsert one entity score, replacing any existing row for the same
/// (entity, type, week, region).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_entity_score(pool: &PgPool, score: &NewEntityScore) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO entity_scores \
             (entity, entity_type, week, region, posts, eng_sum, \
              eng_rate_median, score, growth) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         ON CONFLICT (entity, entity_type, week, region) DO UPDATE SET \
             posts = EXCLUDED.posts, \
             eng_sum = EXCLUDED.eng_sum, \
             eng_rate_median = EXCLUDED.eng_rate_median, \
             score = EXCLUDED.score, \
             growth = EXCLUDED.growth",
    )
    .bind(&score.entity)
    .bind(&score.entity_type)
    .bind(&score.week)
    .bind(&score.region)
    .bind(score.posts)
    .bind(score.eng_sum)
    .bind(score.eng_rate_median)
    .bind(score.score)
    .bind(score.growth)
    .execute(pool)
    .await?;

    Ok(())
}

/// All stored weeks for one (entity, type, region) key — the normalizer's
/// history baseline.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_entity_history(
    pool: &PgPool,
    entity: &str,
    entity_type: &str,
    region: &str,
) -> Result<Vec<EntityScoreRow>, DbError> {
    let rows = sqlx::query_as::<_, EntityScoreRow>(
        "SELECT id, entity, entity_type, week, region, posts, eng_sum, \
                eng_rate_median, score, growth, created_at \
         FROM entity_scores \
         WHERE entity = $1 AND entity_type = $2 AND region = $3 \
         ORDER BY week ASC",
    )
    .bind(entity)
    .bind(entity_type)
    .bind(region)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Top entities of one type for a region, ordered by score descending,
/// optionally restricted to a single week.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_top_entities(
    pool: &PgPool,
    entity_type: &str,
    region: &str,
    week: Option<&str>,
    limit: i64,
) -> Result<Vec<EntityScoreRow>, DbError> {
    let rows = match week {
        Some(week) => {
            sqlx::query_as::<_, EntityScoreRow>(
                "SELECT id, entity, entity_type, week, region, posts, eng_sum, \
                        eng_rate_median, score, growth, created_at \
                 FROM entity_scores \
                 WHERE entity_type = $1 AND region = $2 AND week = $3 \
                 ORDER BY score DESC \
                 LIMIT $4",
            )
            .bind(entity_type)
            .bind(region)
            .bind(week)
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, EntityScoreRow>(
                "SELECT id, entity, entity_type, week, region, posts, eng_sum, \
                        eng_rate_median, score, growth, created_at \
                 FROM entity_scores \
                 WHERE entity_type = $1 AND region = $2 \
                 ORDER BY score DESC \
                 LIMIT $3",
            )
            .bind(entity_type)
            .bind(region)
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows)
}

/// The last `weeks` rows for one entity, returned ascending by week for
/// charting.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_entity_timeseries(
    pool: &PgPool,
    entity: &str,
    entity_type: &str,
    region: &str,
    weeks: i64,
) -> Result<Vec<EntityScoreRow>, DbError> {
    let mut rows = sqlx::query_as::<_, EntityScoreRow>(
        "SELECT id, entity, entity_type, week, region, posts, eng_sum, \
                eng_rate_median, score, growth, created_at \
         FROM entity_scores \
         WHERE entity = $1 AND entity_type = $2 AND region = $3 \
         ORDER BY week DESC \
         LIMIT $4",
    )
    .bind(entity)
    .bind(entity_type)
    .bind(region)
    .bind(weeks)
    .fetch_all(pool)
    .await?;

    rows.reverse();
    Ok(rows)
}
