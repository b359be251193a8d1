//! Database operations for the per-region `watchlist` table.

use serde_json::Value;
use sqlx::PgPool;

use crate::DbError;

/// Lowercase, trim, drop empties, and deduplicate while preserving first
/// occurrence order.
#[must_use]
pub fn normalize_keywords(keywords: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for keyword in keywords {
        let k = keyword.trim().to_lowercase();
        if k.is_empty() {
            continue;
        }
        if seen.insert(k.clone()) {
            out.push(k);
        }
    }
    out
}

/// The keyword list for one region; empty when the region has no watchlist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_watchlist(pool: &PgPool, region: &str) -> Result<Vec<String>, DbError> {
    let row: Option<Value> =
        sqlx::query_scalar("SELECT keywords_json FROM watchlist WHERE region = $1")
            .bind(region)
            .fetch_optional(pool)
            .await?;

    let keywords = row
        .and_then(|v| serde_json::from_value::<Vec<String>>(v).ok())
        .unwrap_or_default();
    Ok(keywords)
}

/// Replace the full keyword set for a region.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn replace_watchlist(
    pool: &PgPool,
    region: &str,
    keywords: &[String],
) -> Result<Vec<String>, DbError> {
    let normalized = normalize_keywords(keywords);
    let json = serde_json::json!(normalized);

    sqlx::query(
        "INSERT INTO watchlist (region, keywords_json, updated_at) \
         VALUES ($1, $2, NOW()) \
         ON CONFLICT (region) DO UPDATE SET \
             keywords_json = EXCLUDED.keywords_json, \
             updated_at = NOW()",
    )
    .bind(region)
    .bind(json)
    .execute(pool)
    .await?;

    Ok(normalized)
}

/// Add and remove keywords in one step, returning the updated set.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a query fails.
pub async fn update_watchlist(
    pool: &PgPool,
    region: &str,
    add: &[String],
    remove: &[String],
) -> Result<Vec<String>, DbError> {
    let mut current = get_watchlist(pool, region).await?;
    current.extend(normalize_keywords(add));

    let removals: std::collections::HashSet<String> =
        normalize_keywords(remove).into_iter().collect();
    current.retain(|k| !removals.contains(k));

    replace_watchlist(pool, region, &current).await
}

/// Empty the keyword set for a region (the row itself is kept).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn clear_watchlist(pool: &PgPool, region: &str) -> Result<(), DbError> {
    replace_watchlist(pool, region, &[]).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_lowercases_trims_and_dedups() {
        let raw = vec![
            "  Trenchcoat ".to_string(),
            "LOAFERS".to_string(),
            "trenchcoat".to_string(),
            "".to_string(),
            "   ".to_string(),
        ];
        assert_eq!(normalize_keywords(&raw), vec!["trenchcoat", "loafers"]);
    }

    #[test]
    fn normalize_preserves_first_occurrence_order() {
        let raw = vec![
            "b".to_string(),
            "a".to_string(),
            "B".to_string(),
            "c".to_string(),
        ];
        assert_eq!(normalize_keywords(&raw), vec!["b", "a", "c"]);
    }
}
