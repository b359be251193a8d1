//! The full scoring pipeline: windowed signal read → weekly aggregation →
//! scoring → idempotent snapshot writes.
//!
//! Runs for the same region are serialized through an explicitly
//! constructed [`RegionLocks`] handle owned by the process entry point —
//! two writers rescoring the same week concurrently would race on the
//! snapshot upserts.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use sqlx::PgPool;

use trendlens_connectors::Connectors;
use trendlens_db::NewThemeSnapshot;

use crate::aggregate::bucket_signals;
use crate::error::EngineError;
use crate::research::run_research;
use crate::score::score_series;
use crate::types::ScoredTheme;

/// Evidence links attached to a snapshot come from the last four weeks.
const TOP_LINKS_WINDOW_DAYS: i64 = 28;
const TOP_LINKS_LIMIT: i64 = 5;

/// One async mutex per region, created on demand.
#[derive(Debug, Default)]
pub struct RegionLocks {
    inner: std::sync::Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl RegionLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock for a region, waiting until any in-flight run for the
    /// same region finishes. Distinct regions never contend.
    pub async fn acquire(&self, region: &str) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().expect("region lock map poisoned");
            Arc::clone(
                map.entry(region.to_string())
                    .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
            )
        };
        lock.lock_owned().await
    }
}

/// Recompute and persist scored themes for a region.
///
/// Reads every signal inside the lookback window, builds per-theme weekly
/// series, scores them, and upserts one snapshot per (week, theme) —
/// rerunning over identical signals rewrites identical rows. `week`
/// selects a specific ISO week to score; `None` scores each theme's
/// newest week. Returns the scored themes ordered by heat descending.
///
/// # Errors
///
/// Returns [`EngineError::Db`] on any storage failure; a run must fail
/// visibly rather than silently drop a week's snapshot.
pub async fn compute_themes(
    pool: &PgPool,
    locks: &RegionLocks,
    region: &str,
    week: Option<&str>,
    lookback_days: u32,
) -> Result<Vec<ScoredTheme>, EngineError> {
    let _guard = locks.acquire(region).await;

    let since = Utc::now().date_naive() - Duration::days(i64::from(lookback_days));
    let rows = trendlens_db::list_signals_since(pool, since).await?;
    if rows.is_empty() {
        tracing::info!(region, %since, "no signals in window; nothing to score");
        return Ok(Vec::new());
    }

    let series_by_theme = bucket_signals(&rows);
    let links_since = (Utc::now() - Duration::days(TOP_LINKS_WINDOW_DAYS)).to_rfc3339();

    let mut scored = Vec::new();
    for (theme, series) in &series_by_theme {
        let Some(score) = score_series(series, week) else {
            continue;
        };

        let links =
            trendlens_db::top_links_for_theme(pool, theme, &links_since, TOP_LINKS_LIMIT).await?;

        let snapshot = NewThemeSnapshot {
            week: score.week.clone(),
            theme: theme.clone(),
            heat: score.heat,
            momentum: score.momentum,
            forecast_heat: score.forecast_heat,
            confidence: score.confidence,
            sources_json: serde_json::json!(&score.sources),
            top_links_json: serde_json::json!(&links),
            decision: score.decision.as_str().to_string(),
        };
        trendlens_db::upsert_theme_snapshot(pool, &snapshot).await?;

        scored.push(ScoredTheme {
            theme: theme.clone(),
            week: score.week,
            heat: score.heat,
            momentum: score.momentum,
            forecast_heat: score.forecast_heat,
            confidence: score.confidence,
            decision: score.decision,
            sources: score.sources,
            links,
        });
    }

    scored.sort_by(|a, b| {
        b.heat
            .partial_cmp(&a.heat)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.theme.cmp(&b.theme))
    });

    tracing::info!(region, themes = scored.len(), "theme snapshots written");
    Ok(scored)
}

/// Watchlist-driven refresh: rerun research for the region's keywords
/// (if any), then recompute its themes.
///
/// # Errors
///
/// Returns [`EngineError::Db`] on storage failures.
pub async fn refresh_region(
    pool: &PgPool,
    locks: &RegionLocks,
    connectors: &Connectors,
    region: &str,
    window_days: u32,
    lookback_days: u32,
) -> Result<Vec<ScoredTheme>, EngineError> {
    let keywords = trendlens_db::get_watchlist(pool, region).await?;
    if keywords.is_empty() {
        tracing::info!(region, "empty watchlist; skipping research fetch");
    } else {
        run_research(pool, connectors, region, &keywords, window_days).await?;
    }
    compute_themes(pool, locks, region, None, lookback_days).await
}
