//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! weekly watchlist refresh.

use std::sync::Arc;

use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use trendlens_connectors::Connectors;
use trendlens_core::AppConfig;
use trendlens_engine::{refresh_region, RegionLocks};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process — dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    connectors: Arc<Connectors>,
    locks: Arc<RegionLocks>,
    config: Arc<AppConfig>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_weekly_refresh_job(&scheduler, pool, connectors, locks, config).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the weekly theme refresh.
///
/// Runs every Monday at 03:10 UTC (`0 10 3 * * MON`): each region with a
/// watchlist gets a fresh research run and a theme recompute, so the new
/// ISO week starts with populated snapshots.
async fn register_weekly_refresh_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    connectors: Arc<Connectors>,
    locks: Arc<RegionLocks>,
    config: Arc<AppConfig>,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);

    let job = Job::new_async("0 10 3 * * MON", move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let connectors = Arc::clone(&connectors);
        let locks = Arc::clone(&locks);
        let config = Arc::clone(&config);

        Box::pin(async move {
            tracing::info!("scheduler: starting weekly theme refresh");
            run_weekly_refresh(&pool, &connectors, &locks, &config).await;
            tracing::info!("scheduler: weekly theme refresh complete");
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

/// Refresh every region that has a watchlist. Region failures are logged
/// and do not stop the remaining regions.
async fn run_weekly_refresh(
    pool: &PgPool,
    connectors: &Connectors,
    locks: &RegionLocks,
    config: &AppConfig,
) {
    let regions = match list_watchlist_regions(pool).await {
        Ok(regions) => regions,
        Err(e) => {
            tracing::error!(error = %e, "scheduler: failed to list watchlist regions");
            return;
        }
    };

    if regions.is_empty() {
        tracing::info!("scheduler: no watchlists configured; skipping refresh");
        return;
    }

    for region in &regions {
        match refresh_region(
            pool,
            locks,
            connectors,
            region,
            28,
            config.default_lookback_days,
        )
        .await
        {
            Ok(themes) => {
                tracing::info!(region = %region, themes = themes.len(), "scheduler: region refreshed");
            }
            Err(e) => {
                tracing::error!(region = %region, error = %e, "scheduler: region refresh failed");
            }
        }
    }
}

async fn list_watchlist_regions(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT region FROM watchlist ORDER BY region")
        .fetch_all(pool)
        .await
}
