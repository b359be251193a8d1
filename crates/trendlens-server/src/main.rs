mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use trendlens_connectors::Connectors;
use trendlens_engine::RegionLocks;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(trendlens_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = trendlens_db::PoolConfig::from_app_config(&config);
    let pool = trendlens_db::connect_pool(&config.database_url, pool_config).await?;
    trendlens_db::run_migrations(&pool).await?;

    let connectors = Arc::new(Connectors::new(
        config.http_timeout_secs,
        &config.http_user_agent,
        config.youtube_api_key.clone(),
    )?);
    let locks = Arc::new(RegionLocks::new());

    let _scheduler = scheduler::build_scheduler(
        pool.clone(),
        Arc::clone(&connectors),
        Arc::clone(&locks),
        Arc::clone(&config),
    )
    .await?;

    let app = build_app(AppState {
        pool,
        connectors,
        locks,
        config: Arc::clone(&config),
    });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "trendlens-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
