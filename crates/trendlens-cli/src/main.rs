use clap::{Parser, Subcommand};

use trendlens_connectors::Connectors;
use trendlens_engine::{compute_themes, refresh_region, run_research, RegionLocks};

#[derive(Debug, Parser)]
#[command(name = "trendlens-cli")]
#[command(about = "Trendlens command line interface")]
struct Cli {
    /// Region to operate on; defaults to the configured region.
    #[arg(long, global = true)]
    region: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run pending database migrations.
    Migrate,
    /// Fetch all connectors for the given keywords and score the results.
    Research {
        /// Comma-separated keywords; empty uses the seed set.
        #[arg(long, value_delimiter = ',')]
        keywords: Vec<String>,
        #[arg(long, default_value_t = 28)]
        window_days: u32,
    },
    /// Re-run research from the region watchlist, then recompute themes.
    Refresh {
        #[arg(long, default_value_t = 28)]
        window_days: u32,
    },
    /// Recompute and print scored themes for the lookback window.
    Themes {
        /// ISO week to score, e.g. 2024-W17; defaults to each theme's
        /// newest week.
        #[arg(long)]
        week: Option<String>,
        #[arg(long, default_value_t = 56)]
        lookback_days: u32,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Print the raw signal history for one theme.
    Theme {
        name: String,
        #[arg(long, default_value_t = 8)]
        weeks: i64,
    },
    /// Manage the per-region keyword watchlist.
    Watchlist {
        #[command(subcommand)]
        action: WatchlistAction,
    },
}

#[derive(Debug, Subcommand)]
enum WatchlistAction {
    /// Print the current keyword set.
    Get,
    /// Replace the keyword set.
    Set { keywords: Vec<String> },
    /// Add keywords to the set.
    Add { keywords: Vec<String> },
    /// Remove keywords from the set.
    Remove { keywords: Vec<String> },
    /// Empty the keyword set.
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = trendlens_core::load_app_config_from_env()?;
    let region = cli.region.unwrap_or_else(|| config.default_region.clone());

    let pool_config = trendlens_db::PoolConfig::from_app_config(&config);
    let pool = trendlens_db::connect_pool(&config.database_url, pool_config).await?;

    match cli.command {
        Commands::Migrate => {
            trendlens_db::run_migrations(&pool).await?;
            println!("migrations applied");
        }
        Commands::Research {
            keywords,
            window_days,
        } => {
            trendlens_db::run_migrations(&pool).await?;
            let connectors = Connectors::new(
                config.http_timeout_secs,
                &config.http_user_agent,
                config.youtube_api_key.clone(),
            )?;
            let outcome =
                run_research(&pool, &connectors, &region, &keywords, window_days).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Commands::Refresh { window_days } => {
            trendlens_db::run_migrations(&pool).await?;
            let connectors = Connectors::new(
                config.http_timeout_secs,
                &config.http_user_agent,
                config.youtube_api_key.clone(),
            )?;
            let locks = RegionLocks::new();
            let themes = refresh_region(
                &pool,
                &locks,
                &connectors,
                &region,
                window_days,
                config.default_lookback_days,
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&themes)?);
        }
        Commands::Themes {
            week,
            lookback_days,
            limit,
        } => {
            let locks = RegionLocks::new();
            let mut themes =
                compute_themes(&pool, &locks, &region, week.as_deref(), lookback_days).await?;
            themes.truncate(limit);
            println!("{}", serde_json::to_string_pretty(&themes)?);
        }
        Commands::Theme { name, weeks } => {
            let since = chrono::Utc::now().date_naive() - chrono::Duration::weeks(weeks);
            let rows =
                trendlens_db::list_signal_history(&pool, &name.trim().to_lowercase(), since)
                    .await?;
            for row in rows {
                println!("{}\t{}\t{}", row.date, row.source, row.value);
            }
        }
        Commands::Watchlist { action } => {
            let keywords = match action {
                WatchlistAction::Get => trendlens_db::get_watchlist(&pool, &region).await?,
                WatchlistAction::Set { keywords } => {
                    trendlens_db::replace_watchlist(&pool, &region, &keywords).await?
                }
                WatchlistAction::Add { keywords } => {
                    trendlens_db::update_watchlist(&pool, &region, &keywords, &[]).await?
                }
                WatchlistAction::Remove { keywords } => {
                    trendlens_db::update_watchlist(&pool, &region, &[], &keywords).await?
                }
                WatchlistAction::Clear => {
                    trendlens_db::clear_watchlist(&pool, &region).await?;
                    Vec::new()
                }
            };
            println!("{}", serde_json::to_string_pretty(&keywords)?);
        }
    }

    Ok(())
}
