//! Offline unit tests for trendlens-db pool configuration and row types.
//! These tests do not require a live database connection.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use trendlens_core::{AppConfig, Environment};
use trendlens_db::{NewThemeSnapshot, PoolConfig, SignalRow, ThemeSnapshotRow};

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 4000),
        log_level: "info".to_string(),
        default_region: "Nordics".to_string(),
        default_lookback_days: 56,
        youtube_api_key: None,
        http_timeout_secs: 20,
        http_user_agent: "ua".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

/// Compile-time smoke test: confirm row types keep the fields the engine
/// relies on. No database required.
#[test]
fn signal_row_has_expected_fields() {
    use chrono::{NaiveDate, Utc};

    let row = SignalRow {
        id: 1,
        date: NaiveDate::from_ymd_opt(2024, 4, 25).expect("date"),
        keyword: "trenchcoat".to_string(),
        source: "search".to_string(),
        value: 42.0,
        metadata: serde_json::json!({}),
        created_at: Utc::now(),
    };

    assert_eq!(row.keyword, "trenchcoat");
    assert_eq!(row.source, "search");
    assert!((row.value - 42.0).abs() < f64::EPSILON);
}

#[test]
fn theme_snapshot_row_tolerates_missing_forecast_fields() {
    use chrono::Utc;

    // Rows written by older engine versions carry no forecast/confidence;
    // they must read back as absent, not as defaults.
    let row = ThemeSnapshotRow {
        id: 1,
        week: "2024-W17".to_string(),
        theme: "trenchcoat".to_string(),
        heat: 81.5,
        momentum: 0.6,
        forecast_heat: None,
        confidence: None,
        sources_json: serde_json::json!([]),
        top_links_json: serde_json::json!([]),
        decision: "ACT".to_string(),
        created_at: Utc::now(),
    };

    assert!(row.forecast_heat.is_none());
    assert!(row.confidence.is_none());
}

#[test]
fn new_theme_snapshot_is_cloneable_for_retry_paths() {
    let snapshot = NewThemeSnapshot {
        week: "2024-W17".to_string(),
        theme: "trenchcoat".to_string(),
        heat: 81.5,
        momentum: 0.6,
        forecast_heat: 88.0,
        confidence: 0.9,
        sources_json: serde_json::json!([]),
        top_links_json: serde_json::json!([]),
        decision: "ACT".to_string(),
    };

    let copy = snapshot.clone();
    assert_eq!(copy.week, snapshot.week);
    assert_eq!(copy.decision, "ACT");
}
