//! End-to-end pipeline tests against a live Postgres via `#[sqlx::test]`.

use chrono::{Duration, Utc};
use trendlens_db::insert_signal;
use trendlens_engine::{compute_themes, Decision, RegionLocks};

/// Insert one signal per week for the last `values.len()` ISO weeks,
/// newest last, all on the same weekday so each value lands in its own
/// week.
async fn seed_weekly_search_signals(pool: &sqlx::PgPool, keyword: &str, values: &[f64]) {
    let today = Utc::now().date_naive();
    let weeks = values.len() as i64;
    for (i, value) in values.iter().enumerate() {
        let date = today - Duration::weeks(weeks - 1 - i as i64);
        insert_signal(pool, date, keyword, "search", *value, serde_json::json!({}))
            .await
            .expect("insert signal");
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn breakout_theme_ends_up_act_with_high_heat(pool: sqlx::PgPool) {
    seed_weekly_search_signals(
        &pool,
        "trenchcoat",
        &[10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 100.0],
    )
    .await;

    let locks = RegionLocks::new();
    let themes = compute_themes(&pool, &locks, "Nordics", None, 90)
        .await
        .expect("compute themes");

    assert_eq!(themes.len(), 1);
    let theme = &themes[0];
    assert_eq!(theme.theme, "trenchcoat");
    assert!(theme.heat > 70.0, "heat {} should exceed 70", theme.heat);
    assert!(theme.momentum > 0.5, "momentum {} should be sharp", theme.momentum);
    assert_eq!(theme.decision, Decision::Act);
    assert!((0.1..=1.0).contains(&theme.confidence));

    // The snapshot row must match what was returned.
    let rows = trendlens_db::list_top_themes(&pool, &theme.week, 10)
        .await
        .expect("list themes");
    assert_eq!(rows.len(), 1);
    assert!((rows[0].heat - theme.heat).abs() < 1e-9);
    assert_eq!(rows[0].decision, "ACT");
}

#[sqlx::test(migrations = "../../migrations")]
async fn recomputing_identical_signals_is_idempotent(pool: sqlx::PgPool) {
    seed_weekly_search_signals(&pool, "loafers", &[5.0, 8.0, 6.0, 12.0, 9.0, 14.0])
        .await;

    let locks = RegionLocks::new();
    let first = compute_themes(&pool, &locks, "Nordics", None, 90)
        .await
        .expect("first run");
    let second = compute_themes(&pool, &locks, "Nordics", None, 90)
        .await
        .expect("second run");

    assert_eq!(first, second, "identical signals must score identically");

    // Still exactly one snapshot row per (week, theme).
    let rows = trendlens_db::list_top_themes(&pool, &first[0].week, 10)
        .await
        .expect("list themes");
    assert_eq!(rows.len(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn stop_words_never_surface_as_themes(pool: sqlx::PgPool) {
    // Even with enormous pre-existing signal volume, a stop word must not
    // be scored.
    seed_weekly_search_signals(&pool, "designer", &[1e6, 1e6, 1e6, 1e6]).await;
    seed_weekly_search_signals(&pool, "trenchcoat", &[10.0, 20.0, 30.0]).await;

    let locks = RegionLocks::new();
    let themes = compute_themes(&pool, &locks, "Nordics", None, 90)
        .await
        .expect("compute themes");

    assert_eq!(themes.len(), 1);
    assert_eq!(themes[0].theme, "trenchcoat");
}

#[sqlx::test(migrations = "../../migrations")]
async fn themes_come_back_ordered_by_heat(pool: sqlx::PgPool) {
    // A breakout series scores hotter than a collapsing one.
    seed_weekly_search_signals(
        &pool,
        "trenchcoat",
        &[10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 100.0],
    )
    .await;
    seed_weekly_search_signals(
        &pool,
        "denim",
        &[100.0, 90.0, 70.0, 50.0, 30.0, 20.0, 10.0, 5.0],
    )
    .await;

    let locks = RegionLocks::new();
    let themes = compute_themes(&pool, &locks, "Nordics", None, 90)
        .await
        .expect("compute themes");

    assert_eq!(themes.len(), 2);
    assert_eq!(themes[0].theme, "trenchcoat");
    assert_eq!(themes[1].theme, "denim");
    assert!(themes[0].heat > themes[1].heat);
}
