//! Weekly aggregation: signal rows → per-theme ISO-week bucket series.

use std::collections::BTreeMap;

use trendlens_core::{is_stop_term, iso_week_str, Source};
use trendlens_db::SignalRow;

use crate::score::MAX_WINDOW_WEEKS;
use crate::types::{SourceVector, WeeklyBucket};

/// Bucket windowed signal rows by theme and ISO week.
///
/// Values are summed per aliased source into the fixed four-key vector;
/// every series comes back ascending by week and truncated to the last
/// [`MAX_WINDOW_WEEKS`] entries. Themes with zero signals are simply
/// absent. Rows with empty or stop-term keywords are skipped — the
/// ingestor already drops them, but aggregation must hold the line for
/// rows that predate that rule.
#[must_use]
pub fn bucket_signals(rows: &[SignalRow]) -> BTreeMap<String, Vec<WeeklyBucket>> {
    // (theme, week) → summed source vector. BTreeMap keeps both the theme
    // ordering and the ascending week ordering deterministic.
    let mut buckets: BTreeMap<(String, String), SourceVector> = BTreeMap::new();

    for row in rows {
        let theme = row.keyword.trim().to_lowercase();
        if theme.is_empty() || is_stop_term(&theme) {
            continue;
        }
        let week = iso_week_str(row.date);
        let source = Source::from_label(&row.source);
        buckets
            .entry((theme, week))
            .or_default()
            .add(source, row.value);
    }

    let mut series: BTreeMap<String, Vec<WeeklyBucket>> = BTreeMap::new();
    for ((theme, week), values) in buckets {
        series.entry(theme.clone()).or_default().push(WeeklyBucket {
            theme,
            week,
            values,
        });
    }

    for buckets in series.values_mut() {
        // Entries arrive week-ascending from the BTreeMap; keep only the
        // most recent window.
        if buckets.len() > MAX_WINDOW_WEEKS {
            buckets.drain(..buckets.len() - MAX_WINDOW_WEEKS);
        }
    }

    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(date: (i32, u32, u32), keyword: &str, source: &str, value: f64) -> SignalRow {
        SignalRow {
            id: 0,
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).expect("date"),
            keyword: keyword.to_string(),
            source: source.to_string(),
            value,
            metadata: serde_json::Value::Null,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn sums_values_per_source_within_a_week() {
        // 2024-04-22 (Mon) and 2024-04-25 (Thu) share ISO week 2024-W17.
        let rows = vec![
            row((2024, 4, 22), "trenchcoat", "search", 40.0),
            row((2024, 4, 25), "trenchcoat", "search", 27.0),
            row((2024, 4, 25), "trenchcoat", "video", 125_000.0),
        ];
        let series = bucket_signals(&rows);
        let buckets = &series["trenchcoat"];

        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].week, "2024-W17");
        assert!((buckets[0].values.search - 67.0).abs() < f64::EPSILON);
        assert!((buckets[0].values.video - 125_000.0).abs() < f64::EPSILON);
        // Untouched sources stay present at zero.
        assert!((buckets[0].values.news - 0.0).abs() < f64::EPSILON);
        assert!((buckets[0].values.social - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn weeks_are_ascending_per_theme() {
        let rows = vec![
            row((2024, 4, 25), "trenchcoat", "search", 2.0),
            row((2024, 4, 11), "trenchcoat", "search", 1.0),
            row((2024, 4, 18), "trenchcoat", "search", 3.0),
        ];
        let series = bucket_signals(&rows);
        let weeks: Vec<&str> = series["trenchcoat"].iter().map(|b| b.week.as_str()).collect();
        assert_eq!(weeks, vec!["2024-W15", "2024-W16", "2024-W17"]);
    }

    #[test]
    fn series_is_truncated_to_the_most_recent_eight_weeks() {
        // Ten consecutive Mondays starting in 2024-W01.
        let rows: Vec<SignalRow> = (0..10_i64)
            .map(|i| {
                let mut r = row((2024, 1, 1), "denim", "search", 1.0);
                r.date += chrono::Duration::days(i * 7);
                r
            })
            .collect();
        let series = bucket_signals(&rows);
        let buckets = &series["denim"];

        assert_eq!(buckets.len(), 8, "older weeks fall out of the window");
        assert_eq!(buckets[0].week, "2024-W03");
        assert_eq!(buckets[7].week, "2024-W10");
    }

    #[test]
    fn stop_terms_and_empty_keywords_never_become_themes() {
        let rows = vec![
            row((2024, 4, 25), "designer", "search", 9_999.0),
            row((2024, 4, 25), "  ", "search", 9_999.0),
            row((2024, 4, 25), "trenchcoat", "search", 1.0),
        ];
        let series = bucket_signals(&rows);
        assert_eq!(series.len(), 1);
        assert!(series.contains_key("trenchcoat"));
    }

    #[test]
    fn keywords_are_normalized_before_grouping() {
        let rows = vec![
            row((2024, 4, 25), "Trenchcoat", "search", 1.0),
            row((2024, 4, 25), "trenchcoat ", "search", 2.0),
        ];
        let series = bucket_signals(&rows);
        assert_eq!(series.len(), 1);
        assert!((series["trenchcoat"][0].values.search - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn raw_source_labels_are_aliased_while_bucketing() {
        let rows = vec![
            row((2024, 4, 25), "trenchcoat", "trends", 10.0),
            row((2024, 4, 25), "trenchcoat", "gdelt", 1.0),
            row((2024, 4, 25), "trenchcoat", "reddit", 16.0),
            row((2024, 4, 25), "trenchcoat", "youtube", 125_000.0),
        ];
        let series = bucket_signals(&rows);
        let values = series["trenchcoat"][0].values;
        assert!((values.search - 10.0).abs() < f64::EPSILON);
        assert!((values.news - 1.0).abs() < f64::EPSILON);
        assert!((values.social - 16.0).abs() < f64::EPSILON);
        assert!((values.video - 125_000.0).abs() < f64::EPSILON);
    }
}
