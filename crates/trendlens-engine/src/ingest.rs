//! Signal ingestion: raw connector hits → normalized signal rows.
//!
//! One row per hit, append-only, no deduplication: repeated ingestion of
//! the same underlying event produces multiple rows and inflates weekly
//! aggregates. That tradeoff is accepted — reruns over overlapping windows
//! double-count rather than risk dropping evidence.

use chrono::{NaiveDate, Utc};
use serde_json::Value;
use sqlx::PgPool;

use trendlens_connectors::RawHit;
use trendlens_core::{day_from_iso, is_stop_term, Source};

use crate::error::EngineError;

/// A hit reduced to the canonical `(date, keyword, source, value)` tuple.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSignal {
    pub date: NaiveDate,
    pub keyword: String,
    pub source: Source,
    pub value: f64,
    pub metadata: Value,
}

fn metadata_count(metadata: &Value, key: &str) -> f64 {
    metadata.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

/// Normalize one raw hit, or drop it.
///
/// The date is the day prefix of the hit timestamp (falling back to
/// `today`); the keyword is the hit's raw entity (falling back to the
/// query keyword), lowercased and trimmed. Hits whose keyword comes out
/// empty — or is a stop term, which may never surface as a theme — are
/// dropped silently.
#[must_use]
pub fn normalize_hit(hit: &RawHit, fallback_keyword: &str, today: NaiveDate) -> Option<NormalizedSignal> {
    let date = hit
        .ts_iso
        .as_deref()
        .and_then(day_from_iso)
        .unwrap_or(today);

    let raw_keyword = hit
        .entity_raw
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .unwrap_or(fallback_keyword);
    let keyword = raw_keyword.trim().to_lowercase();
    if keyword.is_empty() || is_stop_term(&keyword) {
        return None;
    }

    let source = Source::from_label(&hit.source);
    let value = match source {
        Source::Video | Source::Search => hit.volume.max(0.0),
        Source::Social => {
            1.0 + metadata_count(&hit.metadata, "ups")
                + metadata_count(&hit.metadata, "numComments")
        }
        Source::News => 1.0,
    };

    Some(NormalizedSignal {
        date,
        keyword,
        source,
        value,
        metadata: hit.metadata.clone(),
    })
}

/// Normalize and append a batch of hits, returning how many rows were
/// written. Dropped hits are not an error.
///
/// # Errors
///
/// Returns [`EngineError::Db`] if an insert fails — signal rows are the
/// source of truth and must not go missing silently.
pub async fn ingest_hits(
    pool: &PgPool,
    hits: &[RawHit],
    fallback_keyword: &str,
) -> Result<usize, EngineError> {
    let today = Utc::now().date_naive();
    let mut written = 0_usize;

    for hit in hits {
        let Some(signal) = normalize_hit(hit, fallback_keyword, today) else {
            continue;
        };
        trendlens_db::insert_signal(
            pool,
            signal.date,
            &signal.keyword,
            signal.source.as_str(),
            signal.value,
            signal.metadata,
        )
        .await?;
        written += 1;
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(source: &str, entity: Option<&str>, volume: f64, metadata: Value) -> RawHit {
        RawHit {
            source: source.to_string(),
            entity_raw: entity.map(str::to_string),
            ts_iso: Some("2024-04-25T09:30:00Z".to_string()),
            volume,
            trend: 0.0,
            fresh: 1.0,
            url: None,
            metadata,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).expect("date")
    }

    #[test]
    fn video_and_search_use_raw_volume() {
        let signal = normalize_hit(&hit("youtube", None, 125_000.0, Value::Null), "trenchcoat", today())
            .expect("signal");
        assert_eq!(signal.source, Source::Video);
        assert!((signal.value - 125_000.0).abs() < f64::EPSILON);

        let signal = normalize_hit(&hit("trends", None, 67.0, Value::Null), "trenchcoat", today())
            .expect("signal");
        assert_eq!(signal.source, Source::Search);
        assert!((signal.value - 67.0).abs() < f64::EPSILON);
    }

    #[test]
    fn social_counts_post_plus_engagement() {
        let metadata = serde_json::json!({"ups": 10, "numComments": 5});
        let signal = normalize_hit(&hit("reddit", None, 99.0, metadata), "trenchcoat", today())
            .expect("signal");
        assert_eq!(signal.source, Source::Social);
        assert!((signal.value - 16.0).abs() < f64::EPSILON);
    }

    #[test]
    fn social_without_engagement_metadata_counts_one() {
        let signal = normalize_hit(&hit("reddit", None, 0.0, Value::Null), "trenchcoat", today())
            .expect("signal");
        assert!((signal.value - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn news_is_presence_only() {
        let signal = normalize_hit(&hit("gdelt", None, 42.0, Value::Null), "trenchcoat", today())
            .expect("signal");
        assert_eq!(signal.source, Source::News);
        assert!((signal.value - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn date_is_the_timestamp_day_prefix() {
        let signal = normalize_hit(&hit("gdelt", None, 1.0, Value::Null), "trenchcoat", today())
            .expect("signal");
        assert_eq!(signal.date, NaiveDate::from_ymd_opt(2024, 4, 25).expect("date"));
    }

    #[test]
    fn missing_timestamp_falls_back_to_today() {
        let mut h = hit("gdelt", None, 1.0, Value::Null);
        h.ts_iso = None;
        let signal = normalize_hit(&h, "trenchcoat", today()).expect("signal");
        assert_eq!(signal.date, today());
    }

    #[test]
    fn keyword_falls_back_to_the_query_keyword() {
        let signal = normalize_hit(&hit("gdelt", None, 1.0, Value::Null), "  Trenchcoat ", today())
            .expect("signal");
        assert_eq!(signal.keyword, "trenchcoat");

        let signal = normalize_hit(
            &hit("gdelt", Some("Red Shoes"), 1.0, Value::Null),
            "trenchcoat",
            today(),
        )
        .expect("signal");
        assert_eq!(signal.keyword, "red shoes");
    }

    #[test]
    fn empty_keyword_is_dropped_silently() {
        assert!(normalize_hit(&hit("gdelt", Some("  "), 1.0, Value::Null), "", today()).is_none());
    }

    #[test]
    fn stop_terms_never_become_signals() {
        assert!(normalize_hit(&hit("trends", Some("Designer"), 90.0, Value::Null), "x", today())
            .is_none());
        assert!(normalize_hit(&hit("trends", None, 90.0, Value::Null), "fashion", today()).is_none());
    }

    #[test]
    fn negative_volume_clamps_to_zero() {
        let signal = normalize_hit(&hit("trends", None, -5.0, Value::Null), "trenchcoat", today())
            .expect("signal");
        assert!((signal.value - 0.0).abs() < f64::EPSILON);
    }
}
