//! Weekly theme scoring: composite heat, momentum, forecast, confidence,
//! and the ACT/WATCH/AVOID decision.
//!
//! All pure functions over an aggregated [`WeeklyBucket`] series, so every
//! formula is unit-testable without storage. The formulas are a
//! reproducibility contract — downstream consumers assume exactly these,
//! so changes here are breaking even when they look like improvements.

use trendlens_core::Source;

use crate::stats::normalize_series;
use crate::types::{Decision, SourceBreakdown, WeeklyBucket};

/// Maximum number of weekly buckets in the active scoring window.
pub const MAX_WINDOW_WEEKS: usize = 8;

/// History length at which the length component of confidence saturates.
const CONFIDENCE_FULL_HISTORY: f64 = 6.0;

/// Everything derived for one theme in one week.
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeScore {
    pub week: String,
    pub heat: f64,
    pub momentum: f64,
    pub forecast_heat: f64,
    pub confidence: f64,
    pub decision: Decision,
    pub sources: Vec<SourceBreakdown>,
}

#[must_use]
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Map finalized (heat, momentum) onto a decision band. The heat
/// thresholds are inclusive; the momentum gate for ACT is strict.
#[must_use]
pub fn classify(heat: f64, momentum: f64) -> Decision {
    if heat >= 70.0 && momentum > 0.0 {
        Decision::Act
    } else if heat >= 40.0 {
        Decision::Watch
    } else {
        Decision::Avoid
    }
}

/// Score one theme's weekly series.
///
/// The series must be ascending by week; only the last
/// [`MAX_WINDOW_WEEKS`] buckets are considered. `target_week` selects the
/// week to score (defaulting to the newest); momentum compares it against
/// the immediately preceding bucket, or against itself when the window
/// holds a single week.
///
/// Returns `None` for an empty series or an unknown target week.
#[must_use]
pub fn score_series(series: &[WeeklyBucket], target_week: Option<&str>) -> Option<ThemeScore> {
    let start = series.len().saturating_sub(MAX_WINDOW_WEEKS);
    let window = &series[start..];
    if window.is_empty() {
        return None;
    }

    // Per-source normalized series, then the weighted composite at every
    // week index. The composite history doubles as the volatility series
    // for confidence.
    let normalized: Vec<(Source, Vec<f64>)> = Source::ALL
        .iter()
        .map(|&source| {
            let vals: Vec<f64> = window.iter().map(|b| b.values.get(source)).collect();
            (source, normalize_series(&vals))
        })
        .collect();

    let composite: Vec<f64> = (0..window.len())
        .map(|i| {
            normalized
                .iter()
                .map(|(source, norm)| source.composite_weight() * norm[i])
                .sum()
        })
        .collect();

    let curr = match target_week {
        Some(week) => window.iter().position(|b| b.week == week)?,
        None => window.len() - 1,
    };

    let curr_z = composite[curr];
    let prev_z = if curr > 0 { composite[curr - 1] } else { curr_z };

    let heat = 100.0 * sigmoid(curr_z);
    let momentum = (curr_z - prev_z).tanh();

    // One-step linear trend projection, two periods out via the weekly
    // delta; not a fitted model.
    let proj_z = curr_z + (curr_z - prev_z);
    let forecast_heat = 100.0 * sigmoid(proj_z);

    #[allow(clippy::cast_precision_loss)]
    let history_len = composite.len() as f64;
    let sd_z = crate::stats::pop_std(&composite);
    let conf_len = (history_len / CONFIDENCE_FULL_HISTORY).min(1.0);
    let conf_vol = 1.0 / (1.0 + sd_z);
    let confidence = (0.6 * conf_len + 0.4 * conf_vol).max(0.1);

    let sources = normalized
        .iter()
        .map(|(source, norm)| SourceBreakdown {
            source: *source,
            z: norm[curr],
            weight: source.composite_weight(),
        })
        .collect();

    Some(ThemeScore {
        week: window[curr].week.clone(),
        heat,
        momentum,
        forecast_heat,
        confidence,
        decision: classify(heat, momentum),
        sources,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceVector;

    fn bucket(week: &str, search: f64, news: f64, social: f64, video: f64) -> WeeklyBucket {
        WeeklyBucket {
            theme: "trenchcoat".to_string(),
            week: week.to_string(),
            values: SourceVector {
                search,
                news,
                social,
                video,
            },
        }
    }

    fn search_series(values: &[f64]) -> Vec<WeeklyBucket> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| bucket(&format!("2024-W{:02}", i + 10), v, 0.0, 0.0, 0.0))
            .collect()
    }

    #[test]
    fn empty_series_scores_nothing() {
        assert!(score_series(&[], None).is_none());
    }

    #[test]
    fn unknown_target_week_scores_nothing() {
        let series = search_series(&[10.0, 20.0]);
        assert!(score_series(&series, Some("1999-W01")).is_none());
    }

    #[test]
    fn heat_stays_strictly_inside_bounds() {
        let spike = search_series(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1_000_000.0]);
        let score = score_series(&spike, None).expect("score");
        assert!(score.heat > 0.0 && score.heat < 100.0);
        assert!(score.forecast_heat > 0.0 && score.forecast_heat < 100.0);

        let crash = search_series(&[1_000_000.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let score = score_series(&crash, None).expect("score");
        assert!(score.heat > 0.0 && score.heat < 100.0);
    }

    #[test]
    fn confidence_stays_in_declared_range() {
        for series in [
            search_series(&[5.0]),
            search_series(&[0.0; 8]),
            search_series(&[10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 100.0]),
        ] {
            let score = score_series(&series, None).expect("score");
            assert!(
                (0.1..=1.0).contains(&score.confidence),
                "confidence {} out of range",
                score.confidence
            );
        }
    }

    #[test]
    fn single_week_has_zero_momentum() {
        let series = search_series(&[42.0]);
        let score = score_series(&series, None).expect("score");
        assert!((score.momentum - 0.0).abs() < f64::EPSILON);
        // With zero momentum the forecast equals the current heat.
        assert!((score.forecast_heat - score.heat).abs() < 1e-9);
    }

    #[test]
    fn classifier_boundaries_are_exact() {
        assert_eq!(classify(70.0, 0.5), Decision::Act);
        // momentum must be strictly positive at the heat boundary
        assert_eq!(classify(70.0, 0.0), Decision::Watch);
        assert_eq!(classify(90.0, -0.1), Decision::Watch);
        assert_eq!(classify(40.0, 0.9), Decision::Watch);
        assert_eq!(classify(39.999, 0.9), Decision::Avoid);
        assert_eq!(classify(10.0, -0.5), Decision::Avoid);
    }

    #[test]
    fn decision_bands_are_consistent_with_heat_and_momentum() {
        let cases = [
            search_series(&[10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 100.0]),
            search_series(&[100.0, 90.0, 70.0, 50.0, 30.0, 20.0, 10.0, 5.0]),
            search_series(&[10.0, 12.0, 9.0, 11.0, 10.0, 13.0, 11.0, 12.0]),
        ];
        for series in cases {
            let score = score_series(&series, None).expect("score");
            match score.decision {
                Decision::Act => {
                    assert!(score.heat >= 70.0 && score.momentum > 0.0);
                }
                Decision::Avoid => assert!(score.heat < 40.0),
                Decision::Watch => {}
            }
        }
    }

    #[test]
    fn breakout_week_triggers_act() {
        // Seven flat weeks then a 10x spike: sharp positive momentum,
        // heat above 70, decision ACT.
        let series = search_series(&[10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 100.0]);
        let score = score_series(&series, None).expect("score");

        assert!(score.heat > 70.0, "heat {} should exceed 70", score.heat);
        assert!(
            score.momentum > 0.5,
            "momentum {} should be sharply positive",
            score.momentum
        );
        assert!(score.forecast_heat > score.heat);
        assert_eq!(score.decision, Decision::Act);
    }

    #[test]
    fn raising_current_search_value_strictly_raises_heat() {
        let base = search_series(&[10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 100.0]);
        let mut boosted = base.clone();
        boosted[7].values.search = 150.0;

        let base_score = score_series(&base, None).expect("score");
        let boosted_score = score_series(&boosted, None).expect("score");
        assert!(
            boosted_score.heat > base_score.heat,
            "sigmoid is strictly increasing, so heat must rise: {} vs {}",
            boosted_score.heat,
            base_score.heat
        );
    }

    #[test]
    fn thin_history_uses_minmax_normalization() {
        // 3 weekly points: the current (maximum) value min-max scales to
        // exactly 1.0, so the search z reads 1.0 — a z-score would give
        // ~1.22 here.
        let series = search_series(&[10.0, 20.0, 30.0]);
        let score = score_series(&series, None).expect("score");
        let search = score
            .sources
            .iter()
            .find(|s| s.source == trendlens_core::Source::Search)
            .expect("search breakdown");
        assert!((search.z - 1.0).abs() < 1e-12);
        assert!((search.weight - 0.35).abs() < 1e-12);
    }

    #[test]
    fn scoring_is_deterministic() {
        let series = search_series(&[10.0, 14.0, 9.0, 30.0, 25.0, 40.0, 38.0, 55.0]);
        let first = score_series(&series, None).expect("score");
        let second = score_series(&series, None).expect("score");
        assert_eq!(first, second);
    }

    #[test]
    fn target_week_selects_the_scored_bucket() {
        let series = search_series(&[10.0, 50.0, 10.0]);
        let peak = score_series(&series, Some("2024-W11")).expect("score");
        assert_eq!(peak.week, "2024-W11");
        // The peak week sits above its predecessor, so momentum is positive.
        assert!(peak.momentum > 0.0);

        let slump = score_series(&series, Some("2024-W12")).expect("score");
        assert!(slump.momentum < 0.0);
        assert!(slump.heat < peak.heat);
    }

    #[test]
    fn window_is_trimmed_to_the_last_eight_weeks() {
        // Ten weeks in, only the last eight count: an enormous first value
        // must have no effect on the score.
        let values = [
            9_999_999.0,
            8.0,
            10.0,
            10.0,
            10.0,
            10.0,
            10.0,
            10.0,
            10.0,
            100.0,
        ];
        let mut long = search_series(&values);
        let trimmed = long.split_off(2);
        long = search_series(&values);

        let from_long = score_series(&long, None).expect("score");
        let from_trimmed = score_series(&trimmed, None).expect("score");
        assert_eq!(from_long.heat.to_bits(), from_trimmed.heat.to_bits());
        assert_eq!(from_long.momentum.to_bits(), from_trimmed.momentum.to_bits());
    }
}
