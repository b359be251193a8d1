//! Statistical primitives shared by both scoring engines.
//!
//! Population statistics over short windows, by design: the active window
//! is at most 8 weeks, so sample-corrected estimators would buy little and
//! complicate the reproducibility contract. Degenerate inputs (zero
//! variance, empty history) normalize to 0 instead of erroring.

/// History length at which normalization switches from min–max rescaling
/// to a population z-score.
pub const Z_SCORE_MIN_POINTS: usize = 8;

/// Arithmetic mean; 0 for an empty slice.
#[must_use]
pub fn mean(vals: &[f64]) -> f64 {
    if vals.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = vals.len() as f64;
    vals.iter().sum::<f64>() / n
}

/// Population standard deviation; 0 for an empty slice.
#[must_use]
pub fn pop_std(vals: &[f64]) -> f64 {
    if vals.is_empty() {
        return 0.0;
    }
    let m = mean(vals);
    #[allow(clippy::cast_precision_loss)]
    let n = vals.len() as f64;
    (vals.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / n).sqrt()
}

/// Normalize `value` against a history that does NOT include it.
///
/// Below [`Z_SCORE_MIN_POINTS`] historical points: min–max rescale over
/// history-plus-value into [0, 1], or 0 when the range is degenerate.
/// Otherwise: population z-score against the history, with a zero standard
/// deviation floored to 1.
#[must_use]
pub fn z_or_minmax(history: &[f64], value: f64) -> f64 {
    if history.len() < Z_SCORE_MIN_POINTS {
        let mut min = value;
        let mut max = value;
        for &v in history {
            min = min.min(v);
            max = max.max(v);
        }
        if max == min {
            return 0.0;
        }
        return (value - min) / (max - min);
    }
    let m = mean(history);
    let sd = pop_std(history);
    let sd = if sd == 0.0 { 1.0 } else { sd };
    (value - m) / sd
}

/// Normalize every point of a series against the series itself (the point
/// being scored is part of its own baseline).
///
/// A full window of [`Z_SCORE_MIN_POINTS`] values uses population z-scores
/// (all 0 when the series has zero variance); a thinner series falls back
/// to min–max rescaling (all 0 when the range is degenerate).
#[must_use]
pub fn normalize_series(vals: &[f64]) -> Vec<f64> {
    if vals.len() >= Z_SCORE_MIN_POINTS {
        let m = mean(vals);
        let sd = pop_std(vals);
        if sd == 0.0 {
            return vec![0.0; vals.len()];
        }
        return vals.iter().map(|v| (v - m) / sd).collect();
    }

    let min = vals.iter().copied().fold(f64::INFINITY, f64::min);
    let max = vals.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if vals.is_empty() || max == min {
        return vec![0.0; vals.len()];
    }
    vals.iter().map(|v| (v - min) / (max - min)).collect()
}
