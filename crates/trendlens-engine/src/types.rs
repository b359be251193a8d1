//! Engine-side value types: weekly buckets, decisions, and scored themes.

use serde::{Deserialize, Serialize};
use trendlens_core::Source;

/// Summed signal value per canonical source for one (theme, week).
/// All four sources are always present, defaulting to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceVector {
    pub search: f64,
    pub news: f64,
    pub social: f64,
    pub video: f64,
}

impl SourceVector {
    #[must_use]
    pub fn get(&self, source: Source) -> f64 {
        match source {
            Source::Search => self.search,
            Source::News => self.news,
            Source::Social => self.social,
            Source::Video => self.video,
        }
    }

    pub fn add(&mut self, source: Source, value: f64) {
        match source {
            Source::Search => self.search += value,
            Source::News => self.news += value,
            Source::Social => self.social += value,
            Source::Video => self.video += value,
        }
    }
}

/// One week of aggregated signals for a theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyBucket {
    pub theme: String,
    pub week: String,
    pub values: SourceVector,
}

/// Thresholded action recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Act,
    Watch,
    Avoid,
}

impl Decision {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Act => "ACT",
            Decision::Watch => "WATCH",
            Decision::Avoid => "AVOID",
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACT" => Ok(Decision::Act),
            "WATCH" => Ok(Decision::Watch),
            "AVOID" => Ok(Decision::Avoid),
            other => Err(format!("unknown decision: {other}")),
        }
    }
}

/// Per-source contribution to a theme's composite value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceBreakdown {
    pub source: Source,
    pub z: f64,
    pub weight: f64,
}

/// One fully scored theme, as persisted and as served.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredTheme {
    pub theme: String,
    pub week: String,
    pub heat: f64,
    pub momentum: f64,
    pub forecast_heat: f64,
    pub confidence: f64,
    pub decision: Decision,
    pub sources: Vec<SourceBreakdown>,
    pub links: Vec<String>,
}
