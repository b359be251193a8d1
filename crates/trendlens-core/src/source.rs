//! The four canonical signal sources and their label aliasing.

use serde::{Deserialize, Serialize};

/// Canonical signal source after aliasing raw connector labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Search,
    News,
    Social,
    Video,
}

impl Source {
    /// All sources in the order the composite weights are reported.
    pub const ALL: [Source; 4] = [Source::Search, Source::News, Source::Social, Source::Video];

    /// Alias a raw connector label onto a canonical source. Unknown labels
    /// fold to `News`, matching the presence-only default value rule.
    #[must_use]
    pub fn from_label(label: &str) -> Source {
        match label {
            "trends" | "search" => Source::Search,
            "youtube" | "video" => Source::Video,
            "reddit" | "social" => Source::Social,
            _ => Source::News,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Source::Search => "search",
            Source::News => "news",
            Source::Social => "social",
            Source::Video => "video",
        }
    }

    /// Fixed composite weight for weekly theme scoring. Sums to 1.0.
    #[must_use]
    pub fn composite_weight(self) -> f64 {
        match self {
            Source::Search => 0.35,
            Source::News => 0.15,
            Source::Social => 0.30,
            Source::Video => 0.20,
        }
    }

    /// Source trust weight for the lightweight per-hit research score.
    #[must_use]
    pub fn research_weight(self) -> f64 {
        match self {
            Source::News => 1.0,
            Source::Search => 0.8,
            Source::Video => 0.6,
            Source::Social => 0.2,
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
