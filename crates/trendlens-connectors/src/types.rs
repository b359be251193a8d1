use serde_json::Value;

/// One raw event from one source, before ingestion normalizes it.
///
/// `source` carries the raw connector label (`trends`, `gdelt`, `youtube`,
/// `reddit`); the ingestor aliases it onto the canonical source vocabulary.
#[derive(Debug, Clone)]
pub struct RawHit {
    pub source: String,
    /// The phrase this hit is evidence for; `None` falls back to the query
    /// keyword that produced it.
    pub entity_raw: Option<String>,
    /// ISO-8601 timestamp of the underlying event; `None` means "now".
    pub ts_iso: Option<String>,
    /// Source-specific magnitude: interest index, view count, or 0/1.
    pub volume: f64,
    /// Rough directional hint in [-1, 1], connector-estimated.
    pub trend: f64,
    /// Freshness weight in [0, 1].
    pub fresh: f64,
    pub url: Option<String>,
    pub metadata: Value,
}
