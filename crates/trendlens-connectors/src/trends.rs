//! Google Trends connector.
//!
//! Uses the unofficial widget API: an `explore` call issues per-widget
//! tokens, then `widgetdata/multiline` returns the interest-over-time
//! series and `widgetdata/relatedsearches` the related queries. Responses
//! are JSON behind an anti-XSSI prefix that must be stripped.

use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ConnectorError;
use crate::types::RawHit;

const NORDIC_GEOS: &[&str] = &["SE", "NO", "DK", "FI", "IS"];
const RELATED_TAKE: usize = 20;

/// Google Trends geo codes for a region. Empty means worldwide.
#[must_use]
pub fn geo_for_region(region: &str) -> Vec<String> {
    match region {
        "FR" => vec!["FR".to_string()],
        "Nordics" => NORDIC_GEOS.iter().map(|g| (*g).to_string()).collect(),
        _ => Vec::new(),
    }
}

#[derive(Debug, Deserialize)]
struct ExploreResponse {
    #[serde(default)]
    widgets: Vec<Widget>,
}

#[derive(Debug, Deserialize)]
struct Widget {
    id: String,
    token: Option<String>,
    request: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct MultilineResponse {
    default: MultilineDefault,
}

#[derive(Debug, Deserialize)]
struct MultilineDefault {
    #[serde(rename = "timelineData", default)]
    timeline_data: Vec<TimelinePoint>,
}

#[derive(Debug, Deserialize)]
struct TimelinePoint {
    #[serde(default)]
    value: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct RelatedResponse {
    default: RelatedDefault,
}

#[derive(Debug, Deserialize)]
struct RelatedDefault {
    #[serde(rename = "rankedList", default)]
    ranked_list: Vec<RankedList>,
}

#[derive(Debug, Deserialize)]
struct RankedList {
    #[serde(rename = "rankedKeyword", default)]
    ranked_keyword: Vec<RankedKeyword>,
}

#[derive(Debug, Deserialize)]
struct RankedKeyword {
    query: String,
    #[serde(default)]
    value: f64,
}

/// Fetch search-interest hits for one keyword: one interest-over-time hit
/// per geo, plus related-query hits for the first geo.
///
/// Per-geo failures are logged and skipped; the call only fails when the
/// HTTP client itself breaks down.
pub(crate) async fn fetch_trends(
    http: &reqwest::Client,
    base_url: &str,
    keyword: &str,
    region: &str,
    window_days: u32,
) -> Result<Vec<RawHit>, ConnectorError> {
    let geos = geo_for_region(region);
    // Worldwide is expressed as a single empty geo.
    let geos: Vec<String> = if geos.is_empty() {
        vec![String::new()]
    } else {
        geos
    };

    let mut hits = Vec::new();
    for geo in &geos {
        match fetch_interest_for_geo(http, base_url, keyword, geo, window_days).await {
            Ok(Some(hit)) => hits.push(hit),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(keyword, geo = %geo, error = %e, "Google Trends interest fetch failed");
            }
        }
    }

    match fetch_related_queries(http, base_url, keyword, &geos[0], window_days).await {
        Ok(related) => hits.extend(related),
        Err(e) => {
            tracing::warn!(keyword, error = %e, "Google Trends related queries failed");
        }
    }

    Ok(hits)
}

async fn fetch_interest_for_geo(
    http: &reqwest::Client,
    base_url: &str,
    keyword: &str,
    geo: &str,
    window_days: u32,
) -> Result<Option<RawHit>, ConnectorError> {
    let widgets = explore_widgets(http, base_url, keyword, geo, window_days).await?;
    let Some(widget) = widgets.iter().find(|w| w.id == "TIMESERIES") else {
        return Ok(None);
    };
    let (token, request) = widget_parts(widget)?;

    let raw = http
        .get(format!("{base_url}/trends/api/widgetdata/multiline"))
        .query(&[
            ("hl", "en-US"),
            ("tz", "0"),
            ("req", request.as_str()),
            ("token", token),
        ])
        .send()
        .await?
        .text()
        .await?;

    let parsed: MultilineResponse = parse_prefixed_json(&raw)
        .map_err(|e| ConnectorError::Trends(format!("multiline parse error: {e}")))?;

    let vals: Vec<f64> = parsed
        .default
        .timeline_data
        .iter()
        .map(|p| p.value.first().copied().unwrap_or(0.0))
        .collect();
    if vals.is_empty() {
        return Ok(None);
    }

    let geo_label = if geo.is_empty() { "GLOBAL" } else { geo };
    let explore_url = if geo.is_empty() {
        format!("https://trends.google.com/trends/explore?q={keyword}")
    } else {
        format!("https://trends.google.com/trends/explore?q={keyword}&geo={geo}")
    };

    Ok(Some(RawHit {
        source: "trends".to_string(),
        entity_raw: Some(keyword.to_string()),
        ts_iso: Some(Utc::now().to_rfc3339()),
        volume: vals.last().copied().unwrap_or(0.0),
        trend: slope_pct(&vals),
        fresh: 1.0,
        url: Some(explore_url),
        metadata: serde_json::json!({ "geo": geo_label, "points": vals.len() }),
    }))
}

async fn fetch_related_queries(
    http: &reqwest::Client,
    base_url: &str,
    keyword: &str,
    geo: &str,
    window_days: u32,
) -> Result<Vec<RawHit>, ConnectorError> {
    let widgets = explore_widgets(http, base_url, keyword, geo, window_days).await?;
    let Some(widget) = widgets.iter().find(|w| w.id == "RELATED_QUERIES") else {
        return Ok(Vec::new());
    };
    let (token, request) = widget_parts(widget)?;

    let raw = http
        .get(format!("{base_url}/trends/api/widgetdata/relatedsearches"))
        .query(&[
            ("hl", "en-US"),
            ("tz", "0"),
            ("req", request.as_str()),
            ("token", token),
        ])
        .send()
        .await?
        .text()
        .await?;

    let parsed: RelatedResponse = parse_prefixed_json(&raw)
        .map_err(|e| ConnectorError::Trends(format!("related parse error: {e}")))?;

    // rankedList[0] holds top queries, rankedList[1] rising ones.
    let mut hits = Vec::new();
    for (index, list) in parsed.default.ranked_list.iter().take(2).enumerate() {
        let (tag, trend) = if index == 1 { ("rising", 0.5) } else { ("top", 0.1) };
        for ranked in list.ranked_keyword.iter().take(RELATED_TAKE) {
            hits.push(RawHit {
                source: "trends".to_string(),
                entity_raw: Some(ranked.query.clone()),
                ts_iso: Some(Utc::now().to_rfc3339()),
                volume: ranked.value,
                trend,
                fresh: 0.8,
                url: Some(format!(
                    "https://trends.google.com/trends/explore?q={}",
                    ranked.query
                )),
                metadata: serde_json::json!({ "from": "relatedQueries", "tag": tag }),
            });
        }
    }

    Ok(hits)
}

async fn explore_widgets(
    http: &reqwest::Client,
    base_url: &str,
    keyword: &str,
    geo: &str,
    window_days: u32,
) -> Result<Vec<Widget>, ConnectorError> {
    let end = Utc::now().date_naive();
    let start = end - Duration::days(i64::from(window_days));
    let req = serde_json::json!({
        "comparisonItem": [{
            "keyword": keyword,
            "geo": geo,
            "time": format!("{start} {end}"),
        }],
        "category": 0,
        "property": "",
    })
    .to_string();

    let raw = http
        .get(format!("{base_url}/trends/api/explore"))
        .query(&[("hl", "en-US"), ("tz", "0"), ("req", req.as_str())])
        .send()
        .await?
        .text()
        .await?;

    let parsed: ExploreResponse = parse_prefixed_json(&raw)
        .map_err(|e| ConnectorError::Trends(format!("explore parse error: {e}")))?;
    Ok(parsed.widgets)
}

fn widget_parts(widget: &Widget) -> Result<(&str, String), ConnectorError> {
    let token = widget
        .token
        .as_deref()
        .ok_or_else(|| ConnectorError::Trends(format!("widget {} has no token", widget.id)))?;
    let request = widget
        .request
        .as_ref()
        .ok_or_else(|| ConnectorError::Trends(format!("widget {} has no request", widget.id)))?
        .to_string();
    Ok((token, request))
}

/// Strip the `)]}'`-style anti-XSSI prefix and parse the remaining JSON.
fn parse_prefixed_json<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T, serde_json::Error> {
    let start = raw.find('{').unwrap_or(0);
    serde_json::from_str(&raw[start..])
}

/// Percent change between the averages of the first and second half of the
/// series. Zero for empty series or a zero first-half average.
fn slope_pct(vals: &[f64]) -> f64 {
    if vals.is_empty() {
        return 0.0;
    }
    let mid = vals.len() / 2;
    let avg = |xs: &[f64]| -> f64 {
        if xs.is_empty() {
            0.0
        } else {
            xs.iter().sum::<f64>() / xs.len() as f64
        }
    };
    let first = avg(&vals[..mid]);
    let second = avg(&vals[mid..]);
    if first == 0.0 {
        0.0
    } else {
        (second - first) / first
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geo_for_region_maps_known_regions() {
        assert_eq!(geo_for_region("FR"), vec!["FR"]);
        assert_eq!(geo_for_region("Nordics").len(), 5);
        assert!(geo_for_region("Atlantis").is_empty());
    }

    #[test]
    fn slope_pct_rises_for_growing_series() {
        let vals = [10.0, 10.0, 20.0, 30.0];
        assert!(slope_pct(&vals) > 0.0);
    }

    #[test]
    fn slope_pct_handles_degenerate_series() {
        assert!((slope_pct(&[]) - 0.0).abs() < f64::EPSILON);
        assert!((slope_pct(&[0.0, 0.0, 5.0, 5.0]) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn prefixed_json_is_stripped() {
        let raw = ")]}'\n{\"widgets\": []}";
        let parsed: ExploreResponse = parse_prefixed_json(raw).expect("parse");
        assert!(parsed.widgets.is_empty());
    }
}
