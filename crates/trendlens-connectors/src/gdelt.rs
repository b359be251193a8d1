//! GDELT Doc API connector for editorial news mentions.

use chrono::{DateTime, NaiveDateTime, Utc};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;

use crate::error::ConnectorError;
use crate::types::RawHit;

const MAX_RECORDS: usize = 50;

/// Fashion-press domains. Articles from anywhere else are dropped — GDELT
/// matches keywords across the whole news firehose and would otherwise
/// swamp the news signal with irrelevant mentions.
const FASHION_SOURCES: &[&str] = &[
    "vogue.com",
    "businessoffashion.com",
    "wwd.com",
    "elle.com",
    "harpersbazaar.com",
    "thecut.com",
    "refinery29.com",
    "whowhatwear.com",
    "fashionista.com",
    "hypebeast.com",
    "highsnobiety.com",
    "instyle.com",
    "marieclaire.com",
    "cosmopolitan.com",
    "glamour.com",
    "gq.com",
];

#[derive(Debug, Deserialize)]
struct GdeltResponse {
    #[serde(default)]
    articles: Vec<GdeltArticle>,
}

#[derive(Debug, Deserialize)]
struct GdeltArticle {
    url: Option<String>,
    title: Option<String>,
    #[serde(rename = "seendate")]
    seen_date: Option<String>,
    #[serde(rename = "domain")]
    domain: Option<String>,
    language: Option<String>,
}

fn is_fashion_source(url: &str) -> bool {
    FASHION_SOURCES.iter().any(|d| url.contains(d))
}

/// GDELT `seendate` values look like `20240425T123000Z`.
fn parse_seen_date(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, "%Y%m%dT%H%M%SZ")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Fetch recent fashion-press mentions of a keyword.
///
/// Each article is a presence-only hit (`volume = 1`).
pub(crate) async fn fetch_gdelt(
    http: &reqwest::Client,
    base_url: &str,
    keyword: &str,
    window_days: u32,
) -> Result<Vec<RawHit>, ConnectorError> {
    let encoded = utf8_percent_encode(keyword, NON_ALPHANUMERIC).to_string();
    let url = format!(
        "{base_url}/api/v2/doc/doc?query={encoded}&mode=ArtList&maxrecords={MAX_RECORDS}&format=json&timespan={window_days}d"
    );
    let response = http
        .get(url)
        .header("Accept", "application/json")
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(ConnectorError::Gdelt(format!(
            "doc query failed with status {}",
            response.status()
        )));
    }

    let parsed: GdeltResponse = response
        .json()
        .await
        .map_err(|e| ConnectorError::Gdelt(format!("response parse error: {e}")))?;

    let hits = parsed
        .articles
        .into_iter()
        .filter_map(|article| {
            let url = article.url?;
            if !is_fashion_source(&url) {
                return None;
            }
            let ts_iso = article
                .seen_date
                .as_deref()
                .and_then(parse_seen_date)
                .unwrap_or_else(Utc::now)
                .to_rfc3339();
            Some(RawHit {
                source: "gdelt".to_string(),
                entity_raw: Some(keyword.to_string()),
                ts_iso: Some(ts_iso),
                volume: 1.0,
                trend: 0.0,
                fresh: 0.9,
                url: Some(url),
                metadata: serde_json::json!({
                    "title": article.title,
                    "domain": article.domain,
                    "lang": article.language,
                }),
            })
        })
        .collect();

    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fashion_source_filter_matches_by_domain_substring() {
        assert!(is_fashion_source("https://www.vogue.com/article/trenchcoats"));
        assert!(!is_fashion_source("https://example.com/trenchcoats"));
    }

    #[test]
    fn seen_date_parses_gdelt_format() {
        let ts = parse_seen_date("20240425T123000Z").expect("parse");
        assert_eq!(ts.to_rfc3339(), "2024-04-25T12:30:00+00:00");
        assert!(parse_seen_date("2024-04-25").is_none());
    }
}
