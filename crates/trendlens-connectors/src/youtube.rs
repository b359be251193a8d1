//! YouTube Data API connector for creator video metrics.
//!
//! Two calls per keyword: a search for recent videos, then a statistics
//! lookup for the matched ids. Videos under the view floor are skipped so
//! the video signal reflects creators with real reach.

use chrono::{Duration, Utc};
use serde::Deserialize;

use crate::error::ConnectorError;
use crate::types::RawHit;

const MAX_RESULTS: usize = 25;
const MIN_VIEW_COUNT: f64 = 50_000.0;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchId,
}

#[derive(Debug, Deserialize)]
struct SearchId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<Video>,
}

#[derive(Debug, Deserialize)]
struct Video {
    id: String,
    #[serde(default)]
    statistics: Statistics,
    snippet: Option<Snippet>,
}

/// YouTube returns counts as strings.
#[derive(Debug, Default, Deserialize)]
struct Statistics {
    #[serde(rename = "viewCount")]
    view_count: Option<String>,
    #[serde(rename = "likeCount")]
    like_count: Option<String>,
    #[serde(rename = "commentCount")]
    comment_count: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: Option<String>,
    #[serde(rename = "channelTitle")]
    channel_title: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
}

fn count(raw: Option<&String>) -> f64 {
    raw.and_then(|v| v.parse::<f64>().ok()).unwrap_or(0.0)
}

/// Fetch recent creator videos for a keyword, volume = view count.
pub(crate) async fn fetch_youtube(
    http: &reqwest::Client,
    base_url: &str,
    api_key: &str,
    keyword: &str,
    window_days: u32,
    region_code: Option<&str>,
) -> Result<Vec<RawHit>, ConnectorError> {
    let published_after = (Utc::now() - Duration::days(i64::from(window_days))).to_rfc3339();
    let max_results = MAX_RESULTS.to_string();

    let mut params: Vec<(&str, &str)> = vec![
        ("key", api_key),
        ("part", "snippet"),
        ("type", "video"),
        ("maxResults", max_results.as_str()),
        ("q", keyword),
        ("publishedAfter", published_after.as_str()),
        ("order", "date"),
    ];
    if let Some(code) = region_code.filter(|c| c.len() == 2) {
        params.push(("regionCode", code));
    }

    let response = http
        .get(format!("{base_url}/youtube/v3/search"))
        .query(&params)
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(ConnectorError::Youtube(format!(
            "search failed with status {}",
            response.status()
        )));
    }
    let search: SearchResponse = response
        .json()
        .await
        .map_err(|e| ConnectorError::Youtube(format!("search parse error: {e}")))?;

    let ids: Vec<String> = search
        .items
        .into_iter()
        .filter_map(|item| item.id.video_id)
        .collect();
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let id_list = ids.join(",");
    let response = http
        .get(format!("{base_url}/youtube/v3/videos"))
        .query(&[
            ("part", "statistics,snippet"),
            ("id", id_list.as_str()),
            ("key", api_key),
        ])
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(ConnectorError::Youtube(format!(
            "videos lookup failed with status {}",
            response.status()
        )));
    }
    let videos: VideosResponse = response
        .json()
        .await
        .map_err(|e| ConnectorError::Youtube(format!("videos parse error: {e}")))?;

    let hits = videos
        .items
        .into_iter()
        .filter_map(|video| {
            let view_count = count(video.statistics.view_count.as_ref());
            if view_count < MIN_VIEW_COUNT {
                return None;
            }
            let snippet = video.snippet;
            let ts_iso = snippet.as_ref().and_then(|s| s.published_at.clone());
            Some(RawHit {
                source: "youtube".to_string(),
                entity_raw: Some(keyword.to_string()),
                ts_iso,
                volume: view_count,
                trend: 0.3,
                fresh: 1.0,
                url: Some(format!("https://www.youtube.com/watch?v={}", video.id)),
                metadata: serde_json::json!({
                    "title": snippet.as_ref().and_then(|s| s.title.clone()),
                    "channel": snippet.as_ref().and_then(|s| s.channel_title.clone()),
                    "viewCount": view_count,
                    "likeCount": count(video.statistics.like_count.as_ref()),
                    "commentCount": count(video.statistics.comment_count.as_ref()),
                }),
            })
        })
        .collect();

    Ok(hits)
}
