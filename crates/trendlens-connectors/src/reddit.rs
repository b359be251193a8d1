//! Reddit connector using the public search endpoint (no OAuth; rate
//! limits apply).

use chrono::{Duration, TimeZone, Utc};
use serde::Deserialize;

use crate::error::ConnectorError;
use crate::types::RawHit;

const PAGE_LIMIT: usize = 25;

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Post>,
}

#[derive(Debug, Deserialize)]
struct Post {
    data: PostData,
}

#[derive(Debug, Deserialize)]
struct PostData {
    title: Option<String>,
    #[serde(default)]
    ups: i64,
    #[serde(default)]
    num_comments: i64,
    #[serde(default)]
    created_utc: f64,
    permalink: Option<String>,
    subreddit: Option<String>,
}

/// Fetch recent community posts mentioning a keyword.
///
/// Posts older than the window are dropped. Volume counts the post itself
/// plus its upvotes and comments.
pub(crate) async fn fetch_reddit(
    http: &reqwest::Client,
    base_url: &str,
    keyword: &str,
    window_days: u32,
) -> Result<Vec<RawHit>, ConnectorError> {
    let limit = PAGE_LIMIT.to_string();
    let response = http
        .get(format!("{base_url}/search.json"))
        .query(&[("q", keyword), ("limit", limit.as_str()), ("sort", "new")])
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(ConnectorError::Reddit(format!(
            "search failed with status {}",
            response.status()
        )));
    }

    let listing: Listing = response
        .json()
        .await
        .map_err(|e| ConnectorError::Reddit(format!("response parse error: {e}")))?;

    let cutoff = Utc::now() - Duration::days(i64::from(window_days));

    let hits = listing
        .data
        .children
        .into_iter()
        .filter_map(|post| {
            let data = post.data;
            #[allow(clippy::cast_possible_truncation)]
            let created = Utc.timestamp_opt(data.created_utc as i64, 0).single()?;
            if created < cutoff {
                return None;
            }
            #[allow(clippy::cast_precision_loss)]
            let volume = 1.0 + data.ups.max(0) as f64 + data.num_comments.max(0) as f64;
            Some(RawHit {
                source: "reddit".to_string(),
                entity_raw: Some(keyword.to_string()),
                ts_iso: Some(created.to_rfc3339()),
                volume,
                trend: 0.2,
                fresh: 0.9,
                url: data
                    .permalink
                    .as_deref()
                    .map(|p| format!("https://www.reddit.com{p}")),
                metadata: serde_json::json!({
                    "title": data.title,
                    "ups": data.ups,
                    "numComments": data.num_comments,
                    "subreddit": data.subreddit,
                }),
            })
        })
        .collect();

    Ok(hits)
}
