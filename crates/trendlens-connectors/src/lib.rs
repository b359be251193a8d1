//! External signal connectors for trendlens.
//!
//! Four sources feed the engine: Google Trends (search interest), GDELT
//! (editorial news mentions), YouTube (creator video metrics), and Reddit
//! (community chatter). Each fetch returns a list of [`RawHit`]s; errors are
//! typed [`ConnectorError`]s and the caller decides whether a failed source
//! aborts anything (the engine treats it as zero hits). Every request runs
//! with the client-wide timeout — no connector call can suspend indefinitely.

mod error;
mod gdelt;
mod reddit;
mod trends;
mod types;
mod youtube;

pub use error::ConnectorError;
pub use trends::geo_for_region;
pub use types::RawHit;

use std::time::Duration;

const TRENDS_BASE_URL: &str = "https://trends.google.com";
const GDELT_BASE_URL: &str = "https://api.gdeltproject.org";
const YOUTUBE_BASE_URL: &str = "https://www.googleapis.com";
const REDDIT_BASE_URL: &str = "https://www.reddit.com";

/// Handle bundling the HTTP client and per-service base URLs.
///
/// Use [`Connectors::new`] in production; [`Connectors::with_base_urls`]
/// points every service at a mock server for tests.
pub struct Connectors {
    http: reqwest::Client,
    trends_base: String,
    gdelt_base: String,
    youtube_base: String,
    reddit_base: String,
    youtube_api_key: Option<String>,
}

impl Connectors {
    /// Build a connector set against the production endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Http`] if the HTTP client cannot be built.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        youtube_api_key: Option<String>,
    ) -> Result<Self, ConnectorError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent.to_string())
            .build()?;

        Ok(Self {
            http,
            trends_base: TRENDS_BASE_URL.to_string(),
            gdelt_base: GDELT_BASE_URL.to_string(),
            youtube_base: YOUTUBE_BASE_URL.to_string(),
            reddit_base: REDDIT_BASE_URL.to_string(),
            youtube_api_key,
        })
    }

    /// Build a connector set with every service pointed at `base_url`
    /// (a wiremock server in tests).
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Http`] if the HTTP client cannot be built.
    pub fn with_base_urls(
        base_url: &str,
        youtube_api_key: Option<String>,
    ) -> Result<Self, ConnectorError> {
        let base = base_url.trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("trendlens-tests/0.1")
            .build()?;

        Ok(Self {
            http,
            trends_base: base.clone(),
            gdelt_base: base.clone(),
            youtube_base: base.clone(),
            reddit_base: base,
            youtube_api_key,
        })
    }

    /// Google Trends search-interest hits for one keyword.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError`] on request, token, or parse failures.
    pub async fn fetch_trends(
        &self,
        keyword: &str,
        region: &str,
        window_days: u32,
    ) -> Result<Vec<RawHit>, ConnectorError> {
        trends::fetch_trends(&self.http, &self.trends_base, keyword, region, window_days).await
    }

    /// GDELT fashion-press news hits for one keyword.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError`] on request or parse failures.
    pub async fn fetch_gdelt(
        &self,
        keyword: &str,
        window_days: u32,
    ) -> Result<Vec<RawHit>, ConnectorError> {
        gdelt::fetch_gdelt(&self.http, &self.gdelt_base, keyword, window_days).await
    }

    /// YouTube creator-video hits for one keyword. Returns an empty list
    /// when no API key is configured.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError`] on request or parse failures.
    pub async fn fetch_youtube(
        &self,
        keyword: &str,
        window_days: u32,
        region_code: Option<&str>,
    ) -> Result<Vec<RawHit>, ConnectorError> {
        let Some(key) = self.youtube_api_key.as_deref() else {
            tracing::debug!(keyword, "no YouTube API key configured; skipping");
            return Ok(Vec::new());
        };
        youtube::fetch_youtube(
            &self.http,
            &self.youtube_base,
            key,
            keyword,
            window_days,
            region_code,
        )
        .await
    }

    /// Reddit community-chatter hits for one keyword.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError`] on request or parse failures.
    pub async fn fetch_reddit(
        &self,
        keyword: &str,
        window_days: u32,
    ) -> Result<Vec<RawHit>, ConnectorError> {
        reddit::fetch_reddit(&self.http, &self.reddit_base, keyword, window_days).await
    }
}
