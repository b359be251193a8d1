use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Google Trends error: {0}")]
    Trends(String),

    #[error("GDELT error: {0}")]
    Gdelt(String),

    #[error("YouTube error: {0}")]
    Youtube(String),

    #[error("Reddit error: {0}")]
    Reddit(String),
}
