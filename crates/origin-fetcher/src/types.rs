//! Fetch results and client settings

use crate::error::FetchError;
use blob_store::Content;
use reqwest::header::HeaderMap;
use std::time::Duration;

/// Result of one request to the origin
#[derive(Debug)]
pub enum FetchOutcome {
    /// 2xx: a lazily read body plus the origin's response headers
    Success { content: Content, headers: HeaderMap },
    /// The origin answered 404
    NotFound,
    Error(FetchError),
}

/// Settings for the origin HTTP client
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Origin base URL; key segments are appended to its path
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Maximum idle time between body reads
    pub read_timeout: Duration,
    pub user_agent: String,
}

impl FetcherConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost".to_string(),
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(60),
            user_agent: concat!("files-proxy/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FetcherConfig::new("https://repo.example.com/files");
        assert_eq!(config.base_url, "https://repo.example.com/files");
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.read_timeout, Duration::from_secs(60));
        assert!(config.user_agent.starts_with("files-proxy/"));
    }
}
