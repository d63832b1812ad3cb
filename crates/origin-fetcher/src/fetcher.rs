//! Streaming artifact fetches from the configured origin

use crate::auth::{Anonymous, Authenticator};
use crate::error::{FetchError, Result};
use crate::types::{FetchOutcome, FetcherConfig};
use blob_store::{Content, Key};
use futures::TryStreamExt;
use reqwest::{redirect, Client, StatusCode};
use std::io;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// HTTP client for one origin
pub struct HttpFetcher {
    client: Client,
    base_url: Url,
    authenticator: Arc<dyn Authenticator>,
}

impl HttpFetcher {
    /// Create an anonymous fetcher
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        Self::with_authenticator(config, Arc::new(Anonymous))
    }

    pub fn with_authenticator(
        config: &FetcherConfig,
        authenticator: Arc<dyn Authenticator>,
    ) -> Result<Self> {
        let base_url = parse_base_url(&config.base_url)?;

        // Redirects are reported as errors rather than followed
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            base_url,
            authenticator,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Origin URL for a key: the base path followed by the encoded segments
    pub fn url_for(&self, key: &Key) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(key.segments());
        Ok(url)
    }

    /// GET the key from the origin without buffering the body
    pub async fn fetch(&self, key: &Key) -> FetchOutcome {
        let url = match self.url_for(key) {
            Ok(url) => url,
            Err(e) => return FetchOutcome::Error(e),
        };

        let request = self.authenticator.authenticate(self.client.get(url.clone()));
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %url, error = %e, "Origin request failed");
                return FetchOutcome::Error(e.into());
            }
        };

        let status = response.status();
        debug!(url = %url, status = %status, "Origin responded");

        if status.is_success() {
            let headers = response.headers().clone();
            let size = response.content_length();
            let stream = response.bytes_stream().map_err(io::Error::other);
            FetchOutcome::Success {
                content: Content::from_stream(stream, size),
                headers,
            }
        } else if status == StatusCode::NOT_FOUND {
            FetchOutcome::NotFound
        } else {
            FetchOutcome::Error(FetchError::Status(status))
        }
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(FetchError::InvalidUrl(format!(
                "unsupported scheme: {}",
                other
            )))
        }
    }
    if url.cannot_be_a_base() {
        return Err(FetchError::InvalidUrl(raw.to_string()));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::BearerToken;
    use axum::body::Body;
    use axum::http::{header, HeaderMap};
    use axum::response::{IntoResponse, Redirect, Response};
    use axum::routing::get;
    use axum::Router;
    use bytes::Bytes;
    use futures::stream;
    use std::net::SocketAddr;

    async fn spawn_origin() -> SocketAddr {
        let router = Router::new()
            .route(
                "/repo/any",
                get(|| async { ([(header::CONTENT_TYPE, "text/plain")], "xyz098") }),
            )
            .route("/repo/empty", get(|| async { "" }))
            .route(
                "/repo/broken",
                get(|| async { axum::http::StatusCode::INTERNAL_SERVER_ERROR }),
            )
            .route("/repo/moved", get(|| async { Redirect::temporary("/repo/any") }))
            .route(
                "/repo/secret",
                get(|headers: HeaderMap| async move {
                    match headers.get(header::AUTHORIZATION) {
                        Some(v) if v == "Bearer t0ken" => "classified".into_response(),
                        _ => axum::http::StatusCode::UNAUTHORIZED.into_response(),
                    }
                }),
            )
            .route(
                "/repo/cut",
                get(|| async {
                    let chunks: Vec<io::Result<Bytes>> = vec![
                        Ok(Bytes::from("partial")),
                        Err(io::Error::other("origin crashed")),
                    ];
                    Response::new(Body::from_stream(stream::iter(chunks)))
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    fn fetcher_for(addr: SocketAddr) -> HttpFetcher {
        HttpFetcher::new(&FetcherConfig::new(format!("http://{}/repo", addr))).unwrap()
    }

    fn key(path: &str) -> Key {
        Key::from_path(path).unwrap()
    }

    #[test]
    fn test_url_for_appends_encoded_segments() {
        let fetcher =
            HttpFetcher::new(&FetcherConfig::new("http://origin.test/repo/")).unwrap();
        let url = fetcher.url_for(&key("/org/my%20lib.jar")).unwrap();
        assert_eq!(url.as_str(), "http://origin.test/repo/org/my%20lib.jar");

        let fetcher = HttpFetcher::new(&FetcherConfig::new("http://origin.test")).unwrap();
        let url = fetcher.url_for(&key("/abc")).unwrap();
        assert_eq!(url.as_str(), "http://origin.test/abc");
    }

    #[test]
    fn test_rejects_unsupported_scheme() {
        let result = HttpFetcher::new(&FetcherConfig::new("ftp://origin.test/repo"));
        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));

        let result = HttpFetcher::new(&FetcherConfig::new("not a url"));
        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_fetch_success_streams_body_and_headers() {
        let addr = spawn_origin().await;
        let fetcher = fetcher_for(addr);

        match fetcher.fetch(&key("/any")).await {
            FetchOutcome::Success { content, headers } => {
                assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "text/plain");
                assert_eq!(content.size(), Some(6));
                assert_eq!(content.into_bytes().await.unwrap(), Bytes::from("xyz098"));
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_empty_body_is_success() {
        let addr = spawn_origin().await;
        let fetcher = fetcher_for(addr);

        match fetcher.fetch(&key("/empty")).await {
            FetchOutcome::Success { content, .. } => {
                assert!(content.into_bytes().await.unwrap().is_empty());
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_not_found() {
        let addr = spawn_origin().await;
        let fetcher = fetcher_for(addr);

        assert!(matches!(
            fetcher.fetch(&key("/missing")).await,
            FetchOutcome::NotFound
        ));
    }

    #[tokio::test]
    async fn test_fetch_server_error_and_redirect_are_errors() {
        let addr = spawn_origin().await;
        let fetcher = fetcher_for(addr);

        match fetcher.fetch(&key("/broken")).await {
            FetchOutcome::Error(FetchError::Status(status)) => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR)
            }
            other => panic!("expected status error, got {:?}", other),
        }
        match fetcher.fetch(&key("/moved")).await {
            FetchOutcome::Error(FetchError::Status(status)) => {
                assert_eq!(status, StatusCode::TEMPORARY_REDIRECT)
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let fetcher = fetcher_for(addr);
        assert!(matches!(
            fetcher.fetch(&key("/any")).await,
            FetchOutcome::Error(FetchError::Http(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_applies_authenticator() {
        let addr = spawn_origin().await;
        let config = FetcherConfig::new(format!("http://{}/repo", addr));

        let anonymous = HttpFetcher::new(&config).unwrap();
        assert!(matches!(
            anonymous.fetch(&key("/secret")).await,
            FetchOutcome::Error(FetchError::Status(status)) if status == StatusCode::UNAUTHORIZED
        ));

        let authed = HttpFetcher::with_authenticator(
            &config,
            Arc::new(BearerToken("t0ken".to_string())),
        )
        .unwrap();
        match authed.fetch(&key("/secret")).await {
            FetchOutcome::Success { content, .. } => {
                assert_eq!(content.into_bytes().await.unwrap(), Bytes::from("classified"));
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_mid_stream_failure_surfaces_as_read_error() {
        let addr = spawn_origin().await;
        let fetcher = fetcher_for(addr);

        match fetcher.fetch(&key("/cut")).await {
            FetchOutcome::Success { content, .. } => {
                assert!(content.into_bytes().await.is_err());
            }
            other => panic!("expected success headers, got {:?}", other),
        }
    }
}
