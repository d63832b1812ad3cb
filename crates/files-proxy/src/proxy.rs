//! Proxy endpoint: GET an artifact through the cache coordinator

use crate::cache::{CacheCoordinator, Loaded, Source};
use crate::error::{ProxyError, Result};
use crate::server::stream_response;
use axum::{
    extract::State,
    http::{HeaderValue, Uri},
    response::Response,
};
use blob_store::{Key, StoreError};
use origin_fetcher::HttpFetcher;
use std::sync::Arc;
use tracing::info;

/// An origin paired with the coordinator that caches it
pub struct ProxyService {
    coordinator: CacheCoordinator,
    fetcher: HttpFetcher,
}

impl ProxyService {
    pub fn new(coordinator: CacheCoordinator, fetcher: HttpFetcher) -> Self {
        Self {
            coordinator,
            fetcher,
        }
    }

    pub fn coordinator(&self) -> &CacheCoordinator {
        &self.coordinator
    }

    pub fn fetcher(&self) -> &HttpFetcher {
        &self.fetcher
    }

    pub async fn load(&self, key: &Key) -> std::result::Result<Option<Loaded>, StoreError> {
        self.coordinator.load(key, || self.fetcher.fetch(key)).await
    }
}

/// GET /{*path}
pub async fn get_artifact(State(proxy): State<Arc<ProxyService>>, uri: Uri) -> Result<Response> {
    let key = Key::from_path(uri.path())?;

    let Some(loaded) = proxy.load(&key).await? else {
        info!(key = %key, "Artifact not found at origin or in cache");
        return Err(ProxyError::NotFound(key.to_string()));
    };

    let cache_header = match loaded.source {
        Source::Remote => "MISS",
        Source::Cache => "HIT",
    };
    info!(
        key = %key,
        source = ?loaded.source,
        size = ?loaded.content.size(),
        "Serving artifact"
    );

    let mut response = stream_response(loaded.content, loaded.headers);
    response
        .headers_mut()
        .insert("x-cache", HeaderValue::from_static(cache_header));
    Ok(response)
}
