//! Core types for the files proxy

use origin_fetcher::FetcherConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Counters kept by the cache coordinator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    /// Requests answered by the origin
    pub remote_hits: u64,
    /// Requests answered from the store after the origin failed
    pub fallback_hits: u64,
    /// Requests neither the origin nor the store could answer
    pub misses: u64,
    pub cache_writes: u64,
    pub cache_write_failures: u64,
}

/// Configuration for the service
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub port: u16,
    /// Directory for stored files; in-memory storage when unset
    pub storage_dir: Option<PathBuf>,
    /// Origin to proxy; the service serves the store directly when unset
    pub remote: Option<RemoteConfig>,
    /// Populate and fall back to the store when proxying
    pub cache_enabled: bool,
    /// Bytes buffered between the client stream and the cache writer
    pub cache_buffer_bytes: usize,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            storage_dir: None,
            remote: None,
            cache_enabled: true,
            cache_buffer_bytes: 16 * 1024 * 1024,
        }
    }
}

/// Origin connection settings and credentials
#[derive(Clone)]
pub struct RemoteConfig {
    pub fetcher: FetcherConfig,
    pub username: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
}

impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("fetcher", &self.fetcher)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub mode: String,
    pub uptime_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheStats>,
}
