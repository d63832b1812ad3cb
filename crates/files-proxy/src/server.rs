//! HTTP server for the proxy and file endpoints
//!
//! Provides /health plus a catch-all route whose handlers depend on the mode:
//! proxying an origin through the cache, or serving the store directly.

use crate::cache::CacheCoordinator;
use crate::error::Result;
use crate::files::{self, SharedStore};
use crate::proxy::{self, ProxyService};
use crate::types::{HealthResponse, ProxyConfig};
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::{Json, Response},
    routing::get,
    Router,
};
use blob_store::{Content, FsStore, MemoryStore};
use chrono::{DateTime, Utc};
use origin_fetcher::{auth, HttpFetcher};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

/// Headers describing the connection or the framing of the origin response
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "content-length",
];

/// What the catch-all route serves
pub enum Mode {
    Proxy(Arc<ProxyService>),
    Files(SharedStore),
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Proxy(_) => "proxy",
            Mode::Files(_) => "files",
        }
    }
}

/// Shared state for the HTTP server
pub struct ServerState {
    pub mode: Mode,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            started_at: Utc::now(),
        }
    }

    /// Build the store, and the origin fetcher when one is configured
    pub async fn from_config(config: &ProxyConfig) -> Result<Self> {
        let store: SharedStore = match &config.storage_dir {
            Some(dir) => {
                let store = FsStore::new(dir.clone());
                store.init().await?;
                Arc::new(store)
            }
            None => {
                warn!("STORAGE_DIR not set, files are kept in memory");
                Arc::new(MemoryStore::new())
            }
        };

        let mode = match &config.remote {
            Some(remote) => {
                let authenticator = auth::from_credentials(
                    remote.username.clone(),
                    remote.password.clone(),
                    remote.token.clone(),
                );
                let fetcher = HttpFetcher::with_authenticator(&remote.fetcher, authenticator)?;
                let coordinator = if config.cache_enabled {
                    CacheCoordinator::new(store).with_buffer_bytes(config.cache_buffer_bytes)
                } else {
                    CacheCoordinator::passthrough()
                };
                info!(
                    origin = %fetcher.base_url(),
                    caching = coordinator.is_caching(),
                    "Proxying origin"
                );
                Mode::Proxy(Arc::new(ProxyService::new(coordinator, fetcher)))
            }
            None => {
                info!("No REMOTE_URL, serving the store directly");
                Mode::Files(store)
            }
        };

        Ok(Self::new(mode))
    }
}

pub type SharedState = Arc<ServerState>;

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    let artifacts: Router = match &state.mode {
        Mode::Proxy(service) => Router::new()
            .route("/{*path}", get(proxy::get_artifact))
            .with_state(Arc::clone(service)),
        Mode::Files(store) => Router::new()
            .route(
                "/{*path}",
                get(files::get_file)
                    .put(files::put_file)
                    .post(files::post_file)
                    .delete(files::delete_file),
            )
            .with_state(Arc::clone(store)),
    };

    let status: Router = Router::new()
        .route("/health", get(health))
        .with_state(state);

    status.merge(artifacts).layer(CorsLayer::permissive())
}

/// Start the HTTP server
pub async fn start_server(state: SharedState, port: u16) -> std::io::Result<()> {
    let router = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await
}

/// Health check endpoint
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let uptime_secs = (Utc::now() - state.started_at).num_seconds() as u64;
    let cache = match &state.mode {
        Mode::Proxy(service) => Some(service.coordinator().stats()),
        Mode::Files(_) => None,
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        mode: state.mode.name().to_string(),
        uptime_secs,
        cache,
    })
}

/// Stream `content` as a 200 response carrying the end-to-end `headers`
pub(crate) fn stream_response(content: Content, mut headers: HeaderMap) -> Response {
    for name in HOP_BY_HOP {
        headers.remove(*name);
    }
    headers
        .entry(header::CONTENT_TYPE)
        .or_insert(HeaderValue::from_static("application/octet-stream"));
    if let Some(size) = content.size() {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(size));
    }

    let mut response = Response::new(Body::from_stream(content));
    *response.headers_mut() = headers;
    response
}
