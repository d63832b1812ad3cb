//! Caching reverse proxy for binary artifacts
//!
//! Requests are answered by the origin first; successful bodies are streamed
//! to the client and written through to the byte store at the same time. When
//! the origin fails or does not have the file, the stored copy is served.
//! Without an origin the service reads and writes the store directly.

pub mod cache;
pub mod config;
pub mod error;
pub mod files;
pub mod proxy;
pub mod server;
pub mod types;

pub use cache::{CacheCoordinator, Loaded, Source};
pub use config::load_config;
pub use error::{ProxyError, Result};
pub use proxy::ProxyService;
pub use server::{create_router, start_server, Mode, ServerState, SharedState};
pub use types::{CacheStats, HealthResponse, ProxyConfig, RemoteConfig};
