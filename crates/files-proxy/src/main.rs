//! Files proxy - caching reverse proxy and file server for binary artifacts

use files_proxy::error::{ProxyError, Result};
use files_proxy::{load_config, start_server, ServerState, SharedState};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::from_default_env().add_directive("files_proxy=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting files proxy...");

    let config = load_config();
    info!("Port: {}", config.port);
    info!("Storage dir: {:?}", config.storage_dir);
    info!("Remote: {:?}", config.remote);
    info!(
        "Cache enabled: {} (buffer {} bytes)",
        config.cache_enabled, config.cache_buffer_bytes
    );

    let state: SharedState = Arc::new(ServerState::from_config(&config).await?);

    // Start HTTP server (blocking)
    start_server(state, config.port)
        .await
        .map_err(|e| ProxyError::Config(format!("Server error: {}", e)))?;

    Ok(())
}
