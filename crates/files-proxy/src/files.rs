//! Direct file endpoint: read, write and delete the store without an origin

use crate::error::Result;
use crate::server::stream_response;
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    response::Response,
};
use blob_store::{ByteStore, Content, Key};
use futures::TryStreamExt;
use std::io;
use std::sync::Arc;
use tracing::{debug, info};

pub type SharedStore = Arc<dyn ByteStore>;

/// GET /{*path}
pub async fn get_file(State(store): State<SharedStore>, uri: Uri) -> Result<Response> {
    let key = Key::from_path(uri.path())?;
    let content = store.read(&key).await?;
    debug!(key = %key, size = ?content.size(), "Serving file");
    Ok(stream_response(content, HeaderMap::new()))
}

/// PUT /{*path}
pub async fn put_file(
    State(store): State<SharedStore>,
    uri: Uri,
    body: Body,
) -> Result<StatusCode> {
    save_body(&store, &uri, body).await?;
    Ok(StatusCode::CREATED)
}

/// POST /{*path}
pub async fn post_file(
    State(store): State<SharedStore>,
    uri: Uri,
    body: Body,
) -> Result<StatusCode> {
    save_body(&store, &uri, body).await?;
    Ok(StatusCode::OK)
}

/// DELETE /{*path}
pub async fn delete_file(State(store): State<SharedStore>, uri: Uri) -> Result<StatusCode> {
    let key = Key::from_path(uri.path())?;
    store.delete(&key).await?;
    info!(key = %key, "Deleted file");
    Ok(StatusCode::NO_CONTENT)
}

async fn save_body(store: &SharedStore, uri: &Uri, body: Body) -> Result<()> {
    let key = Key::from_path(uri.path())?;
    let stream = body.into_data_stream().map_err(io::Error::other);
    let written = store.write(&key, Content::from_stream(stream, None)).await?;
    info!(key = %key, size = written, "Stored file");
    Ok(())
}
