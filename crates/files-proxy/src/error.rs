//! Error types for the files proxy

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use blob_store::{KeyError, StoreError};
use origin_fetcher::FetchError;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum ProxyError {
    BadRequest(String),
    NotFound(String),
    Store(StoreError),
    Fetch(FetchError),
    Config(String),
}

impl fmt::Display for ProxyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ProxyError::NotFound(key) => write!(f, "Not found: {}", key),
            ProxyError::Store(err) => write!(f, "Store error: {}", err),
            ProxyError::Fetch(err) => write!(f, "Origin error: {}", err),
            ProxyError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ProxyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProxyError::Store(err) => Some(err),
            ProxyError::Fetch(err) => Some(err),
            _ => None,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ProxyError::NotFound(_) => return StatusCode::NOT_FOUND.into_response(),
            ProxyError::Store(StoreError::NotFound(_)) => {
                return StatusCode::NOT_FOUND.into_response()
            }
            ProxyError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ProxyError::Store(StoreError::InvalidKey(err)) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            other => {
                tracing::error!(error = %other, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, axum::Json(json!({ "error": message }))).into_response()
    }
}

impl From<StoreError> for ProxyError {
    fn from(err: StoreError) -> Self {
        ProxyError::Store(err)
    }
}

impl From<KeyError> for ProxyError {
    fn from(err: KeyError) -> Self {
        ProxyError::BadRequest(err.to_string())
    }
}

impl From<FetchError> for ProxyError {
    fn from(err: FetchError) -> Self {
        ProxyError::Fetch(err)
    }
}

impl From<tracing_subscriber::filter::ParseError> for ProxyError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        ProxyError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;
