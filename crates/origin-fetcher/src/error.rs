//! Error types for origin fetches

use reqwest::StatusCode;
use std::fmt;

#[derive(Debug)]
pub enum FetchError {
    /// Transport failure: refused connection, timeout, TLS, ...
    Http(Box<reqwest::Error>),
    /// The origin answered with a status other than 2xx or 404
    Status(StatusCode),
    InvalidUrl(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Http(err) => write!(f, "HTTP error: {}", err),
            FetchError::Status(status) => write!(f, "Origin returned status {}", status),
            FetchError::InvalidUrl(msg) => write!(f, "Invalid origin URL: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Http(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Http(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;
