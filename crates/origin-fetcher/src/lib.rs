//! Origin Fetcher
//!
//! Issues single GET requests for artifact keys against a configured HTTP
//! origin and classifies the answer as success (with a lazily read body),
//! not found, or error.

pub mod auth;
pub mod error;
pub mod fetcher;
pub mod types;

pub use auth::{Anonymous, Authenticator, BasicAuth, BearerToken};
pub use error::{FetchError, Result};
pub use fetcher::HttpFetcher;
pub use types::{FetchOutcome, FetcherConfig};
