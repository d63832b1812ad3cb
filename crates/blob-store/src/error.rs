//! Error types for blob stores

use crate::key::{Key, KeyError};
use std::fmt;

#[derive(Debug)]
pub enum StoreError {
    NotFound(Key),
    InvalidKey(KeyError),
    Io(Box<std::io::Error>),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound(key) => write!(f, "Key not found: {}", key),
            StoreError::InvalidKey(err) => write!(f, "Invalid key: {}", err),
            StoreError::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::InvalidKey(err) => Some(err),
            StoreError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(Box::new(err))
    }
}

impl From<KeyError> for StoreError {
    fn from(err: KeyError) -> Self {
        StoreError::InvalidKey(err)
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
