//! In-memory store, used when no storage directory is configured

use crate::content::Content;
use crate::error::{Result, StoreError};
use crate::key::Key;
use crate::store::ByteStore;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<Key, Bytes>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ByteStore for MemoryStore {
    async fn exists(&self, key: &Key) -> Result<bool> {
        Ok(self.entries.read().await.contains_key(key))
    }

    async fn read(&self, key: &Key) -> Result<Content> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .cloned()
            .map(Content::from_bytes)
            .ok_or_else(|| StoreError::NotFound(key.clone()))
    }

    async fn write(&self, key: &Key, content: Content) -> Result<u64> {
        // Buffer first so a failing stream never replaces the current value
        let data = content.into_bytes().await?;
        let size = data.len() as u64;
        self.entries.write().await.insert(key.clone(), data);
        Ok(size)
    }

    async fn delete(&self, key: &Key) -> Result<()> {
        self.entries
            .write()
            .await
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(key.clone()))
    }
}
