//! The storage contract shared by every backend

use crate::content::Content;
use crate::error::Result;
use crate::key::Key;
use async_trait::async_trait;

/// A key to byte-stream mapping.
///
/// `write` fully replaces any previous value and must be atomic from a
/// reader's point of view: a concurrent `read` sees either the old value or
/// the new one, never a prefix. If the content stream fails, the write is
/// abandoned and the previous value stays in place.
#[async_trait]
pub trait ByteStore: Send + Sync {
    async fn exists(&self, key: &Key) -> Result<bool>;

    /// Open the value stored under `key`, `StoreError::NotFound` if absent
    async fn read(&self, key: &Key) -> Result<Content>;

    /// Store `content` under `key`, returning the number of bytes written
    async fn write(&self, key: &Key, content: Content) -> Result<u64>;

    async fn delete(&self, key: &Key) -> Result<()>;
}
