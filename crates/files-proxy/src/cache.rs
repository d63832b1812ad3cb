//! Remote-first caching with fallback to the last stored copy
//!
//! Every load asks the origin first. A successful answer is streamed to the
//! caller while a background task copies the same chunks into the store; if
//! the origin fails or reports the key missing, the stored copy is served
//! instead. The store is never consulted ahead of the origin, so clients
//! always get the freshest bytes the origin can provide.

use crate::types::CacheStats;
use axum::http::HeaderMap;
use blob_store::{ByteStore, Content, Key, StoreError};
use bytes::Bytes;
use futures::{ready, Stream};
use origin_fetcher::FetchOutcome;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Bytes the cache writer may lag behind the client
const DEFAULT_BUFFER_BYTES: usize = 16 * 1024 * 1024;

/// Where a loaded artifact came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Remote,
    Cache,
}

/// An artifact ready to be forwarded to a client
pub struct Loaded {
    pub content: Content,
    /// Origin response headers; empty when served from the store
    pub headers: HeaderMap,
    pub source: Source,
    /// Background store write, resolving to `true` once the copy is committed
    pub cache_write: Option<JoinHandle<bool>>,
}

#[derive(Default)]
struct Counters {
    remote_hits: AtomicU64,
    fallback_hits: AtomicU64,
    misses: AtomicU64,
    cache_writes: AtomicU64,
    cache_write_failures: AtomicU64,
}

/// Coordinates origin fetches with the cache store.
///
/// Concurrent loads of the same key are not coalesced: each one fetches
/// from the origin and each successful one rewrites the stored copy, the
/// last completed write winning.
pub struct CacheCoordinator {
    store: Option<Arc<dyn ByteStore>>,
    buffer_bytes: usize,
    counters: Arc<Counters>,
}

impl CacheCoordinator {
    /// Coordinator that writes through to and falls back on `store`
    pub fn new(store: Arc<dyn ByteStore>) -> Self {
        Self {
            store: Some(store),
            buffer_bytes: DEFAULT_BUFFER_BYTES,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Coordinator without a store: origin answers pass straight through
    pub fn passthrough() -> Self {
        Self {
            store: None,
            buffer_bytes: DEFAULT_BUFFER_BYTES,
            counters: Arc::new(Counters::default()),
        }
    }

    /// How many bytes the cache writer may lag behind the client before
    /// the cache copy is dropped
    pub fn with_buffer_bytes(mut self, bytes: usize) -> Self {
        self.buffer_bytes = bytes.clamp(1, Semaphore::MAX_PERMITS);
        self
    }

    pub fn is_caching(&self) -> bool {
        self.store.is_some()
    }

    pub fn stats(&self) -> CacheStats {
        let c = &self.counters;
        CacheStats {
            remote_hits: c.remote_hits.load(Ordering::Relaxed),
            fallback_hits: c.fallback_hits.load(Ordering::Relaxed),
            misses: c.misses.load(Ordering::Relaxed),
            cache_writes: c.cache_writes.load(Ordering::Relaxed),
            cache_write_failures: c.cache_write_failures.load(Ordering::Relaxed),
        }
    }

    /// Load `key`, asking the origin through `fetch` first.
    ///
    /// Returns `Ok(None)` when neither the origin nor the store has the
    /// key. The only error is a failure reading back a stored entry that
    /// the store reported as present.
    pub async fn load<F, Fut>(
        &self,
        key: &Key,
        fetch: F,
    ) -> Result<Option<Loaded>, StoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FetchOutcome>,
    {
        match fetch().await {
            FetchOutcome::Success { content, headers } => {
                self.counters.remote_hits.fetch_add(1, Ordering::Relaxed);
                let (content, cache_write) = match &self.store {
                    Some(store) => {
                        let (content, handle) = self.tee(key, content, Arc::clone(store));
                        (content, Some(handle))
                    }
                    None => (content, None),
                };
                return Ok(Some(Loaded {
                    content,
                    headers,
                    source: Source::Remote,
                    cache_write,
                }));
            }
            FetchOutcome::NotFound => {
                debug!(key = %key, "Origin has no such key, trying cache");
            }
            FetchOutcome::Error(e) => {
                warn!(key = %key, error = %e, "Origin fetch failed, trying cache");
            }
        }

        let loaded = self.load_stored(key).await?;
        let counter = if loaded.is_some() {
            &self.counters.fallback_hits
        } else {
            &self.counters.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        Ok(loaded)
    }

    async fn load_stored(&self, key: &Key) -> Result<Option<Loaded>, StoreError> {
        let Some(store) = &self.store else {
            return Ok(None);
        };

        match store.exists(key).await {
            Ok(true) => {}
            Ok(false) => return Ok(None),
            Err(e) => {
                warn!(key = %key, error = %e, "Cache lookup failed, treating as miss");
                return Ok(None);
            }
        }

        match store.read(key).await {
            Ok(content) => {
                debug!(key = %key, size = ?content.size(), "Serving cached copy");
                Ok(Some(Loaded {
                    content,
                    headers: HeaderMap::new(),
                    source: Source::Cache,
                    cache_write: None,
                }))
            }
            // Removed between the existence check and the read
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => {
                error!(key = %key, error = %e, "Failed to read cached entry");
                Err(e)
            }
        }
    }

    /// Split `upstream` into a client stream and a background store write
    fn tee(
        &self,
        key: &Key,
        upstream: Content,
        store: Arc<dyn ByteStore>,
    ) -> (Content, JoinHandle<bool>) {
        let size = upstream.size();
        let (tx, rx) = mpsc::unbounded_channel();
        let completed = Arc::new(AtomicBool::new(false));

        let mut client = TeeStream {
            upstream,
            sink: Some(tx),
            budget: Arc::new(Semaphore::new(self.buffer_bytes)),
            completed: Arc::clone(&completed),
            expected: size,
            received: 0,
            done: false,
            key: key.clone(),
        };
        // Servers may never poll a declared-empty body
        if size == Some(0) {
            client.complete_copy();
        }
        let copy = CacheCopy {
            rx,
            completed,
            done: false,
        };

        let key = key.clone();
        let counters = Arc::clone(&self.counters);
        let handle = tokio::spawn(async move {
            match store.write(&key, Content::from_stream(copy, size)).await {
                Ok(written) => {
                    counters.cache_writes.fetch_add(1, Ordering::Relaxed);
                    debug!(key = %key, size = written, "Cached origin content");
                    true
                }
                Err(e) => {
                    counters.cache_write_failures.fetch_add(1, Ordering::Relaxed);
                    warn!(key = %key, error = %e, "Cache copy discarded");
                    false
                }
            }
        });

        (Content::from_stream(client, size), handle)
    }
}

/// A chunk queued for the cache writer, holding its share of the byte budget
type Queued = (Bytes, OwnedSemaphorePermit);

/// Client-facing half of the tee.
///
/// Forwards upstream chunks unchanged and offers each one to the cache
/// writer without ever waiting on it. Queued chunks draw on a byte budget;
/// once the writer lags by more than the budget the copy is dropped. The
/// writer is only told the copy is complete when every upstream byte was
/// handed over, either at the declared length or at a clean end of stream.
struct TeeStream {
    upstream: Content,
    sink: Option<mpsc::UnboundedSender<Queued>>,
    budget: Arc<Semaphore>,
    completed: Arc<AtomicBool>,
    expected: Option<u64>,
    received: u64,
    done: bool,
    key: Key,
}

impl TeeStream {
    fn offer(&mut self, chunk: &Bytes) {
        let Some(sink) = &self.sink else {
            return;
        };
        let permit = u32::try_from(chunk.len())
            .ok()
            .and_then(|n| Arc::clone(&self.budget).try_acquire_many_owned(n).ok());
        let Some(permit) = permit else {
            warn!(key = %self.key, "Cache writer fell behind, skipping cache copy");
            self.sink = None;
            return;
        };
        if sink.send((chunk.clone(), permit)).is_err() {
            self.sink = None;
        }
    }

    /// Hand the writer a clean end of stream, unless the copy was dropped
    fn complete_copy(&mut self) {
        if let Some(sink) = self.sink.take() {
            self.completed.store(true, Ordering::SeqCst);
            drop(sink);
        }
    }

    fn fail(&mut self, err: io::Error) -> Poll<Option<io::Result<Bytes>>> {
        self.sink = None;
        self.done = true;
        Poll::Ready(Some(Err(err)))
    }
}

impl Stream for TeeStream {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        if this.done {
            return Poll::Ready(None);
        }

        match ready!(Pin::new(&mut this.upstream).poll_next(cx)) {
            Some(Ok(chunk)) => {
                this.received += chunk.len() as u64;
                if let Some(expected) = this.expected {
                    if this.received > expected {
                        return this.fail(io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!("origin sent more than the declared {} bytes", expected),
                        ));
                    }
                }
                this.offer(&chunk);
                // Servers stop polling once the declared length is sent
                if this.expected == Some(this.received) {
                    this.done = true;
                    this.complete_copy();
                }
                Poll::Ready(Some(Ok(chunk)))
            }
            Some(Err(e)) => this.fail(e),
            None => {
                if let Some(expected) = this.expected {
                    if this.received != expected {
                        return this.fail(io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            format!(
                                "origin body ended after {} of {} bytes",
                                this.received, expected
                            ),
                        ));
                    }
                }
                this.done = true;
                this.complete_copy();
                Poll::Ready(None)
            }
        }
    }
}

/// Store-facing half of the tee
struct CacheCopy {
    rx: mpsc::UnboundedReceiver<Queued>,
    completed: Arc<AtomicBool>,
    done: bool,
}

impl Stream for CacheCopy {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.done {
            return Poll::Ready(None);
        }
        match ready!(self.rx.poll_recv(cx)) {
            Some((chunk, _permit)) => Poll::Ready(Some(Ok(chunk))),
            None => {
                self.done = true;
                if self.completed.load(Ordering::SeqCst) {
                    Poll::Ready(None)
                } else {
                    Poll::Ready(Some(Err(io::Error::new(
                        io::ErrorKind::Interrupted,
                        "origin stream did not complete",
                    ))))
                }
            }
        }
    }
}
