//! Lazily produced byte streams

use bytes::{Bytes, BytesMut};
use futures::stream::{self, BoxStream, Stream, StreamExt};
use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A one-shot stream of byte chunks with an optional known total size
pub struct Content {
    stream: BoxStream<'static, io::Result<Bytes>>,
    size: Option<u64>,
}

impl Content {
    /// Content backed by a single in-memory buffer
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let size = data.len() as u64;
        let stream = if data.is_empty() {
            stream::empty().boxed()
        } else {
            stream::once(async move { Ok(data) }).boxed()
        };
        Self {
            stream,
            size: Some(size),
        }
    }

    pub fn from_stream<S>(stream: S, size: Option<u64>) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        Self {
            stream: stream.boxed(),
            size,
        }
    }

    /// Total size in bytes, when the producer declared one
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    /// Drain the stream into one buffer
    pub async fn into_bytes(mut self) -> io::Result<Bytes> {
        let mut buf = BytesMut::with_capacity(self.size.unwrap_or(0) as usize);
        while let Some(chunk) = self.stream.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf.freeze())
    }
}

impl Stream for Content {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.stream.as_mut().poll_next(cx)
    }
}

impl fmt::Debug for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Content").field("size", &self.size).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_from_bytes_round_trip() {
        let content = Content::from_bytes("hello");
        assert_eq!(content.size(), Some(5));
        assert_eq!(content.into_bytes().await.unwrap(), Bytes::from("hello"));
    }

    #[tokio::test]
    async fn test_empty_yields_no_chunks() {
        let mut content = Content::from_bytes(Bytes::new());
        assert_eq!(content.size(), Some(0));
        assert!(content.next().await.is_none());
    }

    #[tokio::test]
    async fn test_stream_chunks_keep_order() {
        let chunks = vec![
            Ok(Bytes::from("a")),
            Ok(Bytes::from("b")),
            Ok(Bytes::from("c")),
        ];
        let content = Content::from_stream(stream::iter(chunks), None);
        assert_eq!(content.size(), None);
        assert_eq!(content.into_bytes().await.unwrap(), Bytes::from("abc"));
    }

    #[tokio::test]
    async fn test_into_bytes_propagates_stream_error() {
        let chunks = vec![
            Ok(Bytes::from("partial")),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
        ];
        let content = Content::from_stream(stream::iter(chunks), Some(100));
        let err = content.into_bytes().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
    }
}
