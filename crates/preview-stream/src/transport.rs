//! The upstream seam: open a request, then read body chunks until the end.

use std::pin::Pin;

use bytes::Bytes;

use crate::errors::ProviderError;
use crate::request::GenerateRequest;

/// Sequential reads of body chunks; `None` signals end of stream.
pub type ChunkStream =
    Pin<Box<dyn futures::Stream<Item = Result<Bytes, ProviderError>> + Send + 'static>>;

/// Opens one upstream generation request.
///
/// Implementations must return `ProviderError::Status` for a non-success
/// response without reading its body as a stream, and perform no retries.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn open(&self, request: &GenerateRequest) -> Result<ChunkStream, ProviderError>;
}

/// Adapts any fallible byte stream into a `ChunkStream`.
pub fn chunk_stream<S, B, E>(stream: S) -> ChunkStream
where
    S: futures::Stream<Item = Result<B, E>> + Send + 'static,
    B: Into<Bytes>,
    E: std::fmt::Display,
{
    use futures::StreamExt as _;

    Box::pin(stream.map(|item| {
        item.map(Into::into)
            .map_err(|e| ProviderError::transport(e.to_string()))
    }))
}
