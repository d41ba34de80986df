//! Remote image listing sources.
//!
//! A source answers one query, `(limit, offset)`, with a finite list of
//! descriptors. An empty or short list signals that the listing is exhausted.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, trace};

use crate::error::SourceError;
use crate::models::ImageDescriptor;

/// Something that can page through image descriptors.
pub trait ImageSource: Send + Sync + 'static {
    fn fetch_batch(
        &self,
        limit: usize,
        offset: usize,
    ) -> impl Future<Output = Result<Vec<ImageDescriptor>, SourceError>> + Send;
}

/// Runs `fetch_batch` with an upper bound on how long it may take.
pub async fn fetch_with_timeout<S: ImageSource>(
    source: &S,
    limit: usize,
    offset: usize,
    timeout: Duration,
) -> Result<Vec<ImageDescriptor>, SourceError> {
    match tokio::time::timeout(timeout, source.fetch_batch(limit, offset)).await {
        Ok(result) => result,
        Err(_) => Err(SourceError::Timeout(timeout)),
    }
}

/// JSON-over-HTTP listing: `GET {endpoint}?limit=N&offset=M`.
#[derive(Debug, Clone)]
pub struct HttpImageSource {
    client: Client,
    endpoint: String,
}

impl HttpImageSource {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, SourceError> {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self::with_client(client, endpoint))
    }

    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

impl ImageSource for HttpImageSource {
    async fn fetch_batch(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ImageDescriptor>, SourceError> {
        trace!(endpoint = %self.endpoint, limit, offset, "Requesting image batch");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("limit", limit), ("offset", offset)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let batch: Vec<ImageDescriptor> = serde_json::from_slice(&body)?;

        debug!(count = batch.len(), offset, "Received image batch");
        Ok(batch)
    }
}

/// Fixed in-memory listing, paged like a real backend.
#[derive(Debug, Clone, Default)]
pub struct StaticImageSource {
    images: Vec<ImageDescriptor>,
}

impl StaticImageSource {
    pub fn new(images: Vec<ImageDescriptor>) -> Self {
        Self { images }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl ImageSource for StaticImageSource {
    async fn fetch_batch(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ImageDescriptor>, SourceError> {
        let start = offset.min(self.images.len());
        let end = offset.saturating_add(limit).min(self.images.len());
        Ok(self.images[start..end].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowSource;

    impl ImageSource for SlowSource {
        async fn fetch_batch(
            &self,
            _limit: usize,
            _offset: usize,
        ) -> Result<Vec<ImageDescriptor>, SourceError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Vec::new())
        }
    }

    fn images(count: usize) -> Vec<ImageDescriptor> {
        (0..count)
            .map(|i| ImageDescriptor::new(format!("u{i}"), format!("t{i}"), format!("n{i}")))
            .collect()
    }

    #[tokio::test]
    async fn test_static_source_pages() {
        let source = StaticImageSource::new(images(12));

        let first = source.fetch_batch(10, 0).await.unwrap();
        assert_eq!(first.len(), 10);
        assert_eq!(first[0].url, "u0");

        let second = source.fetch_batch(10, 10).await.unwrap();
        assert_eq!(second.len(), 2);

        let third = source.fetch_batch(10, 12).await.unwrap();
        assert!(third.is_empty());

        let past_end = source.fetch_batch(10, 500).await.unwrap();
        assert!(past_end.is_empty());
    }

    #[tokio::test]
    async fn test_timeout_maps_to_error() {
        let result = fetch_with_timeout(&SlowSource, 10, 0, Duration::from_millis(20)).await;
        assert!(matches!(result, Err(SourceError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_unreachable_http_source_errors() {
        // Port 9 (discard) on localhost is essentially never listening.
        let source = HttpImageSource::new("http://127.0.0.1:9/images").unwrap();
        let result = fetch_with_timeout(&source, 10, 0, Duration::from_secs(5)).await;
        assert!(result.is_err());
    }
}
