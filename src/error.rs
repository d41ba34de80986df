use std::time::Duration;

use thiserror::Error;

/// Failure while fetching a batch of image descriptors.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend answered with status {0}")]
    Status(u16),
    #[error("malformed image listing: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

/// Failure while resolving a thumbnail's dimensions.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to fetch thumbnail {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("failed to decode thumbnail {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: image::ImageError,
    },
    #[error("thumbnail {0} has zero width or height")]
    EmptyImage(String),
    #[error("probing {url} timed out after {after:?}")]
    Timeout { url: String, after: Duration },
}
