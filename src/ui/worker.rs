//! Background I/O for the gallery window.
//!
//! Listing fetches, ratio probes and image downloads run on a small tokio
//! runtime. Every result comes back to the GTK main loop as a `WorkerEvent`
//! over an async channel; nothing here touches widgets.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_channel::Sender;
use reqwest::Client;
use tokio::runtime::{Builder as TokioRuntimeBuilder, Runtime};
use tracing::{debug, warn};

use crate::config::GalleryConfig;
use crate::error::SourceError;
use crate::loader::{fetch_with_timeout, HttpImageSource, LoadRequest};
use crate::models::{ImageDescriptor, ImageRecord};
use crate::thumbnails::{ProbeOutcome, RatioProber, ThumbnailCache};

const IO_THREADS: usize = 2;

pub enum WorkerEvent {
    Batch {
        ticket: u64,
        result: Result<Vec<ImageDescriptor>, SourceError>,
    },
    /// Ratios for one batch: `known` came from the store, `probed` were read
    /// from the thumbnails.
    Ratios {
        known: Vec<(String, f32)>,
        probed: Vec<ProbeOutcome>,
    },
    Thumbnail {
        url: String,
        bytes: Arc<[u8]>,
    },
    ThumbnailFailed {
        url: String,
    },
    FullImage {
        index: usize,
        bytes: Arc<[u8]>,
    },
}

pub struct Worker {
    runtime: Runtime,
    source: HttpImageSource,
    prober: RatioProber,
    request_timeout: Duration,
    events: Sender<WorkerEvent>,
}

impl Worker {
    pub fn new(config: &GalleryConfig, events: Sender<WorkerEvent>) -> Result<Self> {
        let cache = ThumbnailCache::new_default(config.thumb_cache_mb).unwrap_or_else(|e| {
            warn!(error = ?e, "Thumbnail disk cache unavailable, using memory only");
            ThumbnailCache::new(None, config.thumb_cache_mb)
        });
        Self::with_cache(config, cache, events)
    }

    pub fn with_cache(
        config: &GalleryConfig,
        cache: ThumbnailCache,
        events: Sender<WorkerEvent>,
    ) -> Result<Self> {
        let runtime = TokioRuntimeBuilder::new_multi_thread()
            .worker_threads(IO_THREADS)
            .thread_name("gallerow-io")
            .enable_all()
            .build()
            .context("Failed to start I/O runtime")?;

        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            runtime,
            source: HttpImageSource::with_client(client.clone(), config.endpoint.clone()),
            prober: RatioProber::new(client, cache, config.probe_timeout),
            request_timeout: config.request_timeout,
            events,
        })
    }

    pub fn cache(&self) -> &ThumbnailCache {
        self.prober.cache()
    }

    pub fn load(&self, request: LoadRequest) {
        let source = self.source.clone();
        let events = self.events.clone();
        let timeout = self.request_timeout;
        self.runtime.spawn(async move {
            let result =
                fetch_with_timeout(&source, request.limit, request.offset, timeout).await;
            if let Err(e) = &result {
                warn!(offset = request.offset, error = %e, "Image listing request failed");
            }
            let event = WorkerEvent::Batch {
                ticket: request.ticket,
                result,
            };
            if events.send(event).await.is_err() {
                debug!("Window gone, dropping listing result");
            }
        });
    }

    /// Probes `records` and reports them in one event together with the
    /// `known` ratios of the same batch.
    pub fn probe(&self, known: Vec<(String, f32)>, records: Vec<ImageRecord>) {
        let prober = self.prober.clone();
        let events = self.events.clone();
        self.runtime.spawn(async move {
            let probed = prober.probe_batch(&records).await;
            if events
                .send(WorkerEvent::Ratios { known, probed })
                .await
                .is_err()
            {
                debug!("Window gone, dropping probe results");
            }
        });
    }

    pub fn thumbnail(&self, url: String) {
        let prober = self.prober.clone();
        let events = self.events.clone();
        self.runtime.spawn(async move {
            let event = match prober.fetch_bytes(&url).await {
                Ok(bytes) => WorkerEvent::Thumbnail { url, bytes },
                Err(e) => {
                    warn!(error = %e, "Thumbnail download failed");
                    WorkerEvent::ThumbnailFailed { url }
                }
            };
            if events.send(event).await.is_err() {
                debug!("Window gone, dropping thumbnail");
            }
        });
    }

    /// Downloads the full-size image shown in the lightbox at `index`.
    pub fn full_image(&self, index: usize, url: String) {
        let prober = self.prober.clone();
        let events = self.events.clone();
        self.runtime.spawn(async move {
            match prober.fetch_uncached(&url).await {
                Ok(bytes) => {
                    if events
                        .send(WorkerEvent::FullImage { index, bytes })
                        .await
                        .is_err()
                    {
                        debug!(index, "Window gone, dropping full image");
                    }
                }
                Err(e) => warn!(index, error = %e, "Full image download failed"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MISSING_THUMB: &str = "file:///nonexistent/gallerow/thumb.png";

    fn worker() -> (Worker, async_channel::Receiver<WorkerEvent>) {
        let (tx, rx) = async_channel::unbounded();
        let worker =
            Worker::with_cache(&GalleryConfig::default(), ThumbnailCache::new(None, 8), tx)
                .unwrap();
        (worker, rx)
    }

    #[test]
    fn test_failed_thumbnail_is_reported() {
        let (worker, rx) = worker();
        worker.thumbnail(MISSING_THUMB.to_string());
        match rx.recv_blocking().unwrap() {
            WorkerEvent::ThumbnailFailed { url } => assert_eq!(url, MISSING_THUMB),
            _ => panic!("expected a thumbnail failure"),
        }
    }

    #[test]
    fn test_known_ratios_travel_with_probe_results() {
        let (worker, rx) = worker();
        let record = ImageRecord {
            url: "b".to_string(),
            thumbnail_url: MISSING_THUMB.to_string(),
            name: "b".to_string(),
            ratio: None,
        };
        worker.probe(vec![("a".to_string(), 2.0)], vec![record]);
        match rx.recv_blocking().unwrap() {
            WorkerEvent::Ratios { known, probed } => {
                assert_eq!(known, vec![("a".to_string(), 2.0)]);
                assert_eq!(probed.len(), 1);
                assert_eq!(probed[0].url, "b");
                assert!(probed[0].is_fallback());
            }
            _ => panic!("expected ratios"),
        }
    }
}
