//! Aspect-ratio probing for thumbnails.
//!
//! Each probe downloads a thumbnail (or reuses the cached bytes), reads its
//! natural dimensions and reports `width / height`. Probes are bounded by a
//! timeout; failures fall back to `FALLBACK_RATIO` so a single bad thumbnail
//! never holds back its batch.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{FuturesUnordered, Stream};
use image::ImageReader;
use reqwest::Client;
use tracing::{debug, trace, warn};

use super::cache::ThumbnailCache;
use crate::error::ProbeError;
use crate::models::{ratio_from_dimensions, ImageRecord, FALLBACK_RATIO};

/// Resolved ratio for one gallery record.
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    /// Gallery url of the record (not the thumbnail url).
    pub url: String,
    /// Natural thumbnail size, when it could be read.
    pub dimensions: Option<(u32, u32)>,
    /// Ratio to lay the record out with.
    pub ratio: f32,
}

impl ProbeOutcome {
    pub fn is_fallback(&self) -> bool {
        self.dimensions.is_none()
    }
}

#[derive(Clone)]
pub struct RatioProber {
    client: Client,
    cache: ThumbnailCache,
    timeout: Duration,
}

impl RatioProber {
    pub fn new(client: Client, cache: ThumbnailCache, timeout: Duration) -> Self {
        Self {
            client,
            cache,
            timeout,
        }
    }

    pub fn cache(&self) -> &ThumbnailCache {
        &self.cache
    }

    /// Returns thumbnail bytes from the cache or the network.
    pub async fn fetch_bytes(&self, thumbnail_url: &str) -> Result<Arc<[u8]>, ProbeError> {
        if let Some(bytes) = self.cache.get(thumbnail_url).await {
            return Ok(bytes);
        }
        let bytes = self.fetch_uncached(thumbnail_url).await?;
        self.cache.put(thumbnail_url, Arc::clone(&bytes)).await;
        Ok(bytes)
    }

    /// Downloads `url` without touching the cache. Used for full-size images.
    ///
    /// `file://` urls are read from the local filesystem.
    pub async fn fetch_uncached(&self, url: &str) -> Result<Arc<[u8]>, ProbeError> {
        let fetch_err = |reason: String| ProbeError::Fetch {
            url: url.to_string(),
            reason,
        };

        let bytes: Vec<u8> = if let Some(path) = url.strip_prefix("file://") {
            tokio::fs::read(path)
                .await
                .map_err(|e| fetch_err(e.to_string()))?
        } else {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| fetch_err(e.to_string()))?;
            if !response.status().is_success() {
                return Err(fetch_err(format!("status {}", response.status())));
            }
            response
                .bytes()
                .await
                .map_err(|e| fetch_err(e.to_string()))?
                .to_vec()
        };
        Ok(bytes.into())
    }

    /// Reads the natural dimensions of a thumbnail, bounded by the timeout.
    pub async fn probe_dimensions(&self, thumbnail_url: &str) -> Result<(u32, u32), ProbeError> {
        let work = async {
            let bytes = self.fetch_bytes(thumbnail_url).await?;
            read_dimensions(thumbnail_url, &bytes)
        };
        match tokio::time::timeout(self.timeout, work).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout {
                url: thumbnail_url.to_string(),
                after: self.timeout,
            }),
        }
    }

    /// Resolves one record. Never fails; see `ProbeOutcome::is_fallback`.
    pub async fn probe(&self, record: &ImageRecord) -> ProbeOutcome {
        match self.probe_dimensions(&record.thumbnail_url).await {
            Ok((width, height)) => {
                trace!(url = %record.url, width, height, "Probed thumbnail");
                ProbeOutcome {
                    url: record.url.clone(),
                    dimensions: Some((width, height)),
                    ratio: ratio_from_dimensions(width, height).unwrap_or(FALLBACK_RATIO),
                }
            }
            Err(e) => {
                warn!(url = %record.url, error = %e, "Thumbnail probe failed, using fallback ratio");
                ProbeOutcome {
                    url: record.url.clone(),
                    dimensions: None,
                    ratio: FALLBACK_RATIO,
                }
            }
        }
    }

    /// Probes every record and waits for all of them.
    pub async fn probe_batch(&self, records: &[ImageRecord]) -> Vec<ProbeOutcome> {
        let outcomes =
            futures_util::future::join_all(records.iter().map(|record| self.probe(record))).await;
        let fallbacks = outcomes.iter().filter(|o| o.is_fallback()).count();
        debug!(count = outcomes.len(), fallbacks, "Probed thumbnail batch");
        outcomes
    }

    /// Probes every record, yielding outcomes as they resolve.
    pub fn probe_stream<'a>(
        &'a self,
        records: &'a [ImageRecord],
    ) -> impl Stream<Item = ProbeOutcome> + 'a {
        records
            .iter()
            .map(|record| self.probe(record))
            .collect::<FuturesUnordered<_>>()
    }
}

/// Reads image dimensions from encoded bytes without a full decode.
pub fn read_dimensions(url: &str, bytes: &[u8]) -> Result<(u32, u32), ProbeError> {
    let decode_err = |source| ProbeError::Decode {
        url: url.to_string(),
        source,
    };

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| decode_err(image::ImageError::IoError(e)))?;
    let (width, height) = reader.into_dimensions().map_err(decode_err)?;

    if width == 0 || height == 0 {
        return Err(ProbeError::EmptyImage(url.to_string()));
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use image::{ImageBuffer, ImageFormat, Rgb};
    use std::path::Path;
    use tempfile::tempdir;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Rgb([40u8, 80, 120]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> String {
        let path = dir.join(name);
        std::fs::write(&path, png_bytes(width, height)).unwrap();
        format!("file://{}", path.display())
    }

    fn record(url: &str, thumbnail_url: &str) -> ImageRecord {
        ImageRecord {
            url: url.to_string(),
            thumbnail_url: thumbnail_url.to_string(),
            name: url.to_string(),
            ratio: None,
        }
    }

    fn prober(timeout: Duration) -> RatioProber {
        RatioProber::new(Client::new(), ThumbnailCache::new(None, 8), timeout)
    }

    #[test]
    fn test_read_dimensions() {
        assert_eq!(read_dimensions("mem", &png_bytes(40, 20)).unwrap(), (40, 20));
        assert!(matches!(
            read_dimensions("mem", b"definitely not an image"),
            Err(ProbeError::Decode { .. })
        ));
    }

    #[tokio::test]
    async fn test_probe_local_thumbnail() {
        let dir = tempdir().unwrap();
        let thumb = write_png(dir.path(), "wide.png", 30, 10);

        let prober = prober(Duration::from_secs(5));
        let outcome = prober.probe(&record("https://img/wide.jpg", &thumb)).await;
        assert_eq!(outcome.url, "https://img/wide.jpg");
        assert_eq!(outcome.dimensions, Some((30, 10)));
        assert!((outcome.ratio - 3.0).abs() < 1e-6);

        // Bytes were cached for the lightbox and grid.
        assert!(prober.cache().get_memory(&thumb).is_some());
    }

    #[tokio::test]
    async fn test_uncached_fetch_skips_cache() {
        let dir = tempdir().unwrap();
        let full = write_png(dir.path(), "full.png", 64, 48);

        let prober = prober(Duration::from_secs(5));
        let bytes = prober.fetch_uncached(&full).await.unwrap();
        assert_eq!(read_dimensions(&full, &bytes).unwrap(), (64, 48));
        assert!(prober.cache().get_memory(&full).is_none());
    }

    #[tokio::test]
    async fn test_missing_thumbnail_falls_back() {
        let prober = prober(Duration::from_secs(5));
        let outcome = prober
            .probe(&record("u", "file:///nonexistent/gallerow/thumb.png"))
            .await;
        assert!(outcome.is_fallback());
        assert!((outcome.ratio - FALLBACK_RATIO).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_stalled_thumbnail_times_out_to_fallback() {
        // Accepts connections and never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let thumb = format!("http://{addr}/stalled.png");
        let prober = prober(Duration::from_millis(200));

        let started = std::time::Instant::now();
        assert!(matches!(
            prober.probe_dimensions(&thumb).await,
            Err(ProbeError::Timeout { .. })
        ));
        let outcome = prober.probe(&record("stalled", &thumb)).await;
        assert!(outcome.is_fallback());
        assert!((outcome.ratio - FALLBACK_RATIO).abs() < 1e-6);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_batch_joins_all_records_in_order() {
        let dir = tempdir().unwrap();
        let records = vec![
            record("a", &write_png(dir.path(), "a.png", 20, 10)),
            record("b", "file:///nonexistent/gallerow/b.png"),
            record("c", &write_png(dir.path(), "c.png", 10, 20)),
        ];

        let outcomes = prober(Duration::from_secs(5)).probe_batch(&records).await;
        let urls: Vec<&str> = outcomes.iter().map(|o| o.url.as_str()).collect();
        assert_eq!(urls, vec!["a", "b", "c"]);
        assert!((outcomes[0].ratio - 2.0).abs() < 1e-6);
        assert!(outcomes[1].is_fallback());
        assert!((outcomes[2].ratio - 0.5).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_stream_yields_every_record() {
        let dir = tempdir().unwrap();
        let records: Vec<ImageRecord> = (0..4)
            .map(|i| {
                record(
                    &format!("u{i}"),
                    &write_png(dir.path(), &format!("{i}.png"), 10 + i, 10),
                )
            })
            .collect();

        let prober = prober(Duration::from_secs(5));
        let mut seen: Vec<String> = prober
            .probe_stream(&records)
            .map(|outcome| outcome.url)
            .collect()
            .await;
        seen.sort();
        assert_eq!(seen, vec!["u0", "u1", "u2", "u3"]);
    }
}
