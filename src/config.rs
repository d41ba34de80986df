//! Runtime configuration.
//!
//! Defaults can be overridden with `GALLEROW_*` environment variables; the
//! endpoint can also be given as the first command-line argument.

use std::time::Duration;

use tracing::warn;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8080/images";
pub const DEFAULT_BATCH_LIMIT: usize = 10;
pub const DEFAULT_ROW_HEIGHT: f32 = 200.0;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 20_000;
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 8_000;
pub const DEFAULT_SWIPE_THRESHOLD: f64 = 50.0;
pub const DEFAULT_TRANSITION_MS: u64 = 300;
pub const DEFAULT_THUMB_CACHE_MB: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub struct GalleryConfig {
    /// Image listing endpoint, queried with `limit` and `offset`.
    pub endpoint: String,
    /// Descriptors requested per batch.
    pub batch_limit: usize,
    /// Row height before each row is scaled to the container width.
    pub target_row_height: f32,
    pub request_timeout: Duration,
    pub probe_timeout: Duration,
    /// Horizontal travel in pixels a touch must exceed to count as a swipe.
    pub swipe_threshold: f64,
    /// Duration of each half of the lightbox slide transition.
    pub transition: Duration,
    /// In-memory thumbnail cache budget.
    pub thumb_cache_mb: usize,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            batch_limit: DEFAULT_BATCH_LIMIT,
            target_row_height: DEFAULT_ROW_HEIGHT,
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            probe_timeout: Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS),
            swipe_threshold: DEFAULT_SWIPE_THRESHOLD,
            transition: Duration::from_millis(DEFAULT_TRANSITION_MS),
            thumb_cache_mb: DEFAULT_THUMB_CACHE_MB,
        }
    }
}

impl GalleryConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup. Unparseable or
    /// non-positive values are skipped with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(endpoint) = lookup("GALLEROW_ENDPOINT").filter(|v| !v.trim().is_empty()) {
            config.endpoint = endpoint.trim().to_string();
        }
        if let Some(limit) = parse_positive::<usize>(&lookup, "GALLEROW_BATCH_LIMIT") {
            config.batch_limit = limit;
        }
        if let Some(height) = parse_positive::<f32>(&lookup, "GALLEROW_ROW_HEIGHT") {
            config.target_row_height = height;
        }
        if let Some(ms) = parse_positive::<u64>(&lookup, "GALLEROW_REQUEST_TIMEOUT_MS") {
            config.request_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_positive::<u64>(&lookup, "GALLEROW_PROBE_TIMEOUT_MS") {
            config.probe_timeout = Duration::from_millis(ms);
        }
        if let Some(px) = parse_positive::<f64>(&lookup, "GALLEROW_SWIPE_THRESHOLD") {
            config.swipe_threshold = px;
        }
        if let Some(ms) = parse_positive::<u64>(&lookup, "GALLEROW_TRANSITION_MS") {
            config.transition = Duration::from_millis(ms);
        }
        if let Some(mb) = parse_positive::<usize>(&lookup, "GALLEROW_THUMB_CACHE_MB") {
            config.thumb_cache_mb = mb;
        }

        config
    }

    /// Applies command-line arguments (program name excluded).
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if let Some(endpoint) = args
            .into_iter()
            .map(|a| a.as_ref().trim().to_string())
            .find(|a| !a.is_empty() && !a.starts_with('-'))
        {
            self.endpoint = endpoint;
        }
        self
    }
}

fn parse_positive<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => Some(value),
        _ => {
            warn!(key, value = %raw, "Ignoring invalid configuration value");
            None
        }
    }
}
