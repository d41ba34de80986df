//! Thumbnail byte caching with both disk and memory layers.
//!
//! - Disk cache: Stores downloaded thumbnails in XDG_CACHE_HOME/gallerow/thumbs/
//! - Memory cache: LRU of encoded bytes with a configurable size limit
//!
//! Filenames are based on xxhash of the thumbnail url.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, trace, warn};
use xxhash_rust::xxh3::xxh3_64;

/// Minimum memory cache size in megabytes.
const MIN_MEMORY_MB: usize = 8;

/// Maximum memory cache size in megabytes.
const MAX_MEMORY_MB: usize = 512;

/// Bump when the on-disk layout changes.
const THUMB_CACHE_VERSION: u8 = 1;

/// Upper bound on LRU entries regardless of byte budget.
const DEFAULT_LRU_CAPACITY: usize = 2048;

/// Cache key for thumbnail lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey(u64);

impl CacheKey {
    pub fn for_url(url: &str) -> Self {
        let mut data = Vec::with_capacity(url.len() + 1);
        data.push(THUMB_CACHE_VERSION);
        data.extend_from_slice(url.as_bytes());
        Self(xxh3_64(&data))
    }

    /// Get the filename for disk cache storage.
    pub fn disk_filename(&self) -> String {
        format!("{:016x}.thumb", self.0)
    }
}

struct MemoryLayer {
    entries: LruCache<CacheKey, Arc<[u8]>>,
    bytes: usize,
}

/// Thumbnail cache with disk and memory layers. Cheap to clone; clones share
/// the same storage.
#[derive(Clone)]
pub struct ThumbnailCache {
    cache_dir: Option<PathBuf>,
    max_memory_bytes: usize,
    memory: Arc<Mutex<MemoryLayer>>,
}

impl ThumbnailCache {
    /// Creates a cache rooted at `cache_dir` (or memory-only when `None`).
    pub fn new(cache_dir: Option<PathBuf>, max_memory_mb: usize) -> Self {
        let max_memory_mb = max_memory_mb.clamp(MIN_MEMORY_MB, MAX_MEMORY_MB);

        if let Some(dir) = &cache_dir {
            if let Err(e) = std::fs::create_dir_all(dir) {
                warn!(?dir, error = ?e, "Failed to create cache directory");
            }
        }

        debug!(?cache_dir, max_memory_mb, "Initialized thumbnail cache");

        Self {
            cache_dir,
            max_memory_bytes: max_memory_mb * 1024 * 1024,
            memory: Arc::new(Mutex::new(MemoryLayer {
                entries: LruCache::new(
                    NonZeroUsize::new(DEFAULT_LRU_CAPACITY).unwrap_or(NonZeroUsize::MIN),
                ),
                bytes: 0,
            })),
        }
    }

    /// Creates a cache in the default XDG cache directory.
    pub fn new_default(max_memory_mb: usize) -> Result<Self> {
        Ok(Self::new(Some(Self::default_cache_dir()?), max_memory_mb))
    }

    pub fn default_cache_dir() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("", "", "gallerow")
            .context("Failed to determine project directories")?;
        Ok(proj_dirs.cache_dir().join("thumbs"))
    }

    pub fn cache_dir(&self) -> Option<&Path> {
        self.cache_dir.as_deref()
    }

    fn disk_path(&self, key: CacheKey) -> Option<PathBuf> {
        self.cache_dir
            .as_ref()
            .map(|dir| dir.join(key.disk_filename()))
    }

    /// Memory lookup only.
    pub fn get_memory(&self, url: &str) -> Option<Arc<[u8]>> {
        let key = CacheKey::for_url(url);
        self.memory.lock().entries.get(&key).cloned()
    }

    /// Memory, then disk. Disk hits are promoted into memory.
    pub async fn get(&self, url: &str) -> Option<Arc<[u8]>> {
        if let Some(bytes) = self.get_memory(url) {
            trace!(url, "Thumbnail memory hit");
            return Some(bytes);
        }

        let path = self.disk_path(CacheKey::for_url(url))?;
        match tokio::fs::read(&path).await {
            Ok(bytes) if !bytes.is_empty() => {
                trace!(url, ?path, "Thumbnail disk hit");
                let bytes: Arc<[u8]> = bytes.into();
                self.insert_memory(url, Arc::clone(&bytes));
                Some(bytes)
            }
            _ => None,
        }
    }

    /// Stores bytes in memory and on disk.
    pub async fn put(&self, url: &str, bytes: Arc<[u8]>) {
        self.insert_memory(url, Arc::clone(&bytes));

        if let Some(path) = self.disk_path(CacheKey::for_url(url)) {
            if let Err(e) = tokio::fs::write(&path, &bytes[..]).await {
                warn!(?path, error = ?e, "Failed to write thumbnail to disk cache");
            }
        }
    }

    fn insert_memory(&self, url: &str, bytes: Arc<[u8]>) {
        let size = bytes.len();
        if size > self.max_memory_bytes {
            return;
        }

        let key = CacheKey::for_url(url);
        let mut memory = self.memory.lock();
        if let Some(old) = memory.entries.put(key, bytes) {
            memory.bytes -= old.len();
        }
        memory.bytes += size;

        while memory.bytes > self.max_memory_bytes {
            match memory.entries.pop_lru() {
                Some((_, evicted)) => memory.bytes -= evicted.len(),
                None => break,
            }
        }
    }

    /// Bytes currently held in memory.
    pub fn memory_usage(&self) -> usize {
        self.memory.lock().bytes
    }

    pub fn memory_entries(&self) -> usize {
        self.memory.lock().entries.len()
    }
}
