//! Thumbnail pipeline for the gallery.
//!
//! This module provides:
//! - `ThumbnailCache` - Disk and memory caching of thumbnail bytes
//! - `RatioProber` - Resolves thumbnail aspect ratios for the row layout

pub mod cache;
pub mod probe;

pub use cache::ThumbnailCache;
pub use probe::{ProbeOutcome, RatioProber};
