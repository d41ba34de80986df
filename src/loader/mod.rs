//! Incremental loading of image descriptors.
//!
//! This module provides:
//! - `ImageSource` - The paged listing seam, with HTTP and in-memory sources
//! - `Pagination` - The load-more state machine (loading, exhausted, failed)

pub mod pagination;
pub mod source;

pub use pagination::{LoadRequest, LoadState, Pagination, TriggerState};
pub use source::{fetch_with_timeout, HttpImageSource, ImageSource, StaticImageSource};
