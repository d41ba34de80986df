//! The shared, append-only list of gallery images.
//!
//! `GalleryState` owns every loaded `ImageRecord` plus the pagination offset.
//! Records are never removed or reordered, and no two records share a url.

use std::collections::{HashMap, HashSet};
use std::ops::Range;

use tracing::debug;

use crate::models::{ImageDescriptor, ImageRecord};

/// Result of merging one batch into the gallery list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// The backend returned nothing.
    Empty,
    /// Every record in the batch was already loaded.
    AllDuplicates { dropped: usize },
    /// New records were appended at `range`.
    Appended { range: Range<usize>, dropped: usize },
}

#[derive(Debug, Default)]
pub struct GalleryState {
    records: Vec<ImageRecord>,
    index_by_url: HashMap<String, usize>,
    /// Exclusive end index of every appended batch, ascending.
    batch_ends: Vec<usize>,
    offset: usize,
}

impl GalleryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of unique records appended so far; sent to the backend as the
    /// pagination cursor.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn records(&self) -> &[ImageRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&ImageRecord> {
        self.records.get(index)
    }

    pub fn contains_url(&self, url: &str) -> bool {
        self.index_by_url.contains_key(url)
    }

    pub fn index_of(&self, url: &str) -> Option<usize> {
        self.index_by_url.get(url).copied()
    }

    /// Merges a batch: drops urls already present (or repeated within the
    /// batch), appends the rest and advances the offset by the survivors only.
    pub fn append_batch(&mut self, batch: Vec<ImageDescriptor>) -> BatchOutcome {
        if batch.is_empty() {
            return BatchOutcome::Empty;
        }

        let total = batch.len();
        let mut seen = HashSet::with_capacity(total);
        let fresh: Vec<ImageDescriptor> = batch
            .into_iter()
            .filter(|desc| !self.index_by_url.contains_key(&desc.url))
            .filter(|desc| seen.insert(desc.url.clone()))
            .collect();
        let dropped = total - fresh.len();

        if fresh.is_empty() {
            debug!(dropped, "Batch contained only known images");
            return BatchOutcome::AllDuplicates { dropped };
        }

        let start = self.records.len();
        for desc in fresh {
            self.index_by_url.insert(desc.url.clone(), self.records.len());
            self.records.push(ImageRecord::from_descriptor(desc));
        }
        let end = self.records.len();
        self.offset += end - start;
        self.batch_ends.push(end);

        debug!(added = end - start, dropped, offset = self.offset, "Appended batch");
        BatchOutcome::Appended {
            range: start..end,
            dropped,
        }
    }

    /// Stores a resolved ratio. Returns false for unknown urls.
    pub fn set_ratio(&mut self, url: &str, ratio: f32) -> bool {
        match self.index_by_url.get(url) {
            Some(&index) => {
                self.records[index].ratio = Some(ratio);
                true
            }
            None => false,
        }
    }

    /// End of the contiguous run of ratio-resolved records starting at `from`.
    pub fn resolved_until(&self, from: usize) -> usize {
        let from = from.min(self.records.len());
        self.records[from..]
            .iter()
            .position(|record| !record.has_ratio())
            .map(|pos| from + pos)
            .unwrap_or(self.records.len())
    }

    /// End of the batch that holds record `index`.
    pub fn batch_end(&self, index: usize) -> Option<usize> {
        let pos = self.batch_ends.partition_point(|&end| end <= index);
        self.batch_ends.get(pos).copied()
    }

    /// End of the longest leading run of whole batches whose records all have
    /// ratios. A partly resolved batch is never included.
    pub fn resolved_batches_until(&self) -> usize {
        let resolved = self.resolved_until(0);
        let pos = self.batch_ends.partition_point(|&end| end <= resolved);
        pos.checked_sub(1)
            .map(|last| self.batch_ends[last])
            .unwrap_or(0)
    }

    /// Records in `range` that still need a ratio.
    pub fn unresolved_in(&self, range: Range<usize>) -> Vec<ImageRecord> {
        let end = range.end.min(self.records.len());
        let start = range.start.min(end);
        self.records[start..end]
            .iter()
            .filter(|record| !record.has_ratio())
            .cloned()
            .collect()
    }
}
