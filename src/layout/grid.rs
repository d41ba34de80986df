//! Rendered grid state: which records have been laid out and into which rows.
//!
//! Records are laid out one whole batch at a time, in gallery order. A batch
//! is packed only once every ratio in it is known, so rows appear in order
//! even when probes finish out of order.

use tracing::{debug, trace};

use super::{GridDensity, JustifiedLayout};
use crate::models::{GalleryState, RowModel};

/// Change the rendering surface must apply.
#[derive(Debug, Clone, PartialEq)]
pub enum GridUpdate {
    /// Drop every rendered row and show these instead.
    Replace(Vec<RowModel>),
    /// Add these rows after the existing ones.
    Append(Vec<RowModel>),
}

impl GridUpdate {
    pub fn rows(&self) -> &[RowModel] {
        match self {
            Self::Replace(rows) | Self::Append(rows) => rows,
        }
    }
}

/// Dimensions the grid is laid out against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Width each row must fill.
    pub container_width: f32,
    /// Window width used for the breakpoint table.
    pub viewport_width: f32,
}

impl Viewport {
    pub fn new(container_width: f32, viewport_width: f32) -> Self {
        Self {
            container_width,
            viewport_width,
        }
    }
}

#[derive(Debug, Default)]
pub struct GridModel {
    rows: Vec<RowModel>,
    laid_out: usize,
}

impl GridModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[RowModel] {
        &self.rows
    }

    /// Number of gallery records currently placed in rows.
    pub fn laid_out(&self) -> usize {
        self.laid_out
    }

    /// Clears the grid and repacks every fully resolved batch as one run.
    pub fn relayout(
        &mut self,
        layout: &JustifiedLayout,
        gallery: &GalleryState,
        density: GridDensity,
        viewport: Viewport,
    ) -> GridUpdate {
        let ready = gallery.resolved_batches_until();
        let capacity = density.row_capacity(viewport.viewport_width);
        self.rows = layout.compute(
            &gallery.records()[..ready],
            0,
            0,
            viewport.container_width,
            capacity,
        );
        self.laid_out = if self.rows.is_empty() { 0 } else { ready };

        debug!(
            rows = self.rows.len(),
            items = self.laid_out,
            capacity,
            "Full grid re-layout"
        );
        GridUpdate::Replace(self.rows.clone())
    }

    /// Lays out batches that became fully resolved since the last pass.
    ///
    /// Each batch is packed on its own and starts a fresh row. A batch waits
    /// until every record in it has a ratio, and later batches wait behind it.
    /// Returns `None` when nothing new is ready.
    pub fn extend(
        &mut self,
        layout: &JustifiedLayout,
        gallery: &GalleryState,
        density: GridDensity,
        viewport: Viewport,
    ) -> Option<GridUpdate> {
        let capacity = density.row_capacity(viewport.viewport_width);
        let mut rows: Vec<RowModel> = Vec::new();
        let mut cursor = self.laid_out;

        while let Some(end) = gallery.batch_end(cursor) {
            if gallery.resolved_until(cursor) < end {
                break;
            }
            let batch_rows = layout.compute(
                &gallery.records()[cursor..end],
                cursor,
                (self.rows.len() + rows.len()) as u32,
                viewport.container_width,
                capacity,
            );
            if batch_rows.is_empty() {
                break;
            }
            rows.extend(batch_rows);
            cursor = end;
        }

        if rows.is_empty() {
            trace!(laid_out = self.laid_out, "No newly resolved batch");
            return None;
        }

        debug!(
            new_rows = rows.len(),
            from = self.laid_out,
            to = cursor,
            "Appended grid rows"
        );
        self.laid_out = cursor;
        self.rows.extend(rows.iter().cloned());
        Some(GridUpdate::Append(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImageDescriptor;

    fn gallery_with(count: usize) -> GalleryState {
        let mut gallery = GalleryState::new();
        gallery.append_batch(
            (0..count)
                .map(|i| ImageDescriptor::new(format!("u{i}"), format!("t{i}"), format!("n{i}")))
                .collect(),
        );
        gallery
    }

    fn resolve(gallery: &mut GalleryState, indices: impl IntoIterator<Item = usize>) {
        for i in indices {
            gallery.set_ratio(&format!("u{i}"), 1.0 + (i % 3) as f32 * 0.25);
        }
    }

    #[test]
    fn test_empty_gallery_is_noop() {
        let mut grid = GridModel::new();
        let gallery = GalleryState::new();
        let update = grid.relayout(
            &JustifiedLayout::default(),
            &gallery,
            GridDensity::Less,
            Viewport::new(900.0, 900.0),
        );
        assert_eq!(update, GridUpdate::Replace(Vec::new()));
        assert_eq!(grid.laid_out(), 0);
        assert!(grid
            .extend(
                &JustifiedLayout::default(),
                &gallery,
                GridDensity::Less,
                Viewport::new(900.0, 900.0)
            )
            .is_none());
    }

    #[test]
    fn test_relayout_is_idempotent() {
        let layout = JustifiedLayout::default();
        let mut gallery = gallery_with(9);
        resolve(&mut gallery, 0..9);
        let viewport = Viewport::new(1200.0, 1200.0);

        let mut grid = GridModel::new();
        let first = grid.relayout(&layout, &gallery, GridDensity::More, viewport);
        let second = grid.relayout(&layout, &gallery, GridDensity::More, viewport);
        assert_eq!(first, second);
        assert_eq!(first.rows().len(), 3);
    }

    #[test]
    fn test_extend_only_renders_new_records() {
        let layout = JustifiedLayout::default();
        let mut gallery = gallery_with(3);
        resolve(&mut gallery, 0..3);
        let viewport = Viewport::new(900.0, 900.0);

        let mut grid = GridModel::new();
        let first = grid
            .extend(&layout, &gallery, GridDensity::Less, viewport)
            .unwrap();
        assert_eq!(first.rows().len(), 2);
        assert_eq!(grid.laid_out(), 3);

        gallery.append_batch(vec![ImageDescriptor::new("u3", "t3", "n3")]);
        resolve(&mut gallery, [3]);
        let update = grid
            .extend(&layout, &gallery, GridDensity::Less, viewport)
            .unwrap();
        match update {
            GridUpdate::Append(rows) => {
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].row_index, 2);
                assert_eq!(rows[0].items[0].index, 3);
            }
            other => panic!("expected append, got {other:?}"),
        }
        assert_eq!(grid.rows().len(), 3);
    }

    #[test]
    fn test_extend_waits_for_contiguous_prefix() {
        let layout = JustifiedLayout::default();
        let mut gallery = gallery_with(4);
        let viewport = Viewport::new(900.0, 900.0);
        let mut grid = GridModel::new();

        resolve(&mut gallery, [2, 3]);
        assert!(grid
            .extend(&layout, &gallery, GridDensity::Less, viewport)
            .is_none());

        resolve(&mut gallery, [0, 1]);
        let update = grid
            .extend(&layout, &gallery, GridDensity::Less, viewport)
            .unwrap();
        let indices: Vec<usize> = update
            .rows()
            .iter()
            .flat_map(|r| r.items.iter().map(|i| i.index))
            .collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_relayout_repacks_incremental_rows() {
        let layout = JustifiedLayout::default();
        let mut gallery = gallery_with(2);
        resolve(&mut gallery, 0..2);
        let viewport = Viewport::new(1100.0, 1100.0);
        let mut grid = GridModel::new();

        grid.extend(&layout, &gallery, GridDensity::Less, viewport);
        gallery.append_batch(vec![ImageDescriptor::new("u2", "t2", "n2")]);
        resolve(&mut gallery, [2]);
        grid.extend(&layout, &gallery, GridDensity::Less, viewport);
        // Incremental batches start fresh rows: [0, 1] + [2].
        assert_eq!(grid.rows().len(), 2);

        let update = grid.relayout(&layout, &gallery, GridDensity::Less, viewport);
        // Capacity 3 at 1100px packs everything into one row.
        assert_eq!(update.rows().len(), 1);
        assert_eq!(grid.laid_out(), 3);
    }

    #[test]
    fn test_later_batch_waits_and_packs_alone() {
        let layout = JustifiedLayout::default();
        let mut gallery = gallery_with(2);
        gallery.append_batch(
            (2..4)
                .map(|i| ImageDescriptor::new(format!("u{i}"), format!("t{i}"), format!("n{i}")))
                .collect(),
        );
        // Capacity 3 at 1100px would fit all four in two rows if packed together.
        let viewport = Viewport::new(1100.0, 1100.0);
        let mut grid = GridModel::new();

        resolve(&mut gallery, [2, 3]);
        assert!(grid
            .extend(&layout, &gallery, GridDensity::Less, viewport)
            .is_none());

        resolve(&mut gallery, [0, 1]);
        let update = grid
            .extend(&layout, &gallery, GridDensity::Less, viewport)
            .unwrap();
        let rows: Vec<Vec<usize>> = update
            .rows()
            .iter()
            .map(|r| r.items.iter().map(|i| i.index).collect())
            .collect();
        assert_eq!(rows, vec![vec![0, 1], vec![2, 3]]);
        assert_eq!(update.rows()[1].row_index, 1);
        assert_eq!(grid.laid_out(), 4);
    }

    #[test]
    fn test_relayout_skips_partial_batch() {
        let layout = JustifiedLayout::default();
        let mut gallery = gallery_with(2);
        gallery.append_batch(vec![
            ImageDescriptor::new("u2", "t2", "n2"),
            ImageDescriptor::new("u3", "t3", "n3"),
        ]);
        resolve(&mut gallery, 0..3);

        let mut grid = GridModel::new();
        let update = grid.relayout(&layout, &gallery, GridDensity::Less, Viewport::new(1100.0, 1100.0));
        assert_eq!(grid.laid_out(), 2);
        assert_eq!(update.rows().iter().map(|r| r.items.len()).sum::<usize>(), 2);
    }
}
