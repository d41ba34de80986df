use crate::models::{ImageRecord, RowItem, RowModel};

/// Configuration for the justified row layout.
///
/// Rows hold at most `capacity` images. Each row is scaled uniformly so the
/// images (plus gaps) span the full container width.
#[derive(Debug, Clone)]
pub struct JustifiedLayout {
    /// Row height before scaling, in pixels (default: 200)
    pub target_height: f32,
    /// Gap between items in a row in pixels (default: 0)
    pub gap: f32,
}

impl Default for JustifiedLayout {
    fn default() -> Self {
        Self {
            target_height: 200.0,
            gap: 0.0,
        }
    }
}

impl JustifiedLayout {
    pub fn new(target_height: f32, gap: f32) -> Self {
        Self {
            target_height: target_height.max(1.0),
            gap: gap.max(0.0),
        }
    }

    /// Packs records into rows of at most `capacity` images.
    ///
    /// # Algorithm
    /// 1. Walk records in order, summing `ratio * target_height` per row.
    /// 2. When the row holds `capacity` images, flush it with
    ///    `scale = available_width / summed_width`.
    /// 3. Flush any trailing partial row the same way, so it is also
    ///    stretched to the full width.
    ///
    /// # Arguments
    /// * `records` - Records to lay out, all with resolved ratios
    /// * `first_index` - Gallery index of `records[0]`
    /// * `first_row` - Row index assigned to the first emitted row
    /// * `container_width` - Width every row must fill
    /// * `capacity` - Maximum images per row
    pub fn compute(
        &self,
        records: &[ImageRecord],
        first_index: usize,
        first_row: u32,
        container_width: f32,
        capacity: usize,
    ) -> Vec<RowModel> {
        if records.is_empty() || !(container_width > 0.0) {
            return Vec::new();
        }
        let capacity = capacity.max(1);

        let mut rows = Vec::with_capacity(records.len().div_ceil(capacity));
        let mut pending: Vec<(usize, &ImageRecord)> = Vec::with_capacity(capacity);
        let mut row_width = 0.0f32;

        for (offset, record) in records.iter().enumerate() {
            pending.push((first_index + offset, record));
            row_width += record.aspect_ratio() * self.target_height;

            if pending.len() >= capacity {
                let row_index = first_row + rows.len() as u32;
                rows.push(self.flush_row(row_index, &pending, row_width, container_width));
                pending.clear();
                row_width = 0.0;
            }
        }

        if !pending.is_empty() {
            let row_index = first_row + rows.len() as u32;
            rows.push(self.flush_row(row_index, &pending, row_width, container_width));
        }

        rows
    }

    fn flush_row(
        &self,
        row_index: u32,
        pending: &[(usize, &ImageRecord)],
        row_width: f32,
        container_width: f32,
    ) -> RowModel {
        let gaps = self.gap * pending.len().saturating_sub(1) as f32;
        let available = (container_width - gaps).max(1.0);
        let scale = available / row_width.max(f32::EPSILON);
        let height = self.target_height * scale;

        let items = pending
            .iter()
            .map(|(index, record)| RowItem {
                index: *index,
                thumbnail_url: record.thumbnail_url.clone(),
                name: record.name.clone(),
                display_w: height * record.aspect_ratio(),
                display_h: height,
            })
            .collect();

        RowModel::new(row_index, height, items)
    }
}
