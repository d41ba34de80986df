#[derive(Debug, Clone, PartialEq)]
pub struct RowItem {
    /// Position of the record in the gallery list.
    pub index: usize,
    pub thumbnail_url: String,
    pub name: String,
    pub display_w: f32,
    pub display_h: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowModel {
    pub row_index: u32,
    pub height_px: f32,
    pub items: Vec<RowItem>,
}

impl RowModel {
    pub fn new(row_index: u32, height_px: f32, items: Vec<RowItem>) -> Self {
        Self {
            row_index,
            height_px,
            items,
        }
    }

    /// Sum of rendered item widths, excluding gaps.
    pub fn content_width(&self) -> f32 {
        self.items.iter().map(|item| item.display_w).sum()
    }
}
