//! Gallery state owner.
//!
//! `GalleryController` holds the image list, the pagination cursor, the grid
//! and the lightbox. UI adapters call its methods on user events and apply the
//! returned updates; no toolkit types appear here.

use std::ops::Range;
use std::time::Instant;

use tracing::{debug, info};

use crate::config::GalleryConfig;
use crate::error::SourceError;
use crate::layout::{GridDensity, GridModel, GridUpdate, JustifiedLayout, Viewport};
use crate::loader::{LoadRequest, Pagination, TriggerState};
use crate::models::{BatchOutcome, GalleryState, ImageDescriptor, ImageRecord};
use crate::viewer::{Lightbox, LightboxCommand, SwipeDirection, TransitionTick};

/// What a finished load request did to the gallery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The result belonged to a request that is no longer current.
    Stale,
    /// The request failed; the trigger offers a retry.
    Failed(String),
    /// Empty or all-duplicate batch; pagination is over.
    Exhausted,
    /// New records at `range` need ratios before they can be laid out.
    Appended { range: Range<usize>, dropped: usize },
}

pub struct GalleryController {
    gallery: GalleryState,
    pagination: Pagination,
    layout: JustifiedLayout,
    grid: GridModel,
    density: GridDensity,
    viewport: Option<Viewport>,
    lightbox: Lightbox,
}

impl GalleryController {
    pub fn new(config: &GalleryConfig, density: GridDensity) -> Self {
        Self {
            gallery: GalleryState::new(),
            pagination: Pagination::new(config.batch_limit),
            layout: JustifiedLayout::new(config.target_row_height, 0.0),
            grid: GridModel::new(),
            density,
            viewport: None,
            lightbox: Lightbox::new(config.swipe_threshold, config.transition),
        }
    }

    pub fn gallery(&self) -> &GalleryState {
        &self.gallery
    }

    pub fn grid(&self) -> &GridModel {
        &self.grid
    }

    pub fn density(&self) -> GridDensity {
        self.density
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn trigger(&self) -> TriggerState {
        self.pagination.trigger()
    }

    pub fn lightbox(&self) -> &Lightbox {
        &self.lightbox
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Issues the next page request, if the trigger allows one.
    pub fn request_more(&mut self) -> Option<LoadRequest> {
        self.pagination.begin(self.gallery.offset())
    }

    /// Merges the answer to a request into the gallery.
    pub fn finish_load(
        &mut self,
        ticket: u64,
        result: Result<Vec<ImageDescriptor>, SourceError>,
    ) -> LoadOutcome {
        if !self.pagination.is_current(ticket) {
            debug!(ticket, "Dropping result of stale load request");
            return LoadOutcome::Stale;
        }

        let batch = match result {
            Ok(batch) => batch,
            Err(e) => {
                let reason = e.to_string();
                self.pagination.fail(ticket, reason.clone());
                return LoadOutcome::Failed(reason);
            }
        };

        match self.gallery.append_batch(batch) {
            BatchOutcome::Empty => {
                self.pagination.exhaust(ticket);
                LoadOutcome::Exhausted
            }
            BatchOutcome::AllDuplicates { dropped } => {
                info!(dropped, "Batch held only known images, stopping pagination");
                self.pagination.exhaust(ticket);
                LoadOutcome::Exhausted
            }
            BatchOutcome::Appended { range, dropped } => {
                self.pagination.complete(ticket);
                LoadOutcome::Appended { range, dropped }
            }
        }
    }

    /// Records in `range` whose ratio still has to be probed.
    pub fn unresolved(&self, range: Range<usize>) -> Vec<ImageRecord> {
        self.gallery.unresolved_in(range)
    }

    /// Stores resolved ratios and lays out whatever became ready.
    pub fn apply_ratios<I, S>(&mut self, ratios: I) -> Option<GridUpdate>
    where
        I: IntoIterator<Item = (S, f32)>,
        S: AsRef<str>,
    {
        for (url, ratio) in ratios {
            self.gallery.set_ratio(url.as_ref(), ratio);
        }
        let viewport = self.viewport?;
        self.grid
            .extend(&self.layout, &self.gallery, self.density, viewport)
    }

    // =========================================================================
    // Layout
    // =========================================================================

    /// Updates the layout dimensions. A changed size re-lays out everything.
    pub fn set_viewport(&mut self, viewport: Viewport) -> Option<GridUpdate> {
        if self.viewport == Some(viewport) {
            return None;
        }
        self.viewport = Some(viewport);
        Some(self.relayout_with(viewport))
    }

    /// Switches density. Returns the full re-layout when it changed.
    pub fn set_density(&mut self, density: GridDensity) -> Option<GridUpdate> {
        if self.density == density {
            return None;
        }
        info!(%density, "Grid density changed");
        self.density = density;
        let viewport = self.viewport?;
        Some(self.relayout_with(viewport))
    }

    pub fn relayout(&mut self) -> Option<GridUpdate> {
        let viewport = self.viewport?;
        Some(self.relayout_with(viewport))
    }

    fn relayout_with(&mut self, viewport: Viewport) -> GridUpdate {
        self.grid
            .relayout(&self.layout, &self.gallery, self.density, viewport)
    }

    // =========================================================================
    // Lightbox
    // =========================================================================

    /// Opens the lightbox on the record at `index`.
    pub fn open_lightbox(&mut self, index: usize) -> Option<&ImageRecord> {
        let index = self.lightbox.open(index, self.gallery.len())?;
        self.gallery.get(index)
    }

    /// Opens the lightbox on the record with `url`.
    pub fn open_lightbox_url(&mut self, url: &str) -> Option<&ImageRecord> {
        let index = self.gallery.index_of(url)?;
        self.open_lightbox(index)
    }

    pub fn lightbox_command(&mut self, command: LightboxCommand) -> bool {
        self.lightbox.apply(command, self.gallery.len())
    }

    pub fn current_image(&self) -> Option<&ImageRecord> {
        self.lightbox.current().and_then(|i| self.gallery.get(i))
    }

    pub fn touch_begin(&mut self, x: f64) {
        self.lightbox.touch_begin(x);
    }

    pub fn touch_end(&mut self, x: f64, now: Instant) -> Option<SwipeDirection> {
        self.lightbox.touch_end(x, self.gallery.len(), now)
    }

    pub fn tick_transition(&mut self, now: Instant) -> Option<TransitionTick> {
        self.lightbox.tick(now, self.gallery.len())
    }
}
