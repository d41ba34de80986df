// Main window for the gallerow photo gallery
// GTK4 ApplicationWindow with a justified thumbnail grid, a load-more footer
// and the lightbox overlay

use anyhow::Result;
use async_channel::Receiver;
use gdk4::{Display, Texture};
use gtk4::prelude::*;
use gtk4::{
    Align, Application, ApplicationWindow, Box as GtkBox, Button, ContentFit, CssProvider,
    GestureClick, Label, Orientation, Overlay, Picture, PolicyType, ScrolledWindow, Spinner,
    ToggleButton, STYLE_PROVIDER_PRIORITY_APPLICATION,
};
use lru::LruCache;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::ops::Range;
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::keybindings::{Keybindings, ViewMode};
use super::lightbox_view::{LightboxEvent, LightboxView, FRAME_INTERVAL};
use super::worker::{Worker, WorkerEvent};
use crate::config::GalleryConfig;
use crate::controller::{GalleryController, LoadOutcome};
use crate::error::SourceError;
use crate::layout::{GridDensity, GridUpdate, Viewport};
use crate::models::{CachedDimensions, ImageDescriptor, ImageRecord, RowModel, SettingsStore};
use crate::scroll::{ScrollAnchor, ScrollTopButton};
use crate::thumbnails::ProbeOutcome;
use crate::viewer::{LightboxCommand, SlideFrame};

/// Decoded thumbnails kept around for re-layouts.
const TEXTURE_CACHE_ENTRIES: usize = 512;
const RESIZE_DEBOUNCE: Duration = Duration::from_millis(80);

const CSS: &str = r#"
window {
    background-color: #111111;
    color: #e8e8e8;
}

.gallery-header {
    padding: 8px 16px;
    border-bottom: 1px solid #2a2a2a;
}

.gallery-title {
    font-weight: bold;
    font-size: 16px;
}

.gallery-hero {
    padding: 48px 16px;
}

.gallery-toolbar {
    padding: 8px 16px;
}

.gallery-row {
    padding: 0;
}

.gallery-thumb {
    background-color: #1c1c1c;
}

.gallery-footer {
    padding: 24px 16px;
}

.scroll-top {
    margin: 16px;
}

.lightbox-backdrop {
    background-color: rgba(0, 0, 0, 0.92);
}

.lightbox-caption {
    color: #cccccc;
}

.lightbox-nav {
    min-width: 40px;
    min-height: 40px;
    background-color: rgba(0, 0, 0, 0.4);
    color: #ffffff;
}
"#;

fn load_css() {
    let provider = CssProvider::new();
    provider.load_from_string(CSS);
    if let Some(display) = Display::default() {
        gtk4::style_context_add_provider_for_display(
            &display,
            &provider,
            STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
    }
}

fn texture_from_bytes(url: &str, bytes: &[u8]) -> Option<Texture> {
    match Texture::from_bytes(&glib::Bytes::from(bytes)) {
        Ok(texture) => Some(texture),
        Err(e) => {
            warn!(url, error = %e, "Failed to decode image for display");
            None
        }
    }
}

/// Main window of the gallery
pub struct GalleryWindow {
    self_weak: RefCell<Weak<GalleryWindow>>,
    window: ApplicationWindow,
    scroller: ScrolledWindow,
    hero: GtkBox,
    rows_box: GtkBox,
    load_button: Button,
    spinner: Spinner,
    status_label: Label,
    more_button: ToggleButton,
    less_button: ToggleButton,
    top_button: Button,
    lightbox_view: Rc<LightboxView>,
    keybindings: Keybindings,
    controller: RefCell<GalleryController>,
    worker: Worker,
    store: RefCell<Option<SettingsStore>>,
    textures: RefCell<LruCache<String, Texture>>,
    waiting_pictures: RefCell<HashMap<String, Vec<Picture>>>,
    scroll_top: RefCell<ScrollTopButton>,
    last_size: Cell<(i32, i32)>,
    resize_pending: Cell<bool>,
    slide_timer: RefCell<Option<glib::SourceId>>,
}

impl GalleryWindow {
    pub fn new(app: &Application, config: &GalleryConfig) -> Result<Rc<Self>> {
        load_css();

        let window = ApplicationWindow::builder()
            .application(app)
            .title("gallerow")
            .default_width(1200)
            .default_height(800)
            .build();

        // Header with the "scroll to gallery" link
        let header = GtkBox::new(Orientation::Horizontal, 8);
        header.add_css_class("gallery-header");
        let title = Label::new(Some("gallerow"));
        title.add_css_class("gallery-title");
        header.append(&title);
        let header_spacer = GtkBox::new(Orientation::Horizontal, 0);
        header_spacer.set_hexpand(true);
        header.append(&header_spacer);
        let gallery_link = Button::with_label("Gallery");
        gallery_link.add_css_class("flat");
        header.append(&gallery_link);

        let page = GtkBox::new(Orientation::Vertical, 0);

        let hero = GtkBox::new(Orientation::Vertical, 4);
        hero.add_css_class("gallery-hero");
        let hero_label = Label::new(Some(&config.endpoint));
        hero_label.set_halign(Align::Start);
        hero_label.set_selectable(true);
        hero.append(&hero_label);
        page.append(&hero);

        // Density toggle: two mutually exclusive buttons
        let toolbar = GtkBox::new(Orientation::Horizontal, 0);
        toolbar.add_css_class("gallery-toolbar");
        toolbar.add_css_class("linked");
        let more_button = ToggleButton::with_label("More");
        let less_button = ToggleButton::with_label("Less");
        less_button.set_group(Some(&more_button));
        toolbar.append(&more_button);
        toolbar.append(&less_button);
        page.append(&toolbar);

        let rows_box = GtkBox::new(Orientation::Vertical, 0);
        rows_box.set_halign(Align::Start);
        page.append(&rows_box);

        let footer = GtkBox::new(Orientation::Vertical, 8);
        footer.add_css_class("gallery-footer");
        let load_row = GtkBox::new(Orientation::Horizontal, 8);
        load_row.set_halign(Align::Center);
        let load_button = Button::with_label("Load More");
        let spinner = Spinner::new();
        spinner.set_visible(false);
        load_row.append(&load_button);
        load_row.append(&spinner);
        footer.append(&load_row);
        let status_label = Label::new(None);
        status_label.set_halign(Align::Center);
        status_label.set_wrap(true);
        footer.append(&status_label);
        page.append(&footer);

        let scroller = ScrolledWindow::builder()
            .hscrollbar_policy(PolicyType::Never)
            .vexpand(true)
            .child(&page)
            .build();

        let content = GtkBox::new(Orientation::Vertical, 0);
        content.append(&header);
        content.append(&scroller);

        let root = Overlay::new();
        root.set_child(Some(&content));

        let top_button = Button::with_label("Top");
        top_button.add_css_class("scroll-top");
        top_button.set_halign(Align::End);
        top_button.set_valign(Align::End);
        top_button.set_visible(false);
        root.add_overlay(&top_button);

        let lightbox_view = LightboxView::new(config.transition);
        root.add_overlay(lightbox_view.widget());

        window.set_child(Some(&root));

        let store = match SettingsStore::open_default() {
            Ok(store) => Some(store),
            Err(e) => {
                warn!(error = ?e, "Settings store unavailable, using defaults");
                None
            }
        };
        let density = store
            .as_ref()
            .map(|store| {
                store.grid_density().unwrap_or_else(|e| {
                    warn!(error = ?e, "Failed to read grid density");
                    GridDensity::default()
                })
            })
            .unwrap_or_default();
        info!(%density, "Restored grid density");

        let (events_tx, events_rx) = async_channel::unbounded();
        let worker = Worker::new(config, events_tx)?;

        let keybindings = Keybindings::new();
        keybindings.attach(&window);

        let this = Rc::new(Self {
            self_weak: RefCell::new(Weak::new()),
            window,
            scroller,
            hero,
            rows_box,
            load_button,
            spinner,
            status_label,
            more_button,
            less_button,
            top_button,
            lightbox_view,
            keybindings,
            controller: RefCell::new(GalleryController::new(config, density)),
            worker,
            store: RefCell::new(store),
            textures: RefCell::new(LruCache::new(
                NonZeroUsize::new(TEXTURE_CACHE_ENTRIES).unwrap_or(NonZeroUsize::MIN),
            )),
            waiting_pictures: RefCell::new(HashMap::new()),
            scroll_top: RefCell::new(ScrollTopButton::default()),
            last_size: Cell::new((0, 0)),
            resize_pending: Cell::new(false),
            slide_timer: RefCell::new(None),
        });
        *this.self_weak.borrow_mut() = Rc::downgrade(&this);

        match density {
            GridDensity::More => this.more_button.set_active(true),
            GridDensity::Less => this.less_button.set_active(true),
        }

        this.setup_controls(&gallery_link);
        this.setup_scroll_tracking();
        this.setup_lightbox();
        this.setup_resize_observer();
        this.spawn_event_pump(events_rx);

        this.update_trigger();
        this.request_more();

        Ok(this)
    }

    /// Present the window
    pub fn present(&self) {
        self.window.present();
    }

    fn weak(&self) -> Weak<GalleryWindow> {
        self.self_weak.borrow().clone()
    }

    fn setup_controls(&self, gallery_link: &Button) {
        let weak_self = self.weak();
        self.load_button.connect_clicked(move |_| {
            if let Some(window) = weak_self.upgrade() {
                window.request_more();
            }
        });

        for (button, density) in [
            (&self.more_button, GridDensity::More),
            (&self.less_button, GridDensity::Less),
        ] {
            let weak_self = self.weak();
            button.connect_toggled(move |button| {
                if !button.is_active() {
                    return;
                }
                if let Some(window) = weak_self.upgrade() {
                    window.set_density(density);
                }
            });
        }

        let weak_self = self.weak();
        gallery_link.connect_clicked(move |_| {
            if let Some(window) = weak_self.upgrade() {
                let gallery_top = window.hero.height() as f64;
                window.scroller.vadjustment().set_value(gallery_top);
            }
        });

        let weak_self = self.weak();
        self.top_button.connect_clicked(move |_| {
            if let Some(window) = weak_self.upgrade() {
                window.scroller.vadjustment().set_value(0.0);
            }
        });
    }

    fn setup_scroll_tracking(&self) {
        let weak_self = self.weak();
        self.scroller
            .vadjustment()
            .connect_value_changed(move |adjustment| {
                if let Some(window) = weak_self.upgrade() {
                    window.on_scrolled(adjustment.value());
                }
            });
    }

    fn setup_lightbox(&self) {
        let weak_self = self.weak();
        self.lightbox_view.connect_event(move |event| {
            if let Some(window) = weak_self.upgrade() {
                window.handle_lightbox_event(event);
            }
        });

        let weak_self = self.weak();
        self.keybindings.connect_command(move |command| {
            if let Some(window) = weak_self.upgrade() {
                window.handle_lightbox_event(LightboxEvent::Command(command));
            }
        });
    }

    fn setup_resize_observer(&self) {
        let weak_self = self.weak();
        self.scroller.add_tick_callback(move |_widget, _clock| {
            let Some(window) = weak_self.upgrade() else {
                return glib::ControlFlow::Break;
            };
            let size = (window.scroller.width(), window.window.width());
            if size.0 > 0 && size != window.last_size.get() {
                window.last_size.set(size);
                window.schedule_relayout_debounced(RESIZE_DEBOUNCE);
            }
            glib::ControlFlow::Continue
        });
    }

    fn spawn_event_pump(&self, events: Receiver<WorkerEvent>) {
        let weak_self = self.weak();
        glib::spawn_future_local(async move {
            while let Ok(event) = events.recv().await {
                let Some(window) = weak_self.upgrade() else {
                    break;
                };
                window.handle_worker_event(event);
            }
        });
    }

    fn handle_worker_event(&self, event: WorkerEvent) {
        match event {
            WorkerEvent::Batch { ticket, result } => self.on_batch(ticket, result),
            WorkerEvent::Ratios { known, probed } => self.on_ratios(known, probed),
            WorkerEvent::Thumbnail { url, bytes } => self.on_thumbnail(&url, &bytes),
            WorkerEvent::ThumbnailFailed { url } => self.on_thumbnail_failed(&url),
            WorkerEvent::FullImage { index, bytes } => self.on_full_image(index, &bytes),
        }
    }

    // Loading

    fn request_more(&self) {
        let request = self.controller.borrow_mut().request_more();
        if let Some(request) = request {
            debug!(
                ticket = request.ticket,
                offset = request.offset,
                limit = request.limit,
                "Requesting image batch"
            );
            self.worker.load(request);
        }
        self.update_trigger();
    }

    fn update_trigger(&self) {
        let trigger = self.controller.borrow().trigger();
        self.load_button.set_label(trigger.label);
        self.load_button.set_sensitive(trigger.enabled);
        self.spinner.set_visible(trigger.busy);
        self.spinner.set_spinning(trigger.busy);
    }

    pub fn set_status(&self, status: &str) {
        self.status_label.set_text(status);
    }

    fn on_batch(&self, ticket: u64, result: Result<Vec<ImageDescriptor>, SourceError>) {
        let outcome = self.controller.borrow_mut().finish_load(ticket, result);
        let total = self.controller.borrow().gallery().len();
        match outcome {
            LoadOutcome::Stale => {}
            LoadOutcome::Failed(reason) => {
                self.set_status(&format!("Could not load images: {reason}"));
            }
            LoadOutcome::Exhausted => {
                info!(total, "Image listing exhausted");
                self.set_status(&format!("{total} images"));
            }
            LoadOutcome::Appended { range, dropped } => {
                info!(added = range.len(), dropped, total, "Appended image batch");
                self.set_status(&format!("{total} images"));
                self.resolve_ratios(range);
                self.sync_lightbox_nav();
            }
        }
        self.update_trigger();
    }

    /// Serves ratios from the store where possible and probes the rest. The
    /// whole batch reaches the controller in a single update.
    fn resolve_ratios(&self, range: Range<usize>) {
        let pending = self.controller.borrow().unresolved(range);
        let mut cached_ratios = Vec::new();
        let mut to_probe = Vec::new();

        let cached = match self.store.borrow().as_ref() {
            Some(store) => {
                let urls: Vec<&str> = pending.iter().map(|r| r.url.as_str()).collect();
                store.get_dimensions_batch(&urls).unwrap_or_else(|e| {
                    warn!(error = ?e, "Failed to read cached dimensions");
                    HashMap::new()
                })
            }
            None => HashMap::new(),
        };

        for record in pending {
            match cached.get(&record.url).and_then(CachedDimensions::ratio) {
                Some(ratio) => cached_ratios.push((record.url, ratio)),
                None => to_probe.push(record),
            }
        }

        if !cached_ratios.is_empty() {
            debug!(hits = cached_ratios.len(), "Ratios served from store");
        }
        if to_probe.is_empty() {
            self.on_ratios(cached_ratios, Vec::new());
        } else {
            self.worker.probe(cached_ratios, to_probe);
        }
    }

    fn on_ratios(&self, known: Vec<(String, f32)>, probed: Vec<ProbeOutcome>) {
        let entries: Vec<(String, CachedDimensions)> = probed
            .iter()
            .filter_map(|outcome| {
                outcome
                    .dimensions
                    .map(|(width, height)| (outcome.url.clone(), CachedDimensions { width, height }))
            })
            .collect();
        if !entries.is_empty() {
            if let Some(store) = self.store.borrow_mut().as_mut() {
                if let Err(e) = store.put_dimensions_batch(&entries) {
                    warn!(error = ?e, "Failed to persist thumbnail dimensions");
                }
            }
        }

        let ratios = known
            .into_iter()
            .chain(probed.into_iter().map(|o| (o.url, o.ratio)));
        let update = self.controller.borrow_mut().apply_ratios(ratios);
        self.apply_grid_update(update);
    }

    // Grid

    fn set_density(&self, density: GridDensity) {
        if self.controller.borrow().density() == density {
            return;
        }
        let update = self.controller.borrow_mut().set_density(density);
        if let Some(store) = self.store.borrow().as_ref() {
            if let Err(e) = store.set_grid_density(density) {
                warn!(error = ?e, "Failed to persist grid density");
            }
        }
        self.apply_grid_update(update);
    }

    fn schedule_relayout_debounced(&self, delay: Duration) {
        if self.resize_pending.replace(true) {
            return;
        }
        let weak_self = self.weak();
        glib::timeout_add_local(delay, move || {
            if let Some(window) = weak_self.upgrade() {
                window.resize_pending.set(false);
                window.relayout_to_allocation();
            }
            glib::ControlFlow::Break
        });
    }

    fn relayout_to_allocation(&self) {
        let (container, window_width) = self.last_size.get();
        if container <= 0 {
            return;
        }
        let viewport = Viewport::new(container as f32, window_width as f32);
        let update = self.controller.borrow_mut().set_viewport(viewport);
        self.apply_grid_update(update);
    }

    fn apply_grid_update(&self, update: Option<GridUpdate>) {
        let Some(update) = update else {
            return;
        };
        let adjustment = self.scroller.vadjustment();
        let anchor = ScrollAnchor::capture(adjustment.value());
        if let GridUpdate::Replace(_) = update {
            self.clear_rows();
        }
        for row in update.rows() {
            self.append_row(row);
        }
        // Restore once the new rows have been measured
        glib::idle_add_local_once(move || {
            let max = adjustment.upper() - adjustment.page_size();
            adjustment.set_value(anchor.restore_within(max));
        });
    }

    fn clear_rows(&self) {
        while let Some(child) = self.rows_box.first_child() {
            self.rows_box.remove(&child);
        }
        self.waiting_pictures.borrow_mut().clear();
    }

    fn append_row(&self, row: &RowModel) {
        let row_box = GtkBox::new(Orientation::Horizontal, 0);
        row_box.add_css_class("gallery-row");

        for item in &row.items {
            let picture = Picture::new();
            picture.add_css_class("gallery-thumb");
            picture.set_content_fit(ContentFit::Cover);
            picture.set_can_shrink(true);
            // Floor so rounding never pushes a row past the container
            picture.set_size_request(
                item.display_w.floor().max(1.0) as i32,
                item.display_h.floor().max(1.0) as i32,
            );
            picture.set_alternative_text(Some(&item.name));
            picture.set_cursor_from_name(Some("pointer"));

            let click = GestureClick::new();
            let index = item.index;
            let weak_self = self.weak();
            click.connect_released(move |_, _n, _x, _y| {
                if let Some(window) = weak_self.upgrade() {
                    window.open_lightbox(index);
                }
            });
            picture.add_controller(click);

            self.attach_thumbnail(&picture, &item.thumbnail_url);
            row_box.append(&picture);
        }

        self.rows_box.append(&row_box);
    }

    fn texture_for(&self, url: &str) -> Option<Texture> {
        if let Some(texture) = self.textures.borrow_mut().get(url) {
            return Some(texture.clone());
        }
        let bytes = self.worker.cache().get_memory(url)?;
        let texture = texture_from_bytes(url, &bytes)?;
        self.textures
            .borrow_mut()
            .put(url.to_string(), texture.clone());
        Some(texture)
    }

    fn attach_thumbnail(&self, picture: &Picture, url: &str) {
        if let Some(texture) = self.texture_for(url) {
            picture.set_paintable(Some(&texture));
            return;
        }
        let mut waiting = self.waiting_pictures.borrow_mut();
        let pictures = waiting.entry(url.to_string()).or_default();
        if pictures.is_empty() {
            self.worker.thumbnail(url.to_string());
        }
        pictures.push(picture.clone());
    }

    fn on_thumbnail(&self, url: &str, bytes: &[u8]) {
        let Some(pictures) = self.waiting_pictures.borrow_mut().remove(url) else {
            return;
        };
        let Some(texture) = texture_from_bytes(url, bytes) else {
            return;
        };
        self.textures
            .borrow_mut()
            .put(url.to_string(), texture.clone());
        for picture in pictures {
            picture.set_paintable(Some(&texture));
        }
    }

    /// Forgets the pending request so the next attach retries the download.
    fn on_thumbnail_failed(&self, url: &str) {
        if let Some(pictures) = self.waiting_pictures.borrow_mut().remove(url) {
            debug!(url, waiting = pictures.len(), "Thumbnail unavailable");
        }
    }

    // Scrolling

    fn on_scrolled(&self, offset: f64) {
        let visible = self.scroll_top.borrow_mut().on_scroll(offset, Instant::now());
        self.top_button.set_visible(visible);
        if !visible {
            return;
        }
        let linger = self.scroll_top.borrow().linger();
        let weak_self = self.weak();
        glib::timeout_add_local_once(linger, move || {
            if let Some(window) = weak_self.upgrade() {
                if !window.scroll_top.borrow().is_visible(Instant::now()) {
                    window.top_button.set_visible(false);
                }
            }
        });
    }

    // Lightbox

    fn open_lightbox(&self, index: usize) {
        let record = self.controller.borrow_mut().open_lightbox(index).cloned();
        let Some(record) = record else {
            return;
        };
        self.stop_slide_timer();
        self.show_lightbox_record(index, &record);
        self.lightbox_view.open();
        self.keybindings.set_view_mode(ViewMode::Lightbox);
        self.sync_lightbox_nav();
    }

    fn show_lightbox_record(&self, index: usize, record: &ImageRecord) {
        let preview = self.texture_for(&record.thumbnail_url);
        self.lightbox_view.show(preview.as_ref(), &record.name);
        self.worker.full_image(index, record.url.clone());
    }

    fn show_current(&self) {
        let current = {
            let controller = self.controller.borrow();
            controller
                .lightbox()
                .current()
                .zip(controller.current_image().cloned())
        };
        if let Some((index, record)) = current {
            self.show_lightbox_record(index, &record);
        }
        self.sync_lightbox_nav();
    }

    fn sync_lightbox_nav(&self) {
        let controller = self.controller.borrow();
        let lightbox = controller.lightbox();
        if lightbox.is_open() {
            self.lightbox_view.set_nav(
                lightbox.has_prev(),
                lightbox.has_next(controller.gallery().len()),
            );
        }
    }

    fn on_full_image(&self, index: usize, bytes: &[u8]) {
        // A later navigation makes this download stale
        let current = self.controller.borrow().lightbox().current();
        if current != Some(index) {
            return;
        }
        let url = self
            .controller
            .borrow()
            .gallery()
            .get(index)
            .map(|record| record.url.clone())
            .unwrap_or_default();
        if let Some(texture) = texture_from_bytes(&url, bytes) {
            self.lightbox_view.set_texture(&texture);
        }
    }

    fn handle_lightbox_event(&self, event: LightboxEvent) {
        match event {
            LightboxEvent::Command(LightboxCommand::Close) => self.close_lightbox(),
            LightboxEvent::Command(command) => {
                let changed = self.controller.borrow_mut().lightbox_command(command);
                if changed {
                    self.stop_slide_timer();
                    self.lightbox_view.apply_frame(&SlideFrame::RESTING);
                    self.show_current();
                }
            }
            LightboxEvent::TouchBegin(x) => self.controller.borrow_mut().touch_begin(x),
            LightboxEvent::TouchEnd(x) => {
                let started = self.controller.borrow_mut().touch_end(x, Instant::now());
                if started.is_some() {
                    self.start_slide_timer();
                }
            }
        }
    }

    fn close_lightbox(&self) {
        let closed = self
            .controller
            .borrow_mut()
            .lightbox_command(LightboxCommand::Close);
        if closed {
            self.stop_slide_timer();
            self.keybindings.set_view_mode(ViewMode::Grid);
            self.lightbox_view.close();
        }
    }

    fn start_slide_timer(&self) {
        self.stop_slide_timer();
        let weak_self = self.weak();
        let id = glib::timeout_add_local(FRAME_INTERVAL, move || {
            let Some(window) = weak_self.upgrade() else {
                return glib::ControlFlow::Break;
            };
            let tick = window
                .controller
                .borrow_mut()
                .tick_transition(Instant::now());
            let Some(tick) = tick else {
                window.slide_timer.take();
                return glib::ControlFlow::Break;
            };
            if tick.swapped_to.is_some() {
                window.show_current();
            }
            window.lightbox_view.apply_frame(&tick.frame);
            if tick.finished {
                window.slide_timer.take();
                glib::ControlFlow::Break
            } else {
                glib::ControlFlow::Continue
            }
        });
        self.slide_timer.replace(Some(id));
    }

    fn stop_slide_timer(&self) {
        if let Some(id) = self.slide_timer.take() {
            id.remove();
        }
    }
}
