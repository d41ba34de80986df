// Full-screen lightbox overlay
// Features:
// - Thumbnail shown at once, full-size image swapped in when it arrives
// - Prev/next/close buttons, click outside the image to close
// - Touch swipes reported to the window, which drives the slide animation
// - Fade-out on close, after which the image is released

use gdk4::Texture;
use gtk4::prelude::*;
use gtk4::{
    glib, Align, Box as GtkBox, Button, ContentFit, GestureClick, GestureDrag, Label,
    Orientation, Overlay, PickFlags, Picture, Widget,
};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

use crate::viewer::{LightboxCommand, SlideFrame};

/// Interval between animation frames.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Input the lightbox forwards to its owner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightboxEvent {
    Command(LightboxCommand),
    TouchBegin(f64),
    TouchEnd(f64),
}

type EventCallback = Rc<dyn Fn(LightboxEvent)>;

/// Rectangle `(x, y, w, h)` an image of `ratio` occupies when fitted inside
/// an `area_w` by `area_h` box and centred.
pub fn contained_rect(area_w: f64, area_h: f64, ratio: f64) -> (f64, f64, f64, f64) {
    if !(ratio > 0.0) || !(area_w > 0.0) || !(area_h > 0.0) {
        return (0.0, 0.0, area_w.max(0.0), area_h.max(0.0));
    }
    let (w, h) = if area_w / area_h > ratio {
        (area_h * ratio, area_h)
    } else {
        (area_w, area_w / ratio)
    };
    ((area_w - w) / 2.0, (area_h - h) / 2.0, w, h)
}

pub struct LightboxView {
    self_weak: RefCell<Weak<LightboxView>>,
    root: Overlay,
    picture: Picture,
    caption: Label,
    prev_button: Button,
    next_button: Button,
    close_button: Button,
    fade: Duration,
    fade_timer: RefCell<Option<glib::SourceId>>,
    on_event: RefCell<Option<EventCallback>>,
}

impl LightboxView {
    pub fn new(fade: Duration) -> Rc<Self> {
        let root = Overlay::new();
        root.add_css_class("lightbox");
        root.set_hexpand(true);
        root.set_vexpand(true);
        root.set_visible(false);

        let backdrop = GtkBox::new(Orientation::Vertical, 0);
        backdrop.add_css_class("lightbox-backdrop");
        backdrop.set_hexpand(true);
        backdrop.set_vexpand(true);
        root.set_child(Some(&backdrop));

        let picture = Picture::new();
        picture.set_content_fit(ContentFit::Contain);
        picture.set_can_shrink(true);
        picture.set_margin_top(48);
        picture.set_margin_bottom(48);
        root.add_overlay(&picture);

        let caption = Label::new(None);
        caption.add_css_class("lightbox-caption");
        caption.set_halign(Align::Center);
        caption.set_valign(Align::End);
        caption.set_margin_bottom(12);
        root.add_overlay(&caption);

        let prev_button = Button::with_label("<");
        prev_button.add_css_class("lightbox-nav");
        prev_button.set_halign(Align::Start);
        prev_button.set_valign(Align::Center);
        prev_button.set_margin_start(12);
        root.add_overlay(&prev_button);

        let next_button = Button::with_label(">");
        next_button.add_css_class("lightbox-nav");
        next_button.set_halign(Align::End);
        next_button.set_valign(Align::Center);
        next_button.set_margin_end(12);
        root.add_overlay(&next_button);

        let close_button = Button::with_label("x");
        close_button.add_css_class("lightbox-nav");
        close_button.set_halign(Align::End);
        close_button.set_valign(Align::Start);
        close_button.set_margin_top(12);
        close_button.set_margin_end(12);
        root.add_overlay(&close_button);

        let view = Rc::new(Self {
            self_weak: RefCell::new(Weak::new()),
            root,
            picture,
            caption,
            prev_button,
            next_button,
            close_button,
            fade,
            fade_timer: RefCell::new(None),
            on_event: RefCell::new(None),
        });
        *view.self_weak.borrow_mut() = Rc::downgrade(&view);

        view.setup_buttons();
        view.setup_gestures();
        view
    }

    pub fn widget(&self) -> &Overlay {
        &self.root
    }

    pub fn connect_event<F>(&self, callback: F)
    where
        F: Fn(LightboxEvent) + 'static,
    {
        *self.on_event.borrow_mut() = Some(Rc::new(callback));
    }

    fn emit(&self, event: LightboxEvent) {
        // Release the borrow before calling out; handlers may re-enter.
        let callback = self.on_event.borrow().clone();
        if let Some(callback) = callback {
            callback(event);
        }
    }

    fn setup_buttons(&self) {
        let buttons = [
            (&self.prev_button, LightboxCommand::Prev),
            (&self.next_button, LightboxCommand::Next),
            (&self.close_button, LightboxCommand::Close),
        ];
        for (button, command) in buttons {
            let view_weak = self.self_weak.borrow().clone();
            button.connect_clicked(move |_| {
                if let Some(view) = view_weak.upgrade() {
                    view.emit(LightboxEvent::Command(command));
                }
            });
        }
    }

    fn setup_gestures(&self) {
        // Clicks that land outside the painted image close the lightbox
        let click = GestureClick::new();
        click.set_button(1);
        let view_weak = self.self_weak.borrow().clone();
        click.connect_released(move |_, _n, x, y| {
            if let Some(view) = view_weak.upgrade() {
                if !view.hits_control(x, y) && !view.hits_image(x, y) {
                    view.emit(LightboxEvent::Command(LightboxCommand::Close));
                }
            }
        });
        self.root.add_controller(click);

        // Touch swipes
        let drag = GestureDrag::new();
        drag.set_touch_only(true);
        let view_weak = self.self_weak.borrow().clone();
        drag.connect_drag_begin(move |_, x, _y| {
            if let Some(view) = view_weak.upgrade() {
                view.emit(LightboxEvent::TouchBegin(x));
            }
        });
        let view_weak = self.self_weak.borrow().clone();
        drag.connect_drag_end(move |gesture, offset_x, _offset_y| {
            if let Some(view) = view_weak.upgrade() {
                if let Some((start_x, _)) = gesture.start_point() {
                    view.emit(LightboxEvent::TouchEnd(start_x + offset_x));
                }
            }
        });
        self.root.add_controller(drag);
    }

    fn hits_control(&self, x: f64, y: f64) -> bool {
        let Some(target) = self.root.pick(x, y, PickFlags::DEFAULT) else {
            return false;
        };
        [&self.prev_button, &self.next_button, &self.close_button]
            .into_iter()
            .any(|button| {
                let button: &Widget = button.upcast_ref();
                target == *button || target.is_ancestor(button)
            })
    }

    fn hits_image(&self, x: f64, y: f64) -> bool {
        let Some(bounds) = self.picture.compute_bounds(&self.root) else {
            return false;
        };
        let ratio = self
            .picture
            .paintable()
            .map(|paintable| paintable.intrinsic_aspect_ratio())
            .unwrap_or(0.0);
        let (rx, ry, rw, rh) = contained_rect(bounds.width() as f64, bounds.height() as f64, ratio);
        let left = bounds.x() as f64 + rx;
        let top = bounds.y() as f64 + ry;
        x >= left && x <= left + rw && y >= top && y <= top + rh
    }

    /// Shows the overlay at full opacity, cancelling a running fade-out.
    pub fn open(&self) {
        if let Some(id) = self.fade_timer.take() {
            id.remove();
        }
        self.apply_frame(&SlideFrame::RESTING);
        self.root.set_opacity(1.0);
        self.root.set_visible(true);
    }

    pub fn show(&self, texture: Option<&Texture>, caption: &str) {
        self.picture.set_paintable(texture);
        self.picture.set_alternative_text(Some(caption));
        self.caption.set_text(caption);
    }

    pub fn set_texture(&self, texture: &Texture) {
        self.picture.set_paintable(Some(texture));
    }

    pub fn set_nav(&self, has_prev: bool, has_next: bool) {
        self.prev_button.set_sensitive(has_prev);
        self.next_button.set_sensitive(has_next);
    }

    /// Positions the image for one frame of the slide transition.
    pub fn apply_frame(&self, frame: &SlideFrame) {
        self.picture.set_opacity(frame.opacity as f64);
        let shift = (frame.offset * self.root.width() as f32).round() as i32;
        if shift >= 0 {
            self.picture.set_margin_start(shift);
            self.picture.set_margin_end(0);
        } else {
            self.picture.set_margin_start(0);
            self.picture.set_margin_end(-shift);
        }
    }

    /// Fades the overlay out, then hides it and drops the image.
    pub fn close(&self) {
        if self.fade_timer.borrow().is_some() {
            return;
        }
        let started = Instant::now();
        let fade = self.fade.max(FRAME_INTERVAL);
        let view_weak = self.self_weak.borrow().clone();
        let id = glib::timeout_add_local(FRAME_INTERVAL, move || {
            let Some(view) = view_weak.upgrade() else {
                return glib::ControlFlow::Break;
            };
            let t = started.elapsed().as_secs_f64() / fade.as_secs_f64();
            if t >= 1.0 {
                view.fade_timer.take();
                view.root.set_visible(false);
                view.root.set_opacity(1.0);
                view.show(None, "");
                view.apply_frame(&SlideFrame::RESTING);
                return glib::ControlFlow::Break;
            }
            view.root.set_opacity(1.0 - t);
            glib::ControlFlow::Continue
        });
        self.fade_timer.replace(Some(id));
    }
}
