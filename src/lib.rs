//! gallerow: an incrementally loaded, justified photo gallery with a
//! swipeable lightbox.
//!
//! Everything except `ui` and `app` is toolkit-free and unit tested without a
//! display. The GTK front end is built with the `gui` feature.

pub mod config;
pub mod controller;
pub mod error;
pub mod layout;
pub mod loader;
pub mod models;
pub mod scroll;
pub mod thumbnails;
pub mod viewer;

#[cfg(feature = "gui")]
pub mod app;
#[cfg(feature = "gui")]
pub mod ui;

pub use config::GalleryConfig;
pub use controller::{GalleryController, LoadOutcome};
