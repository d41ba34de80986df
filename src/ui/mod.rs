//! GTK front end.
//!
//! This module provides:
//! - `GalleryWindow` - Thumbnail grid, load-more footer and density toggle
//! - `LightboxView` - Full-screen overlay with slide and fade animations
//! - `Keybindings` - Arrow and Escape keys for the lightbox
//! - `Worker` - Background I/O feeding results back to the main loop

pub mod keybindings;
pub mod lightbox_view;
pub mod window;
pub mod worker;

pub use keybindings::Keybindings;
pub use lightbox_view::{LightboxEvent, LightboxView};
pub use window::GalleryWindow;
pub use worker::{Worker, WorkerEvent};
