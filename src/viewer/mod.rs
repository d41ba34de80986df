pub mod lightbox;
pub mod swipe;

pub use lightbox::{Lightbox, LightboxCommand, LightboxState, TransitionTick};
pub use swipe::{SlideFrame, SlidePhase, SlideTransition, SwipeDirection, SwipeTracker};
