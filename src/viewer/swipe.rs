//! Touch swipe detection and the lightbox slide transition.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    /// Finger moved right-to-left: show the next image.
    Left,
    /// Finger moved left-to-right: show the previous image.
    Right,
}

/// Tracks one horizontal touch gesture.
#[derive(Debug, Clone)]
pub struct SwipeTracker {
    threshold: f64,
    start_x: Option<f64>,
}

impl SwipeTracker {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.max(0.0),
            start_x: None,
        }
    }

    pub fn begin(&mut self, x: f64) {
        self.start_x = Some(x);
    }

    /// Finishes the gesture. Travel must strictly exceed the threshold.
    pub fn end(&mut self, x: f64) -> Option<SwipeDirection> {
        let start = self.start_x.take()?;
        if x < start - self.threshold {
            Some(SwipeDirection::Left)
        } else if x > start + self.threshold {
            Some(SwipeDirection::Right)
        } else {
            None
        }
    }

    pub fn cancel(&mut self) {
        self.start_x = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlidePhase {
    /// Current image slides away and fades out.
    Leaving,
    /// New image slides in from the opposite edge and fades in.
    Entering,
    Done,
}

/// Where the lightbox image should be drawn at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlideFrame {
    pub phase: SlidePhase,
    /// Horizontal offset as a fraction of the image width; negative is left.
    pub offset: f32,
    pub opacity: f32,
}

impl SlideFrame {
    pub const RESTING: SlideFrame = SlideFrame {
        phase: SlidePhase::Done,
        offset: 0.0,
        opacity: 1.0,
    };
}

/// Slide-out, swap, slide-in animation. Each half lasts `half`.
#[derive(Debug, Clone, Copy)]
pub struct SlideTransition {
    direction: SwipeDirection,
    started: Instant,
    half: Duration,
}

impl SlideTransition {
    pub fn new(direction: SwipeDirection, started: Instant, half: Duration) -> Self {
        Self {
            direction,
            started,
            half: half.max(Duration::from_millis(1)),
        }
    }

    pub fn direction(&self) -> SwipeDirection {
        self.direction
    }

    /// Instant at which the image source should be swapped.
    pub fn swap_at(&self) -> Instant {
        self.started + self.half
    }

    pub fn frame(&self, now: Instant) -> SlideFrame {
        let elapsed = now.saturating_duration_since(self.started);
        // Left swipes leave toward -1 and enter from +1.
        let exit_sign = match self.direction {
            SwipeDirection::Left => -1.0,
            SwipeDirection::Right => 1.0,
        };

        if elapsed < self.half {
            let t = elapsed.as_secs_f32() / self.half.as_secs_f32();
            let eased = ease(t);
            SlideFrame {
                phase: SlidePhase::Leaving,
                offset: exit_sign * eased,
                opacity: 1.0 - eased,
            }
        } else if elapsed < self.half * 2 {
            let t = (elapsed - self.half).as_secs_f32() / self.half.as_secs_f32();
            let eased = ease(t);
            SlideFrame {
                phase: SlidePhase::Entering,
                offset: -exit_sign * (1.0 - eased),
                opacity: eased,
            }
        } else {
            SlideFrame::RESTING
        }
    }
}

/// CSS `ease`-like curve, close enough for a slide.
fn ease(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_must_be_exceeded() {
        let mut tracker = SwipeTracker::new(50.0);
        tracker.begin(200.0);
        assert_eq!(tracker.end(150.0), None);

        tracker.begin(200.0);
        assert_eq!(tracker.end(149.0), Some(SwipeDirection::Left));

        tracker.begin(200.0);
        assert_eq!(tracker.end(251.0), Some(SwipeDirection::Right));

        tracker.begin(200.0);
        assert_eq!(tracker.end(250.0), None);
    }

    #[test]
    fn test_end_without_begin() {
        let mut tracker = SwipeTracker::new(50.0);
        assert_eq!(tracker.end(0.0), None);

        tracker.begin(500.0);
        tracker.cancel();
        assert_eq!(tracker.end(0.0), None);
    }

    #[test]
    fn test_transition_phases() {
        let start = Instant::now();
        let half = Duration::from_millis(300);
        let slide = SlideTransition::new(SwipeDirection::Left, start, half);

        let first = slide.frame(start);
        assert_eq!(first.phase, SlidePhase::Leaving);
        assert_eq!(first.offset, 0.0);
        assert_eq!(first.opacity, 1.0);

        let leaving = slide.frame(start + Duration::from_millis(150));
        assert_eq!(leaving.phase, SlidePhase::Leaving);
        assert!(leaving.offset < 0.0);
        assert!(leaving.opacity < 1.0);

        // Right after the swap the new image sits at the right edge.
        let entering = slide.frame(slide.swap_at());
        assert_eq!(entering.phase, SlidePhase::Entering);
        assert!((entering.offset - 1.0).abs() < 1e-6);
        assert_eq!(entering.opacity, 0.0);

        assert_eq!(slide.frame(start + half * 2), SlideFrame::RESTING);
    }

    #[test]
    fn test_right_swipe_mirrors_offsets() {
        let start = Instant::now();
        let half = Duration::from_millis(300);
        let slide = SlideTransition::new(SwipeDirection::Right, start, half);

        assert!(slide.frame(start + Duration::from_millis(100)).offset > 0.0);
        assert!(slide.frame(start + Duration::from_millis(400)).offset < 0.0);
    }
}
