//! Full-screen lightbox navigation.
//!
//! The lightbox is either `Closed` or `Open { index }`. The gallery length is
//! passed in on every call so growth of the list while open is picked up
//! immediately.

use std::time::{Duration, Instant};

use tracing::{debug, trace};

use super::swipe::{SlideFrame, SlideTransition, SwipeDirection, SwipeTracker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightboxState {
    Closed,
    Open { index: usize },
}

/// User intent routed to the lightbox by the input adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightboxCommand {
    Prev,
    Next,
    Close,
}

/// Result of advancing an in-progress slide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionTick {
    pub frame: SlideFrame,
    /// Set on the tick where the image source was swapped.
    pub swapped_to: Option<usize>,
    pub finished: bool,
}

#[derive(Debug)]
pub struct Lightbox {
    state: LightboxState,
    swipe: SwipeTracker,
    transition: Option<SlideTransition>,
    swapped: bool,
    transition_half: Duration,
}

impl Lightbox {
    pub fn new(swipe_threshold: f64, transition_half: Duration) -> Self {
        Self {
            state: LightboxState::Closed,
            swipe: SwipeTracker::new(swipe_threshold),
            transition: None,
            swapped: false,
            transition_half,
        }
    }

    pub fn state(&self) -> LightboxState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, LightboxState::Open { .. })
    }

    pub fn current(&self) -> Option<usize> {
        match self.state {
            LightboxState::Open { index } => Some(index),
            LightboxState::Closed => None,
        }
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    pub fn has_next(&self, len: usize) -> bool {
        self.current().is_some_and(|i| i + 1 < len)
    }

    pub fn has_prev(&self) -> bool {
        self.current().is_some_and(|i| i > 0)
    }

    /// Opens (or retargets) the lightbox at `index`. Out-of-range indices
    /// are ignored.
    pub fn open(&mut self, index: usize, len: usize) -> Option<usize> {
        if index >= len {
            debug!(index, len, "Ignoring lightbox open past end of gallery");
            return None;
        }
        self.transition = None;
        self.swipe.cancel();
        self.state = LightboxState::Open { index };
        debug!(index, "Lightbox opened");
        Some(index)
    }

    /// Moves forward; saturates at the last image.
    pub fn next(&mut self, len: usize) -> Option<usize> {
        let index = self.current()?;
        if index + 1 >= len {
            return None;
        }
        self.state = LightboxState::Open { index: index + 1 };
        trace!(index = index + 1, "Lightbox next");
        Some(index + 1)
    }

    /// Moves backward; saturates at the first image.
    pub fn prev(&mut self) -> Option<usize> {
        let index = self.current()?;
        if index == 0 {
            return None;
        }
        self.state = LightboxState::Open { index: index - 1 };
        trace!(index = index - 1, "Lightbox prev");
        Some(index - 1)
    }

    pub fn close(&mut self) -> bool {
        if !self.is_open() {
            return false;
        }
        self.state = LightboxState::Closed;
        self.transition = None;
        self.swipe.cancel();
        debug!("Lightbox closed");
        true
    }

    /// Applies a command. Returns true if the state changed. A running slide
    /// is abandoned.
    pub fn apply(&mut self, command: LightboxCommand, len: usize) -> bool {
        if !self.is_open() {
            return false;
        }
        self.transition = None;
        match command {
            LightboxCommand::Prev => self.prev().is_some(),
            LightboxCommand::Next => self.next(len).is_some(),
            LightboxCommand::Close => self.close(),
        }
    }

    pub fn touch_begin(&mut self, x: f64) {
        if self.is_open() {
            self.swipe.begin(x);
        }
    }

    /// Finishes a touch. Starts a slide when the swipe can actually move;
    /// swipes during a running slide are dropped.
    pub fn touch_end(&mut self, x: f64, len: usize, now: Instant) -> Option<SwipeDirection> {
        let direction = self.swipe.end(x)?;
        if self.transition.is_some() {
            return None;
        }
        let possible = match direction {
            SwipeDirection::Left => self.has_next(len),
            SwipeDirection::Right => self.has_prev(),
        };
        if !possible {
            trace!(?direction, "Swipe at gallery edge ignored");
            return None;
        }
        self.transition = Some(SlideTransition::new(direction, now, self.transition_half));
        self.swapped = false;
        debug!(?direction, "Lightbox slide started");
        Some(direction)
    }

    /// Advances the running slide. The index moves on the tick that crosses
    /// the swap point.
    pub fn tick(&mut self, now: Instant, len: usize) -> Option<TransitionTick> {
        let transition = self.transition?;
        let mut swapped_to = None;

        if !self.swapped && now >= transition.swap_at() {
            self.swapped = true;
            swapped_to = match transition.direction() {
                SwipeDirection::Left => self.next(len),
                SwipeDirection::Right => self.prev(),
            };
        }

        let frame = transition.frame(now);
        let finished = frame == SlideFrame::RESTING;
        if finished {
            self.transition = None;
        }

        Some(TransitionTick {
            frame,
            swapped_to,
            finished,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HALF: Duration = Duration::from_millis(300);

    fn lightbox() -> Lightbox {
        Lightbox::new(50.0, HALF)
    }

    #[test]
    fn test_open_and_close() {
        let mut lb = lightbox();
        assert_eq!(lb.state(), LightboxState::Closed);
        assert_eq!(lb.open(3, 5), Some(3));
        assert_eq!(lb.state(), LightboxState::Open { index: 3 });
        assert!(lb.close());
        assert_eq!(lb.current(), None);
        assert!(!lb.close());
    }

    #[test]
    fn test_open_out_of_range_is_ignored() {
        let mut lb = lightbox();
        assert_eq!(lb.open(5, 5), None);
        assert!(!lb.is_open());
    }

    #[test]
    fn test_reopen_retargets() {
        let mut lb = lightbox();
        lb.open(1, 5);
        lb.open(4, 5);
        assert_eq!(lb.current(), Some(4));
    }

    #[test]
    fn test_saturation() {
        let mut lb = lightbox();
        lb.open(0, 3);
        assert_eq!(lb.prev(), None);
        assert_eq!(lb.current(), Some(0));

        lb.open(2, 3);
        assert_eq!(lb.next(3), None);
        assert_eq!(lb.current(), Some(2));
    }

    #[test]
    fn test_next_k_times() {
        for start in 0..6 {
            for k in 0..9 {
                let mut lb = lightbox();
                lb.open(start, 6);
                for _ in 0..k {
                    lb.next(6);
                }
                assert_eq!(lb.current(), Some((start + k).min(5)));
            }
        }
    }

    #[test]
    fn test_growth_unblocks_next() {
        let mut lb = lightbox();
        lb.open(9, 10);
        assert_eq!(lb.next(10), None);
        assert_eq!(lb.next(20), Some(10));
    }

    #[test]
    fn test_commands_ignored_while_closed() {
        let mut lb = lightbox();
        assert!(!lb.apply(LightboxCommand::Next, 5));
        assert!(!lb.apply(LightboxCommand::Close, 5));
        assert_eq!(lb.next(5), None);
        assert_eq!(lb.prev(), None);
    }

    #[test]
    fn test_commands() {
        let mut lb = lightbox();
        lb.open(1, 3);
        assert!(lb.apply(LightboxCommand::Next, 3));
        assert!(!lb.apply(LightboxCommand::Next, 3));
        assert!(lb.apply(LightboxCommand::Prev, 3));
        assert!(lb.apply(LightboxCommand::Close, 3));
        assert!(!lb.is_open());
    }

    #[test]
    fn test_swipe_left_swaps_at_midpoint() {
        let mut lb = lightbox();
        lb.open(0, 3);
        let t0 = Instant::now();

        lb.touch_begin(300.0);
        assert_eq!(lb.touch_end(200.0, 3, t0), Some(SwipeDirection::Left));
        assert!(lb.is_animating());

        let early = lb.tick(t0 + Duration::from_millis(100), 3).unwrap();
        assert_eq!(early.swapped_to, None);
        assert_eq!(lb.current(), Some(0));

        let mid = lb.tick(t0 + HALF, 3).unwrap();
        assert_eq!(mid.swapped_to, Some(1));
        assert_eq!(lb.current(), Some(1));

        let later = lb.tick(t0 + Duration::from_millis(450), 3).unwrap();
        assert_eq!(later.swapped_to, None);
        assert!(!later.finished);

        let done = lb.tick(t0 + HALF * 2, 3).unwrap();
        assert!(done.finished);
        assert!(!lb.is_animating());
        assert!(lb.tick(t0 + HALF * 3, 3).is_none());
    }

    #[test]
    fn test_swipe_at_edges_is_ignored() {
        let mut lb = lightbox();
        lb.open(0, 2);
        let now = Instant::now();

        lb.touch_begin(100.0);
        assert_eq!(lb.touch_end(300.0, 2, now), None);

        lb.open(1, 2);
        lb.touch_begin(300.0);
        assert_eq!(lb.touch_end(100.0, 2, now), None);
        assert!(!lb.is_animating());
    }

    #[test]
    fn test_short_swipe_does_nothing() {
        let mut lb = lightbox();
        lb.open(1, 3);
        lb.touch_begin(300.0);
        assert_eq!(lb.touch_end(250.0, 3, Instant::now()), None);
        assert_eq!(lb.current(), Some(1));
    }

    #[test]
    fn test_swipe_during_slide_is_dropped() {
        let mut lb = lightbox();
        lb.open(1, 5);
        let t0 = Instant::now();
        lb.touch_begin(300.0);
        lb.touch_end(100.0, 5, t0);

        lb.touch_begin(300.0);
        assert_eq!(lb.touch_end(100.0, 5, t0 + Duration::from_millis(50)), None);

        lb.tick(t0 + HALF * 2, 5);
        assert_eq!(lb.current(), Some(2));
    }

    #[test]
    fn test_command_abandons_slide() {
        let mut lb = lightbox();
        lb.open(1, 5);
        let t0 = Instant::now();
        lb.touch_begin(300.0);
        lb.touch_end(100.0, 5, t0);
        assert!(lb.apply(LightboxCommand::Prev, 5));
        assert!(!lb.is_animating());
        assert_eq!(lb.current(), Some(0));
        assert!(lb.tick(t0 + HALF, 5).is_none());
    }

    #[test]
    fn test_close_cancels_slide() {
        let mut lb = lightbox();
        lb.open(1, 5);
        let t0 = Instant::now();
        lb.touch_begin(100.0);
        lb.touch_end(300.0, 5, t0);
        lb.close();
        assert!(lb.tick(t0 + HALF, 5).is_none());
        assert_eq!(lb.current(), None);
    }
}
