//! Scroll-related UI state that does not depend on the toolkit.

use std::time::{Duration, Instant};

/// Scroll offset past which the scroll-to-top button is offered.
pub const SCROLL_TOP_THRESHOLD: f64 = 300.0;

/// How long the button lingers after the last scroll event.
pub const SCROLL_TOP_LINGER: Duration = Duration::from_secs(5);

/// Visibility of the scroll-to-top button.
///
/// Shown while scrolled past the threshold, hidden again once scrolling has
/// been idle for the linger period.
#[derive(Debug, Clone)]
pub struct ScrollTopButton {
    threshold: f64,
    linger: Duration,
    last_scroll: Option<Instant>,
}

impl Default for ScrollTopButton {
    fn default() -> Self {
        Self::new(SCROLL_TOP_THRESHOLD, SCROLL_TOP_LINGER)
    }
}

impl ScrollTopButton {
    pub fn new(threshold: f64, linger: Duration) -> Self {
        Self {
            threshold,
            linger,
            last_scroll: None,
        }
    }

    pub fn linger(&self) -> Duration {
        self.linger
    }

    /// Records a scroll event; returns whether the button should show.
    pub fn on_scroll(&mut self, offset: f64, now: Instant) -> bool {
        if offset > self.threshold {
            self.last_scroll = Some(now);
            true
        } else {
            self.last_scroll = None;
            false
        }
    }

    pub fn is_visible(&self, now: Instant) -> bool {
        self.last_scroll
            .is_some_and(|last| now.saturating_duration_since(last) < self.linger)
    }
}

/// Scroll position captured before new rows are inserted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollAnchor {
    pub offset: f64,
}

impl ScrollAnchor {
    pub fn capture(offset: f64) -> Self {
        Self { offset }
    }

    /// Offset to restore, clamped to what the grown content allows.
    pub fn restore_within(&self, max_offset: f64) -> f64 {
        self.offset.clamp(0.0, max_offset.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_visibility() {
        let mut button = ScrollTopButton::default();
        let t0 = Instant::now();

        assert!(!button.on_scroll(120.0, t0));
        assert!(!button.is_visible(t0));

        assert!(button.on_scroll(301.0, t0));
        assert!(button.is_visible(t0 + Duration::from_secs(4)));
        assert!(!button.is_visible(t0 + SCROLL_TOP_LINGER));

        // Scrolling back up hides it straight away.
        button.on_scroll(900.0, t0);
        button.on_scroll(10.0, t0 + Duration::from_secs(1));
        assert!(!button.is_visible(t0 + Duration::from_secs(1)));
    }

    #[test]
    fn test_scroll_resets_linger() {
        let mut button = ScrollTopButton::default();
        let t0 = Instant::now();
        button.on_scroll(500.0, t0);
        button.on_scroll(520.0, t0 + Duration::from_secs(4));
        assert!(button.is_visible(t0 + Duration::from_secs(8)));
    }

    #[test]
    fn test_anchor_clamps() {
        let anchor = ScrollAnchor::capture(1200.0);
        assert_eq!(anchor.restore_within(5000.0), 1200.0);
        assert_eq!(anchor.restore_within(800.0), 800.0);
        assert_eq!(anchor.restore_within(-1.0), 0.0);
    }

    #[test]
    fn test_anchor_holds_position_when_rows_append() {
        // Rows added below the fold grow the range; the offset stays put.
        let anchor = ScrollAnchor::capture(640.0);
        let before = anchor.restore_within(700.0);
        let after = anchor.restore_within(1500.0);
        assert_eq!(before, 640.0);
        assert_eq!(after, 640.0);
    }
}
