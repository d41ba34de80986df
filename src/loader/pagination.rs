//! Pagination state machine for the load-more trigger.
//!
//! ```text
//! Idle --begin--> Loading --appended--> Idle
//!                    |------empty / all duplicates--> Exhausted (terminal)
//!                    `------error / timeout---------> Failed --begin--> Loading
//! ```

use std::time::Instant;

use tracing::{debug, info, warn};

/// One issued request; results must quote the ticket back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadRequest {
    pub ticket: u64,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Idle,
    Loading { ticket: u64, started: Instant },
    Exhausted,
    Failed { reason: String },
}

/// How the load-more control should look.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerState {
    pub label: &'static str,
    pub enabled: bool,
    pub busy: bool,
}

pub const LABEL_LOAD_MORE: &str = "Load More";
pub const LABEL_LOADING: &str = "Loading...";
pub const LABEL_EXHAUSTED: &str = "No More Images";
pub const LABEL_RETRY: &str = "Retry";

#[derive(Debug)]
pub struct Pagination {
    limit: usize,
    state: LoadState,
    next_ticket: u64,
}

impl Pagination {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            state: LoadState::Idle,
            next_ticket: 1,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Starts a request at `offset`, unless one is in flight or the listing
    /// is exhausted.
    pub fn begin(&mut self, offset: usize) -> Option<LoadRequest> {
        match self.state {
            LoadState::Loading { ticket, .. } => {
                debug!(ticket, "Load already in flight");
                None
            }
            LoadState::Exhausted => None,
            LoadState::Idle | LoadState::Failed { .. } => {
                let ticket = self.next_ticket;
                self.next_ticket += 1;
                self.state = LoadState::Loading {
                    ticket,
                    started: Instant::now(),
                };
                debug!(ticket, offset, limit = self.limit, "Starting image batch request");
                Some(LoadRequest {
                    ticket,
                    limit: self.limit,
                    offset,
                })
            }
        }
    }

    /// True if `ticket` is the request currently in flight.
    pub fn is_current(&self, ticket: u64) -> bool {
        matches!(self.state, LoadState::Loading { ticket: current, .. } if current == ticket)
    }

    /// The in-flight request produced new records.
    pub fn complete(&mut self, ticket: u64) -> bool {
        self.settle(ticket, LoadState::Idle)
    }

    /// The in-flight request showed there is nothing more to load.
    pub fn exhaust(&mut self, ticket: u64) -> bool {
        let settled = self.settle(ticket, LoadState::Exhausted);
        if settled {
            info!("Image listing exhausted");
        }
        settled
    }

    /// The in-flight request failed; the trigger becomes a retry.
    pub fn fail(&mut self, ticket: u64, reason: impl Into<String>) -> bool {
        let reason = reason.into();
        warn!(ticket, %reason, "Image batch request failed");
        self.settle(ticket, LoadState::Failed { reason })
    }

    fn settle(&mut self, ticket: u64, next: LoadState) -> bool {
        if !self.is_current(ticket) {
            debug!(ticket, "Ignoring result for stale request");
            return false;
        }
        if let LoadState::Loading { started, .. } = self.state {
            debug!(ticket, elapsed_ms = started.elapsed().as_millis() as u64, "Request settled");
        }
        self.state = next;
        true
    }

    pub fn trigger(&self) -> TriggerState {
        match self.state {
            LoadState::Idle => TriggerState {
                label: LABEL_LOAD_MORE,
                enabled: true,
                busy: false,
            },
            LoadState::Loading { .. } => TriggerState {
                label: LABEL_LOADING,
                enabled: false,
                busy: true,
            },
            LoadState::Exhausted => TriggerState {
                label: LABEL_EXHAUSTED,
                enabled: false,
                busy: false,
            },
            LoadState::Failed { .. } => TriggerState {
                label: LABEL_RETRY,
                enabled: true,
                busy: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_blocks_overlapping_requests() {
        let mut pagination = Pagination::new(10);
        let first = pagination.begin(0).unwrap();
        assert_eq!(first.limit, 10);
        assert_eq!(first.offset, 0);
        assert!(pagination.begin(0).is_none());
        assert_eq!(pagination.trigger().label, LABEL_LOADING);
        assert!(!pagination.trigger().enabled);
        assert!(pagination.trigger().busy);
    }

    #[test]
    fn test_complete_returns_to_idle() {
        let mut pagination = Pagination::new(10);
        let req = pagination.begin(0).unwrap();
        assert!(pagination.complete(req.ticket));
        assert_eq!(pagination.state(), &LoadState::Idle);
        let next = pagination.begin(10).unwrap();
        assert_ne!(next.ticket, req.ticket);
    }

    #[test]
    fn test_exhaustion_is_terminal() {
        let mut pagination = Pagination::new(10);
        let req = pagination.begin(0).unwrap();
        assert!(pagination.exhaust(req.ticket));
        assert!(pagination.begin(0).is_none());
        let trigger = pagination.trigger();
        assert_eq!(trigger.label, LABEL_EXHAUSTED);
        assert!(!trigger.enabled);
    }

    #[test]
    fn test_failure_allows_retry() {
        let mut pagination = Pagination::new(10);
        let req = pagination.begin(0).unwrap();
        assert!(pagination.fail(req.ticket, "connection refused"));
        let trigger = pagination.trigger();
        assert_eq!(trigger.label, LABEL_RETRY);
        assert!(trigger.enabled);
        assert!(!trigger.busy);
        assert!(pagination.begin(0).is_some());
    }

    #[test]
    fn test_stale_tickets_are_ignored() {
        let mut pagination = Pagination::new(10);
        let first = pagination.begin(0).unwrap();
        pagination.fail(first.ticket, "timeout");
        let second = pagination.begin(0).unwrap();

        // A late answer for the first request must not settle the second.
        assert!(!pagination.complete(first.ticket));
        assert!(pagination.is_current(second.ticket));
    }

    #[test]
    fn test_zero_limit_is_clamped() {
        assert_eq!(Pagination::new(0).limit(), 1);
    }
}
