//! Global insertion rate limiter using a sliding timestamp window.
//!
//! Tracks when tickets were inserted, across all identifiers, and answers
//! whether another insertion is allowed right now. The check is advisory:
//! the orchestrator consults it before mutating the store and records the
//! insertion only after the store write succeeds.

use checkpoint_types::Timestamp;
use std::collections::VecDeque;

/// Sliding-window insertion limiter.
///
/// At most `max_inserts` insertions are admitted inside any trailing
/// `window_secs` span. Entries never persist beyond the window.
pub struct RateLimiter {
    window_secs: u64,
    max_inserts: usize,
    inserts: VecDeque<Timestamp>,
}

impl RateLimiter {
    pub fn new(window_secs: u64, max_inserts: usize) -> Self {
        Self {
            window_secs,
            max_inserts,
            inserts: VecDeque::new(),
        }
    }

    /// Whether a new insertion is currently allowed. Does not mutate.
    pub fn admit_insert(&self, now: Timestamp) -> bool {
        self.live_count(now) < self.max_inserts
    }

    /// Record a completed insertion and prune aged-out entries.
    pub fn record_insert(&mut self, now: Timestamp) {
        self.prune(now);
        self.inserts.push_back(now);
    }

    /// Seed the window after a restart with `count` insertions observed in
    /// the persisted store. They are treated as having happened just now,
    /// which errs toward throttling rather than letting a restart reset the
    /// global cap.
    pub fn warm(&mut self, count: usize, now: Timestamp) {
        for _ in 0..count {
            self.record_insert(now);
        }
    }

    /// Insertions still inside the trailing window.
    pub fn live_count(&self, now: Timestamp) -> usize {
        self.inserts
            .iter()
            .filter(|t| t.within_window(self.window_secs, now))
            .count()
    }

    fn prune(&mut self, now: Timestamp) {
        while let Some(front) = self.inserts.front() {
            if front.within_window(self.window_secs, now) {
                break;
            }
            self.inserts.pop_front();
        }
    }
}
