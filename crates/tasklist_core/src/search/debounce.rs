//! Single-slot search debouncer.
//!
//! # Responsibility
//! - Hold at most one pending query and its due time.
//! - Let the caller drive time explicitly, so no timer thread is needed.
//!
//! # Invariants
//! - A new input always supersedes the pending one and restarts the window.
//! - `poll` yields a given pending query at most once.

use std::time::{Duration, Instant};

/// Default quiescence window for pull backends (each fire is a remote read).
pub const PULL_DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);
/// Default quiescence window for push backends (filtering is local).
pub const PUSH_DEBOUNCE_WINDOW: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingQuery {
    query: String,
    due_at: Instant,
}

/// Debouncer with one pending-request slot.
#[derive(Debug, Clone)]
pub struct SearchDebouncer {
    window: Duration,
    pending: Option<PendingQuery>,
}

impl SearchDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Records a keystroke: replaces the pending query and reschedules it.
    pub fn input(&mut self, query: impl Into<String>, now: Instant) {
        self.pending = Some(PendingQuery {
            query: query.into(),
            due_at: now + self.window,
        });
    }

    /// Returns the pending query once its window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        let due = self
            .pending
            .as_ref()
            .is_some_and(|pending| now >= pending.due_at);
        if !due {
            return None;
        }
        self.pending.take().map(|pending| pending.query)
    }

    /// Drops the pending query, returning it if there was one.
    pub fn cancel(&mut self) -> Option<String> {
        self.pending.take().map(|pending| pending.query)
    }

    pub fn pending(&self) -> Option<&str> {
        self.pending.as_ref().map(|pending| pending.query.as_str())
    }

    pub fn due_at(&self) -> Option<Instant> {
        self.pending.as_ref().map(|pending| pending.due_at)
    }
}
