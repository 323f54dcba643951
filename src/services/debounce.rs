//! Event coalescing combinators.
//!
//! Timing policies are named constants here rather than timer literals
//! scattered through handlers. Both combinators are pure over the instants
//! passed in, so tests drive them with synthetic clocks.

use std::time::{Duration, Instant};

/// Quiet period before a recorded progress update is flushed to storage.
pub const PROGRESS_SAVE_DELAY: Duration = Duration::from_millis(400);
/// Quiet period before a resize/typography change triggers repagination.
pub const REPAGINATE_DELAY: Duration = Duration::from_millis(120);
/// Minimum interval between wheel-driven page turns.
pub const PAGE_TURN_LOCK: Duration = Duration::from_millis(190);

/// Trailing-edge debouncer: the first `record` arms a deadline, later
/// records within the window replace the value without extending it, and
/// `poll` releases the latest value once the deadline passes.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn record(&mut self, value: T, now: Instant) {
        let deadline = match self.pending.take() {
            Some((_, deadline)) => deadline,
            None => now + self.delay,
        };
        self.pending = Some((value, deadline));
    }

    /// The coalesced value, once its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, deadline)) if now >= *deadline => self.pending.take().map(|(value, _)| value),
            _ => None,
        }
    }

    /// Release any pending value immediately (e.g. on shutdown).
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_none()
    }
}

/// Leading-edge throttle: the first event fires, later events within the
/// interval are dropped.
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    locked_until: Option<Instant>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            locked_until: None,
        }
    }

    pub fn allow(&mut self, now: Instant) -> bool {
        if let Some(locked_until) = self.locked_until {
            if now < locked_until {
                return false;
            }
        }
        self.locked_until = Some(now + self.interval);
        true
    }
}
