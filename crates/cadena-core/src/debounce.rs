//! Deadline-based coalescing of rapid updates.
//!
//! A [`Debouncer`] holds at most one pending value. Scheduling a new value
//! replaces the pending one and pushes the deadline out again, so only the
//! last value of a burst is released once the burst has been quiet for the
//! configured delay. Time is passed in explicitly; the debouncer owns no
//! timer thread.

use std::time::{Duration, Instant};

/// Default quiescence interval before a pending save is written.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Coalesces values scheduled in quick succession.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    /// Creates a debouncer releasing values `delay` after the last schedule.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// The quiescence interval.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replaces any pending value with `value`, due at `now + delay`.
    pub fn schedule(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.delay));
    }

    /// Releases the pending value if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, deadline)) if now >= *deadline => self.pending.take().map(|(v, _)| v),
            _ => None,
        }
    }

    /// Releases the pending value regardless of its deadline.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(v, _)| v)
    }

    /// Drops the pending value.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Returns `true` while a value is waiting.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn burst_releases_only_last_value() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(500 * MS);
        d.schedule(1, t0);
        d.schedule(2, t0 + 100 * MS);
        d.schedule(3, t0 + 200 * MS);

        assert_eq!(d.poll(t0 + 600 * MS), None);
        assert_eq!(d.poll(t0 + 700 * MS), Some(3));
        assert_eq!(d.poll(t0 + 2000 * MS), None);
    }

    #[test]
    fn flush_ignores_deadline() {
        let t0 = Instant::now();
        let mut d = Debouncer::default();
        d.schedule("a", t0);
        assert!(d.is_pending());
        assert_eq!(d.flush(), Some("a"));
        assert!(!d.is_pending());
    }

    #[test]
    fn cancel_drops_value() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(10 * MS);
        d.schedule(5, t0);
        d.cancel();
        assert_eq!(d.poll(t0 + 100 * MS), None);
        assert!(!d.is_pending());
    }
}
