//! Logical time sources used by the session engine.
//!
//! Every time-dependent component reads "now" through [`Clock`] instead of an
//! ambient global timer, so tests can advance time deterministically.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

/// A monotonic source of elapsed time since an arbitrary origin.
pub trait Clock: Send + Sync {
    /// Time elapsed since the clock origin.
    fn now(&self) -> Duration;
}

/// Production clock backed by [`Instant`].
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Start a clock whose origin is the current instant.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Convert a logical timestamp back into a wall [`Instant`].
    pub fn instant_at(&self, at: Duration) -> Instant {
        self.origin + at
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven clock; clones share the same timeline.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward by `step`.
    pub fn advance(&self, step: Duration) {
        self.millis
            .fetch_add(step.as_millis() as u64, Ordering::SeqCst);
    }

    /// Jump to an absolute position on the timeline.
    pub fn set(&self, at: Duration) {
        self.millis.store(at.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Duration {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_timeline() {
        let clock = ManualClock::new();
        let other = clock.clone();
        clock.advance(Duration::from_millis(1500));
        assert_eq!(other.now(), Duration::from_millis(1500));

        other.set(Duration::from_secs(10));
        assert_eq!(clock.now(), Duration::from_secs(10));
    }

    #[test]
    fn monotonic_clock_never_goes_backwards() {
        let clock = MonotonicClock::new();
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }
}
