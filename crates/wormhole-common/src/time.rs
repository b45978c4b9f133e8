// ============================================
// File: crates/wormhole-common/src/time.rs
// ============================================
//! # Lock-free Timestamps
//!
//! ## Creation Reason
//! Peer last-seen times are written by every concurrent packet worker and
//! read by the periodic sweep without taking a lock.
//!
//! ## Main Functionality
//! - `AtomicInstant`: monotonic `Instant` in an `AtomicU64`
//!
//! ## ⚠️ Important Note for Next Developer
//! - Stored as nanoseconds past a process-wide origin; instants before the
//!   origin read back as the origin
//! - `store` keeps the maximum, so it never moves backwards
//!
//! ## Last Modified
//! v0.1.0 - Initial time utilities

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

fn origin() -> Instant {
    static ORIGIN: OnceLock<Instant> = OnceLock::new();
    *ORIGIN.get_or_init(Instant::now)
}

fn nanos_since_origin(instant: Instant) -> u64 {
    instant
        .checked_duration_since(origin())
        .map_or(0, |d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
}

/// An `Instant` that can be read and advanced from many threads.
///
/// # Example
/// ```
/// use wormhole_common::time::AtomicInstant;
/// use std::time::{Duration, Instant};
///
/// let start = Instant::now();
/// let seen = AtomicInstant::from_instant(start);
/// seen.store(start + Duration::from_secs(5));
/// seen.store(start);
/// assert!(seen.load() >= start + Duration::from_secs(5));
/// ```
#[derive(Debug)]
pub struct AtomicInstant {
    nanos: AtomicU64,
}

impl AtomicInstant {
    /// Starts at `instant`.
    #[must_use]
    pub fn from_instant(instant: Instant) -> Self {
        Self {
            nanos: AtomicU64::new(nanos_since_origin(instant)),
        }
    }

    /// Current value.
    #[must_use]
    pub fn load(&self) -> Instant {
        origin() + Duration::from_nanos(self.nanos.load(Ordering::Relaxed))
    }

    /// Advances to `instant` if it is later than the stored value.
    pub fn store(&self, instant: Instant) {
        self.nanos.fetch_max(nanos_since_origin(instant), Ordering::Relaxed);
    }

    /// `true` if more than `timeout` separates the stored value from `now`.
    #[must_use]
    pub fn idle_at(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.load()) > timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_roundtrip_after_origin() {
        let _ = origin();
        let now = Instant::now();
        let atomic = AtomicInstant::from_instant(now);

        let loaded = atomic.load();
        assert!(loaded <= now);
        assert!(now - loaded < Duration::from_micros(1));
    }

    #[test]
    fn test_store_never_moves_backwards() {
        let base = Instant::now();
        let atomic = AtomicInstant::from_instant(base);

        atomic.store(base + Duration::from_millis(10));
        atomic.store(base + Duration::from_millis(3));

        assert!(atomic.load() >= base + Duration::from_millis(9));
    }

    #[test]
    fn test_idle_at_is_strictly_greater() {
        let base = Instant::now();
        let atomic = AtomicInstant::from_instant(base);
        let timeout = Duration::from_secs(300);

        assert!(!atomic.idle_at(base + Duration::from_secs(299), timeout));
        assert!(atomic.idle_at(base + Duration::from_secs(301), timeout));
        assert!(!atomic.idle_at(base, timeout));
    }

    #[test]
    fn test_concurrent_stores_keep_latest() {
        let base = Instant::now();
        let atomic = Arc::new(AtomicInstant::from_instant(base));

        let handles: Vec<_> = (1..=8u64)
            .map(|i| {
                let atomic = Arc::clone(&atomic);
                thread::spawn(move || atomic.store(base + Duration::from_millis(i * 10)))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(atomic.load() >= base + Duration::from_millis(79));
    }
}
