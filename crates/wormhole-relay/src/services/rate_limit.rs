// ============================================
// File: crates/wormhole-relay/src/services/rate_limit.rs
// ============================================
//! # Bandwidth Limiter
//!
//! ## Creation Reason
//! Caps the relay's inbound byte rate. One limiter per relay instance,
//! shared by every packet worker.
//!
//! ## Algorithm
//! ```text
//! limit = max_bandwidth_kbps * 1024 / 8   bytes per rolling second
//!
//!   now - 1s                         now
//!     │ (t0,n0) (t1,n1) ... (tk,nk)   │
//!     └───────────── sum ─────────────┘
//!
//! admit packet of n bytes  ⇔  sum + n <= limit
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Rejected packets are NOT recorded in the window
//! - Exactly reaching the limit is allowed
//! - The window is a single mutex; keep the critical section tiny
//!
//! ## Last Modified
//! v0.1.0 - Initial rolling-window limiter

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::trace;

/// Rolling window length.
pub const WINDOW: Duration = Duration::from_secs(1);

/// Bytes per second for each configured kilobit per second.
pub const BYTES_PER_KBPS: u64 = 1024 / 8;

#[derive(Debug, Default)]
struct Window {
    entries: VecDeque<(Instant, u64)>,
    total: u64,
}

impl Window {
    fn evict(&mut self, now: Instant) {
        while let Some(&(at, bytes)) = self.entries.front() {
            if now.saturating_duration_since(at) < WINDOW {
                break;
            }
            self.entries.pop_front();
            self.total -= bytes;
        }
    }
}

// ============================================
// BandwidthLimiter
// ============================================

/// Rolling one-second byte budget.
#[derive(Debug)]
pub struct BandwidthLimiter {
    limit_bytes: u64,
    window: Mutex<Window>,
}

impl BandwidthLimiter {
    /// Creates a limiter for `max_bandwidth_kbps`.
    #[must_use]
    pub fn new(max_bandwidth_kbps: u64) -> Self {
        Self {
            limit_bytes: max_bandwidth_kbps.saturating_mul(BYTES_PER_KBPS),
            window: Mutex::new(Window::default()),
        }
    }

    /// Byte budget per rolling second.
    #[must_use]
    pub const fn limit_bytes(&self) -> u64 {
        self.limit_bytes
    }

    /// Admits `bytes` now if they fit in the budget.
    pub fn try_consume(&self, bytes: usize) -> bool {
        self.try_consume_at(Instant::now(), bytes)
    }

    /// Admits `bytes` at `now` if they fit in the budget.
    ///
    /// `now` must not go backwards between calls.
    pub fn try_consume_at(&self, now: Instant, bytes: usize) -> bool {
        let bytes = bytes as u64;
        let mut window = self.window.lock();
        window.evict(now);

        if window.total.saturating_add(bytes) > self.limit_bytes {
            trace!(
                bytes,
                used = window.total,
                limit = self.limit_bytes,
                "Bandwidth limit reached"
            );
            return false;
        }

        window.entries.push_back((now, bytes));
        window.total += bytes;
        true
    }

    /// Bytes admitted in the last second.
    #[must_use]
    pub fn current_usage(&self) -> u64 {
        self.usage_at(Instant::now())
    }

    /// Bytes admitted in the second before `now`.
    #[must_use]
    pub fn usage_at(&self, now: Instant) -> u64 {
        let mut window = self.window.lock();
        window.evict(now);
        window.total
    }

    /// Clears the window.
    pub fn reset(&self) {
        let mut window = self.window.lock();
        window.entries.clear();
        window.total = 0;
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_limit_from_kbps() {
        assert_eq!(BandwidthLimiter::new(8).limit_bytes(), 1024);
        assert_eq!(BandwidthLimiter::new(10_240).limit_bytes(), 10_240 * 128);
    }

    #[test]
    fn test_exact_limit_is_allowed() {
        let limiter = BandwidthLimiter::new(64);
        let limit = limiter.limit_bytes() as usize;
        let start = Instant::now();

        assert!(limiter.try_consume_at(start, limit / 2));
        assert!(limiter.try_consume_at(start + Duration::from_millis(500), limit - limit / 2));
        assert_eq!(limiter.usage_at(start + Duration::from_millis(500)), limit as u64);
    }

    #[test]
    fn test_one_byte_over_is_dropped() {
        let limiter = BandwidthLimiter::new(64);
        let limit = limiter.limit_bytes() as usize;
        let start = Instant::now();

        assert!(limiter.try_consume_at(start, limit));
        assert!(!limiter.try_consume_at(start + Duration::from_millis(999), 1));
    }

    #[test]
    fn test_rejected_bytes_not_counted() {
        let limiter = BandwidthLimiter::new(8);
        let start = Instant::now();

        assert!(limiter.try_consume_at(start, 1000));
        assert!(!limiter.try_consume_at(start, 100));
        assert!(limiter.try_consume_at(start, 24));
        assert_eq!(limiter.usage_at(start), 1024);
    }

    #[test]
    fn test_window_rolls() {
        let limiter = BandwidthLimiter::new(8);
        let start = Instant::now();

        assert!(limiter.try_consume_at(start, 1024));
        assert!(!limiter.try_consume_at(start + Duration::from_millis(999), 1));
        assert!(limiter.try_consume_at(start + WINDOW, 1024));
        assert_eq!(limiter.usage_at(start + WINDOW * 3), 0);
    }

    #[test]
    fn test_reset() {
        let limiter = BandwidthLimiter::new(8);
        let now = Instant::now();
        assert!(limiter.try_consume_at(now, 1024));
        limiter.reset();
        assert!(limiter.try_consume_at(now, 1024));
    }

    proptest! {
        #[test]
        fn prop_admitted_bytes_never_exceed_limit(
            kbps in 1u64..64,
            packets in proptest::collection::vec((0u64..2000, 1usize..3000), 1..60),
        ) {
            let limiter = BandwidthLimiter::new(kbps);
            let start = Instant::now();
            let mut offset = 0u64;

            for (gap_ms, size) in packets {
                offset += gap_ms / 10;
                let now = start + Duration::from_millis(offset);
                limiter.try_consume_at(now, size);
                prop_assert!(limiter.usage_at(now) <= limiter.limit_bytes());
            }
        }
    }
}
