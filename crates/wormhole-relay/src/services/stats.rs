// ============================================
// File: crates/wormhole-relay/src/services/stats.rs
// ============================================
//! # Relay State and Statistics
//!
//! ## Creation Reason
//! Running totals owned by one relay instance and polled by an external
//! monitor.
//!
//! ## Main Functionality
//! - `RelayState`: lock-free counters shared by all workers
//! - `DropReason`: why a packet was not relayed
//! - `RelayStats`: serializable point-in-time snapshot
//!
//! ## ⚠️ Important Note for Next Developer
//! - Every drop increments `dropped_packets` AND exactly one reason counter
//! - Snapshots are not atomic across counters; they are advisory
//!
//! ## Last Modified
//! v0.1.0 - Initial stats surface

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::error::RelayError;

// ============================================
// DropReason
// ============================================

/// Why a packet was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Header failed validation or could not be read.
    Malformed,
    /// Destination rejected by policy.
    Policy,
    /// Bandwidth budget exhausted.
    RateLimited,
    /// Destination unreachable or timed out.
    ForwardFailed,
}

impl DropReason {
    /// Classifies a per-packet error.
    #[must_use]
    pub fn from_error(err: &RelayError) -> Self {
        match err {
            RelayError::PolicyRejected { .. } => Self::Policy,
            RelayError::RateLimited { .. } => Self::RateLimited,
            RelayError::ForwardFailed { .. }
            | RelayError::ForwardTimeout { .. }
            | RelayError::Transport(_) => Self::ForwardFailed,
            _ => Self::Malformed,
        }
    }

    /// Short label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::Policy => "policy",
            Self::RateLimited => "rate_limited",
            Self::ForwardFailed => "forward_failed",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================
// RelayState
// ============================================

/// Shared counters for one relay instance.
#[derive(Debug, Default)]
pub struct RelayState {
    packets_relayed: AtomicU64,
    bytes_relayed: AtomicU64,
    dropped_packets: AtomicU64,
    dropped_malformed: AtomicU64,
    dropped_policy: AtomicU64,
    dropped_rate_limited: AtomicU64,
    dropped_forward_failed: AtomicU64,
    bandwidth_bytes_per_sec: AtomicU64,
}

impl RelayState {
    /// Creates zeroed state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one relayed packet.
    pub fn record_relayed(&self, bytes: u64) {
        self.packets_relayed.fetch_add(1, Ordering::Relaxed);
        self.bytes_relayed.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Counts one dropped packet.
    pub fn record_drop(&self, reason: DropReason) {
        self.dropped_packets.fetch_add(1, Ordering::Relaxed);
        let counter = match reason {
            DropReason::Malformed => &self.dropped_malformed,
            DropReason::Policy => &self.dropped_policy,
            DropReason::RateLimited => &self.dropped_rate_limited,
            DropReason::ForwardFailed => &self.dropped_forward_failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Stores the latest rolling bandwidth figure.
    pub fn set_bandwidth(&self, bytes_per_sec: u64) {
        self.bandwidth_bytes_per_sec.store(bytes_per_sec, Ordering::Relaxed);
    }

    /// Total packets relayed.
    #[must_use]
    pub fn packets_relayed(&self) -> u64 {
        self.packets_relayed.load(Ordering::Relaxed)
    }

    /// Total dropped packets.
    #[must_use]
    pub fn dropped_packets(&self) -> u64 {
        self.dropped_packets.load(Ordering::Relaxed)
    }

    /// Point-in-time copy of every counter.
    #[must_use]
    pub fn snapshot(&self, active_peers: usize) -> RelayStats {
        let bandwidth = self.bandwidth_bytes_per_sec.load(Ordering::Relaxed);
        #[allow(clippy::cast_precision_loss)]
        let bandwidth_kbps = bandwidth.saturating_mul(8) as f64 / 1024.0;
        RelayStats {
            packets_relayed: self.packets_relayed.load(Ordering::Relaxed),
            bytes_relayed: self.bytes_relayed.load(Ordering::Relaxed),
            dropped_packets: self.dropped_packets.load(Ordering::Relaxed),
            dropped_malformed: self.dropped_malformed.load(Ordering::Relaxed),
            dropped_policy: self.dropped_policy.load(Ordering::Relaxed),
            dropped_rate_limited: self.dropped_rate_limited.load(Ordering::Relaxed),
            dropped_forward_failed: self.dropped_forward_failed.load(Ordering::Relaxed),
            active_peers,
            bandwidth_bytes_per_sec: bandwidth,
            bandwidth_kbps,
        }
    }

    /// Zeroes every counter.
    pub fn reset(&self) {
        for counter in [
            &self.packets_relayed,
            &self.bytes_relayed,
            &self.dropped_packets,
            &self.dropped_malformed,
            &self.dropped_policy,
            &self.dropped_rate_limited,
            &self.dropped_forward_failed,
            &self.bandwidth_bytes_per_sec,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

// ============================================
// RelayStats
// ============================================

/// Snapshot of relay counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RelayStats {
    /// Packets answered
    pub packets_relayed: u64,
    /// Request payload plus reply payload bytes
    pub bytes_relayed: u64,
    /// All drops
    pub dropped_packets: u64,
    /// Drops: bad header or read failure
    pub dropped_malformed: u64,
    /// Drops: policy
    pub dropped_policy: u64,
    /// Drops: bandwidth limit
    pub dropped_rate_limited: u64,
    /// Drops: destination unreachable or timeout
    pub dropped_forward_failed: u64,
    /// Peers seen within the idle timeout
    pub active_peers: usize,
    /// Inbound bytes admitted over the last second
    pub bandwidth_bytes_per_sec: u64,
    /// Same figure in kilobits per second
    pub bandwidth_kbps: f64,
}

impl fmt::Display for RelayStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "relayed={} bytes={} dropped={} (malformed={} policy={} rate={} forward={}) peers={} bw={:.1}kbps",
            self.packets_relayed,
            self.bytes_relayed,
            self.dropped_packets,
            self.dropped_malformed,
            self.dropped_policy,
            self.dropped_rate_limited,
            self.dropped_forward_failed,
            self.active_peers,
            self.bandwidth_kbps,
        )
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    use wormhole_core::CoreError;

    #[test]
    fn test_drop_counters() {
        let state = RelayState::new();
        state.record_drop(DropReason::Policy);
        state.record_drop(DropReason::Policy);
        state.record_drop(DropReason::Malformed);

        let stats = state.snapshot(0);
        assert_eq!(stats.dropped_packets, 3);
        assert_eq!(stats.dropped_policy, 2);
        assert_eq!(stats.dropped_malformed, 1);
        assert_eq!(stats.dropped_rate_limited, 0);
    }

    #[test]
    fn test_relayed_and_bandwidth() {
        let state = RelayState::new();
        state.record_relayed(100);
        state.record_relayed(28);
        state.set_bandwidth(1024);

        let stats = state.snapshot(2);
        assert_eq!(stats.packets_relayed, 2);
        assert_eq!(stats.bytes_relayed, 128);
        assert_eq!(stats.active_peers, 2);
        assert!((stats.bandwidth_kbps - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reset() {
        let state = RelayState::new();
        state.record_relayed(5);
        state.record_drop(DropReason::ForwardFailed);
        state.reset();
        assert_eq!(state.snapshot(0), RelayStats::default());
    }

    #[test]
    fn test_reason_from_error() {
        let policy = RelayError::PolicyRejected {
            destination: Ipv4Addr::LOCALHOST,
            reason: "blocked",
        };
        assert_eq!(DropReason::from_error(&policy), DropReason::Policy);
        assert_eq!(
            DropReason::from_error(&RelayError::from(CoreError::InvalidMagic(1))),
            DropReason::Malformed
        );
        assert_eq!(
            DropReason::from_error(&RelayError::RateLimited { requested: 1, limit: 0 }),
            DropReason::RateLimited
        );
    }

    #[test]
    fn test_snapshot_serializes() {
        let json = serde_json::to_value(RelayState::new().snapshot(1)).unwrap();
        assert_eq!(json["active_peers"], 1);
        assert_eq!(json["dropped_packets"], 0);
    }
}
