// ============================================
// File: crates/wormhole-relay/src/services/peers.rs
// ============================================
//! # Peer Table
//!
//! ## Creation Reason
//! Tracks which senders have been relayed for recently, for the active
//! peer count in the stats surface.
//!
//! ## Main Functionality
//! - `PeerTable::touch`: upsert a peer's last-seen time after a relay
//! - `PeerTable::sweep`: evict peers idle past the timeout
//!
//! ## ⚠️ Important Note for Next Developer
//! - Only successful relays touch a peer; drops do not
//! - Stored in a DashMap; workers never hold a guard across an await
//!
//! ## Last Modified
//! v0.1.0 - Initial peer table

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::{debug, info};

use wormhole_common::AtomicInstant;

// ============================================
// PeerEntry
// ============================================

/// Bookkeeping for one sender address.
#[derive(Debug)]
pub struct PeerEntry {
    first_seen: Instant,
    last_seen: AtomicInstant,
    packets: AtomicU64,
    bytes: AtomicU64,
}

impl PeerEntry {
    fn new(now: Instant) -> Self {
        Self {
            first_seen: now,
            last_seen: AtomicInstant::from_instant(now),
            packets: AtomicU64::new(0),
            bytes: AtomicU64::new(0),
        }
    }

    fn record(&self, now: Instant, bytes: u64) {
        self.last_seen.store(now);
        self.packets.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    /// When the peer was first relayed for.
    #[must_use]
    pub const fn first_seen(&self) -> Instant {
        self.first_seen
    }

    /// When the peer was last relayed for.
    #[must_use]
    pub fn last_seen(&self) -> Instant {
        self.last_seen.load()
    }

    /// Packets relayed for this peer.
    #[must_use]
    pub fn packets(&self) -> u64 {
        self.packets.load(Ordering::Relaxed)
    }

    /// Bytes relayed for this peer.
    #[must_use]
    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }
}

// ============================================
// PeerTable
// ============================================

/// Concurrent table of recently relayed-for peers.
#[derive(Debug)]
pub struct PeerTable {
    peers: DashMap<SocketAddr, PeerEntry>,
    idle_timeout: Duration,
}

impl PeerTable {
    /// Creates a table evicting peers idle longer than `idle_timeout`.
    #[must_use]
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            peers: DashMap::new(),
            idle_timeout,
        }
    }

    /// Records a relay for `peer` now.
    pub fn touch(&self, peer: SocketAddr, bytes: u64) {
        self.touch_at(peer, Instant::now(), bytes);
    }

    /// Records a relay for `peer` at `now`.
    pub fn touch_at(&self, peer: SocketAddr, now: Instant, bytes: u64) {
        self.peers
            .entry(peer)
            .or_insert_with(|| PeerEntry::new(now))
            .record(now, bytes);
    }

    /// Evicts idle peers now.
    pub fn sweep(&self) -> Vec<SocketAddr> {
        self.sweep_at(Instant::now())
    }

    /// Evicts peers idle longer than the timeout as of `now`.
    pub fn sweep_at(&self, now: Instant) -> Vec<SocketAddr> {
        let mut evicted = Vec::new();

        self.peers.retain(|addr, entry| {
            let idle = entry.last_seen.idle_at(now, self.idle_timeout);
            if idle {
                debug!(peer = %addr, packets = entry.packets(), "Peer idle, evicting");
                evicted.push(*addr);
            }
            !idle
        });

        if !evicted.is_empty() {
            info!("Evicted {} idle peers", evicted.len());
        }

        evicted
    }

    /// Last-seen time of `peer`.
    #[must_use]
    pub fn last_seen(&self, peer: &SocketAddr) -> Option<Instant> {
        self.peers.get(peer).map(|entry| entry.last_seen())
    }

    /// Packets and bytes relayed for `peer`.
    #[must_use]
    pub fn counters(&self, peer: &SocketAddr) -> Option<(u64, u64)> {
        self.peers.get(peer).map(|entry| (entry.packets(), entry.bytes()))
    }

    /// Returns `true` if `peer` is tracked.
    #[must_use]
    pub fn contains(&self, peer: &SocketAddr) -> bool {
        self.peers.contains_key(peer)
    }

    /// Number of tracked peers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// Returns `true` if no peers are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Idle timeout.
    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Forgets every peer.
    pub fn clear(&self) {
        self.peers.clear();
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[test]
    fn test_touch_upserts() {
        let table = PeerTable::new(Duration::from_secs(300));
        let start = Instant::now();

        table.touch_at(addr(1000), start, 10);
        table.touch_at(addr(1000), start + Duration::from_secs(1), 20);

        assert_eq!(table.len(), 1);
        assert_eq!(table.counters(&addr(1000)), Some((2, 30)));
        assert_eq!(table.last_seen(&addr(1000)), Some(start + Duration::from_secs(1)));
    }

    #[test]
    fn test_sweep_evicts_idle_only() {
        let table = PeerTable::new(Duration::from_secs(300));
        let start = Instant::now();

        table.touch_at(addr(1), start, 1);
        table.touch_at(addr(2), start + Duration::from_secs(200), 1);

        let evicted = table.sweep_at(start + Duration::from_secs(301));
        assert_eq!(evicted, vec![addr(1)]);
        assert!(!table.contains(&addr(1)));
        assert!(table.contains(&addr(2)));

        assert!(table.sweep_at(start + Duration::from_secs(400)).is_empty());
        assert_eq!(table.sweep_at(start + Duration::from_secs(501)), vec![addr(2)]);
        assert!(table.is_empty());
    }

    #[test]
    fn test_concurrent_touches_not_lost() {
        let table = Arc::new(PeerTable::new(Duration::from_secs(300)));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let table = Arc::clone(&table);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        table.touch(addr(9), 1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(table.counters(&addr(9)), Some((8000, 8000)));
    }
}
