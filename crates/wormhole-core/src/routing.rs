// ============================================
// File: crates/wormhole-core/src/routing.rs
// ============================================
//! # Routing Engine
//!
//! ## Creation Reason
//! Estimates how "far apart" two wormhole addresses are and builds a greedy
//! hop sequence between them.
//!
//! ## Metric
//! ```text
//! d        = euclidean distance of decoded (lat, lon)
//! distance = 2·atanh(d / (d + K))
//!          + TIER_PENALTY · |tier_a − tier_b|
//!          − RESONANCE_BONUS · (res_a + res_b) / 2
//! ```
//! Nearby addresses are compressed much closer than distant ones. The
//! result can be slightly negative for co-located addresses.
//!
//! ## ⚠️ Important Note for Next Developer
//! - `MidpointStrategy` is a placeholder greedy step, not a routing table.
//!   Implement `NextHopStrategy` to plug in something real; `find_route`'s
//!   contract does not change.
//! - `distance` must stay exactly symmetric (tests check bit equality)
//!
//! ## Last Modified
//! v0.1.0 - Initial routing engine

use serde::Serialize;
use tracing::trace;

use crate::address::NetworkAddress;
use crate::error::Result;

// ============================================
// Constants
// ============================================

/// Hyperbolic compression constant.
pub const HYPERBOLIC_K: f64 = 100.0;

/// Penalty per tier index of difference.
pub const TIER_PENALTY: f64 = 0.5;

/// Bonus weight for the mean resonance score.
pub const RESONANCE_BONUS: f64 = 0.01;

/// Route search stops once the remaining distance drops below this.
pub const ROUTE_EPSILON: f64 = 0.01;

/// Fixed per-hop latency estimate in milliseconds.
pub const BASE_LATENCY_MS: f64 = 5.0;

/// Latency added per unit of distance in milliseconds.
pub const LATENCY_PER_DISTANCE_MS: f64 = 50.0;

// ============================================
// Metric
// ============================================

/// Symmetric distance between two addresses.
#[must_use]
pub fn distance(a: &NetworkAddress, b: &NetworkAddress) -> f64 {
    let (lat_a, lon_a) = a.coordinates();
    let (lat_b, lon_b) = b.coordinates();
    let d_lat = lat_a - lat_b;
    let d_lon = lon_a - lon_b;
    let d = (d_lat * d_lat + d_lon * d_lon).sqrt();

    let compressed = 2.0 * (d / (d + HYPERBOLIC_K)).atanh();
    let tier_gap = f64::from(a.tier().index().abs_diff(b.tier().index()));
    let resonance = (a.resonance_score() + b.resonance_score()) / 2.0;

    compressed + TIER_PENALTY * tier_gap - RESONANCE_BONUS * resonance
}

/// Latency estimate for a hop of the given distance.
#[must_use]
pub fn hop_latency_ms(hop_distance: f64) -> f64 {
    BASE_LATENCY_MS + hop_distance * LATENCY_PER_DISTANCE_MS
}

// ============================================
// Next-hop Strategy
// ============================================

/// Picks the next hop from `current` toward `target`.
pub trait NextHopStrategy: Send + Sync {
    /// Returns the next address to visit.
    ///
    /// # Errors
    /// Strategy-specific; the midpoint strategy only fails on re-encoding.
    fn next_hop(&self, current: &NetworkAddress, target: &NetworkAddress) -> Result<NetworkAddress>;
}

/// Geographic midpoint on `current`'s tier and service.
#[derive(Debug, Default, Clone, Copy)]
pub struct MidpointStrategy;

impl NextHopStrategy for MidpointStrategy {
    fn next_hop(&self, current: &NetworkAddress, target: &NetworkAddress) -> Result<NetworkAddress> {
        let (lat_c, lon_c) = current.coordinates();
        let (lat_t, lon_t) = target.coordinates();
        current.with_coordinates((lat_c + lat_t) / 2.0, (lon_c + lon_t) / 2.0)
    }
}

// ============================================
// Router
// ============================================

/// A computed route. The last hop is always the destination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    /// Hops after the origin
    pub hops: Vec<NetworkAddress>,
    /// Sum of per-hop distances (negative hops count as 0)
    pub total_distance: f64,
    /// Sum of per-hop latency estimates
    pub total_latency_ms: f64,
}

/// Builds routes using a [`NextHopStrategy`].
#[derive(Debug, Default, Clone)]
pub struct Router<S = MidpointStrategy> {
    strategy: S,
}

impl Router<MidpointStrategy> {
    /// Router using the midpoint heuristic.
    #[must_use]
    pub fn new() -> Self {
        Self::with_strategy(MidpointStrategy)
    }
}

impl<S: NextHopStrategy> Router<S> {
    /// Router using a caller-supplied strategy.
    pub fn with_strategy(strategy: S) -> Self {
        Self { strategy }
    }

    /// Walks `next_hop` from `from` toward `to` for at most `max_hops`
    /// intermediate hops, then appends `to` as the final hop.
    ///
    /// # Errors
    /// Propagates strategy errors.
    pub fn find_route(
        &self,
        from: &NetworkAddress,
        to: &NetworkAddress,
        max_hops: usize,
    ) -> Result<Route> {
        let mut route = Route {
            hops: Vec::with_capacity(max_hops + 1),
            total_distance: 0.0,
            total_latency_ms: 0.0,
        };
        let mut current = *from;

        for _ in 0..max_hops {
            if distance(&current, to) < ROUTE_EPSILON {
                break;
            }
            let next = self.strategy.next_hop(&current, to)?;
            Self::push_hop(&mut route, &current, next);
            current = next;
        }

        Self::push_hop(&mut route, &current, *to);

        trace!(
            hops = route.hops.len(),
            distance = route.total_distance,
            latency_ms = route.total_latency_ms,
            "Route computed"
        );

        Ok(route)
    }

    fn push_hop(route: &mut Route, current: &NetworkAddress, next: NetworkAddress) {
        let step = distance(current, &next).max(0.0);
        route.total_distance += step;
        route.total_latency_ms += hop_latency_ms(step);
        route.hops.push(next);
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Tier;
    use proptest::prelude::*;

    fn at(tier: Tier, lat: f64, lon: f64) -> NetworkAddress {
        NetworkAddress::new(tier, lat, lon, 1, 80, 0).unwrap()
    }

    #[test]
    fn test_distance_grows_with_separation() {
        let origin = at(Tier::Network, 0.0, 0.0);
        let near = at(Tier::Network, 1.0, 1.0);
        let far = at(Tier::Network, 40.0, 40.0);
        assert!(distance(&origin, &near) < distance(&origin, &far));
    }

    #[test]
    fn test_self_distance_is_at_most_zero() {
        let a = at(Tier::Session, 10.0, 20.0);
        let d = distance(&a, &a);
        assert!(d <= 0.0);
        assert!(d >= -RESONANCE_BONUS);
    }

    #[test]
    fn test_tier_penalty() {
        let low = at(Tier::Physical, 5.0, 5.0);
        let high = at(Tier::Application, 5.0, 5.0);
        let d = distance(&low, &high);
        assert!(d > 6.0 * TIER_PENALTY - RESONANCE_BONUS - 1e-9);
    }

    #[test]
    fn test_route_ends_at_destination() {
        let from = at(Tier::Overlay, 0.0, 0.0);
        let to = at(Tier::Overlay, 30.0, 60.0);
        let route = Router::new().find_route(&from, &to, 8).unwrap();

        assert_eq!(route.hops.last(), Some(&to));
        assert!(route.hops.len() <= 9);
        assert!(route.total_distance > 0.0);
        #[allow(clippy::cast_precision_loss)]
        let min_latency = BASE_LATENCY_MS * route.hops.len() as f64;
        assert!(route.total_latency_ms >= min_latency);
    }

    #[test]
    fn test_route_with_zero_hops() {
        let from = at(Tier::Link, -10.0, 10.0);
        let to = at(Tier::Link, 10.0, -10.0);
        let route = Router::new().find_route(&from, &to, 0).unwrap();
        assert_eq!(route.hops, vec![to]);
    }

    #[test]
    fn test_route_to_self() {
        let a = at(Tier::Link, 1.0, 1.0);
        let route = Router::new().find_route(&a, &a, 5).unwrap();
        assert_eq!(route.hops, vec![a]);
        assert!((route.total_distance - 0.0).abs() < f64::EPSILON);
        assert!((route.total_latency_ms - BASE_LATENCY_MS).abs() < f64::EPSILON);
    }

    #[test]
    fn test_midpoint_keeps_tier_and_service() {
        let from = at(Tier::Transport, 0.0, 0.0);
        let to = NetworkAddress::new(Tier::Consensus, 10.0, 20.0, 9, 9000, 4).unwrap();
        let mid = MidpointStrategy.next_hop(&from, &to).unwrap();
        assert_eq!(mid.tier(), Tier::Transport);
        assert_eq!(mid.service_id(), from.service_id());
        let (lat, lon) = mid.coordinates();
        assert!((lat - 5.0).abs() < 1e-6);
        assert!((lon - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_custom_strategy() {
        struct Direct;
        impl NextHopStrategy for Direct {
            fn next_hop(&self, _: &NetworkAddress, target: &NetworkAddress) -> Result<NetworkAddress> {
                Ok(*target)
            }
        }

        let from = at(Tier::Network, 0.0, 0.0);
        let to = at(Tier::Network, 50.0, 50.0);
        let route = Router::with_strategy(Direct).find_route(&from, &to, 10).unwrap();
        // One strategy hop reaches the target, then the explicit final hop
        assert_eq!(route.hops, vec![to, to]);
    }

    proptest! {
        #[test]
        fn prop_distance_is_symmetric(
            lat_a in -90.0f64..=90.0, lon_a in -180.0f64..=180.0,
            lat_b in -90.0f64..=90.0, lon_b in -180.0f64..=180.0,
            tier_a in 0u8..10, tier_b in 0u8..10,
        ) {
            let a = at(Tier::from_index(tier_a).unwrap(), lat_a, lon_a);
            let b = at(Tier::from_index(tier_b).unwrap(), lat_b, lon_b);
            prop_assert_eq!(distance(&a, &b).to_bits(), distance(&b, &a).to_bits());
        }
    }
}
