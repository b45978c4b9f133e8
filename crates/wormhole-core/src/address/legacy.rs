// ============================================
// File: crates/wormhole-core/src/address/legacy.rs
// ============================================
//! # Legacy Address Conversion
//!
//! ## Creation Reason
//! Peers that only know IPv4/IPv6 literals still need a wormhole address.
//! The mapping spreads the literal's bits over the coordinate ranges so that
//! every literal lands somewhere plausible on the globe.
//!
//! ## ⚠️ Important Note for Next Developer
//! Both directions are lossy and non-canonical. Converting a literal into a
//! `NetworkAddress` and back does NOT reproduce the literal, and that is
//! expected. Do not "fix" it by stashing the original bits somewhere.
//!
//! ## Last Modified
//! v0.1.0 - Initial legacy mapping

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use super::codec::{clamp_coordinates, LATITUDE_OFFSET, LONGITUDE_OFFSET};
use super::{NetworkAddress, Tier};
use crate::error::Result;

impl NetworkAddress {
    /// Heuristic mapping from any IP literal.
    ///
    /// The service id is 0 and the privacy level is 0.
    ///
    /// # Errors
    /// Never in practice; coordinates are always clamped into range.
    pub fn from_legacy(ip: IpAddr, tier: Tier) -> Result<Self> {
        match ip {
            IpAddr::V4(v4) => Self::from_legacy_ipv4(v4, tier),
            IpAddr::V6(v6) => Self::from_legacy_ipv6(v6, tier),
        }
    }

    /// First two octets pick the latitude, last two the longitude.
    ///
    /// # Errors
    /// Never in practice.
    pub fn from_legacy_ipv4(ip: Ipv4Addr, tier: Tier) -> Result<Self> {
        let o = ip.octets();
        let hi = u16::from_be_bytes([o[0], o[1]]);
        let lo = u16::from_be_bytes([o[2], o[3]]);
        let (lat, lon) = spread(
            f64::from(hi) / f64::from(u16::MAX),
            f64::from(lo) / f64::from(u16::MAX),
        );
        Self::origin(tier)?.with_coordinates(lat, lon)
    }

    /// Upper 64 bits pick the latitude, lower 64 bits the longitude.
    ///
    /// # Errors
    /// Never in practice.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_legacy_ipv6(ip: Ipv6Addr, tier: Tier) -> Result<Self> {
        let bits = u128::from(ip);
        let hi = (bits >> 64) as u64;
        let lo = bits as u64;
        let (lat, lon) = spread(hi as f64 / u64::MAX as f64, lo as f64 / u64::MAX as f64);
        Self::origin(tier)?.with_coordinates(lat, lon)
    }

    /// Low 32 bits of the geographic id as an IPv4 literal.
    ///
    /// Lossy: not the inverse of [`from_legacy_ipv4`](Self::from_legacy_ipv4).
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_legacy_ipv4(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.geographic_id() as u32)
    }

    fn origin(tier: Tier) -> Result<Self> {
        Self::from_parts(tier, 0, 0, 0)
    }
}

/// Maps two unit fractions onto latitude/longitude.
fn spread(lat_fraction: f64, lon_fraction: f64) -> (f64, f64) {
    clamp_coordinates(
        lat_fraction * 2.0 * LATITUDE_OFFSET - LATITUDE_OFFSET,
        lon_fraction * 2.0 * LONGITUDE_OFFSET - LONGITUDE_OFFSET,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4_extremes() {
        let low = NetworkAddress::from_legacy_ipv4(Ipv4Addr::UNSPECIFIED, Tier::Network).unwrap();
        assert_eq!(low.coordinates(), (-90.0, -180.0));

        let high = NetworkAddress::from_legacy_ipv4(Ipv4Addr::BROADCAST, Tier::Network).unwrap();
        let (lat, lon) = high.coordinates();
        assert!((lat - 90.0).abs() < 1e-6);
        assert!((lon - 180.0).abs() < 1e-6);
    }

    #[test]
    fn test_ipv4_roundtrip_is_lossy() {
        let original = Ipv4Addr::new(1, 2, 3, 4);
        let addr = NetworkAddress::from_legacy(IpAddr::V4(original), Tier::Transport).unwrap();
        assert_ne!(addr.to_legacy_ipv4(), original);
    }

    #[test]
    fn test_ipv6_roundtrip_is_lossy() {
        let original: Ipv6Addr = "2001:db8::1".parse().unwrap();
        let addr = NetworkAddress::from_legacy(IpAddr::V6(original), Tier::Overlay).unwrap();
        assert_ne!(addr.to_ipv6(), original);

        let (lat, lon) = addr.coordinates();
        assert!((-90.0..=90.0).contains(&lat));
        assert!((-180.0..=180.0).contains(&lon));
    }

    #[test]
    fn test_legacy_is_deterministic() {
        let ip = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 9));
        assert_eq!(
            NetworkAddress::from_legacy(ip, Tier::Link).unwrap(),
            NetworkAddress::from_legacy(ip, Tier::Link).unwrap()
        );
    }
}
