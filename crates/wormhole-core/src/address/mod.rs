// ============================================
// File: crates/wormhole-core/src/address/mod.rs
// ============================================
//! # Network Addresses
//!
//! ## Creation Reason
//! Wormhole addresses carry geographic and service metadata instead of an
//! opaque host number. This module owns the immutable `NetworkAddress`
//! value and everything that can be computed from it.
//!
//! ## Main Functionality
//! - `NetworkAddress`: tier, geographic id, service id, privacy level,
//!   check digit and resonance score
//! - [`codec`]: pairing, unpairing, check digit, coordinate scaling
//! - [`render`]: compact, 128-bit-shaped and short-token string forms
//! - [`legacy`]: lossy conversion from/to IPv4 and IPv6 literals
//!
//! ## ⚠️ Important Note for Next Developer
//! - The check digit and resonance score are derived on construction; there
//!   is no way to build an address with an inconsistent check digit
//! - Addresses are `Copy` and never mutated; "modified" addresses are new
//!   values (see `with_coordinates`)
//!
//! ## Last Modified
//! v0.1.0 - Initial address model

pub mod codec;
pub mod legacy;
pub mod render;
pub mod tier;

use serde::Serialize;

use crate::error::{CoreError, Result};

pub use render::geo_from_short_token;
pub use tier::{Tier, TIER_COUNT};

/// Highest privacy level.
pub const MAX_PRIVACY_LEVEL: u8 = 9;

// ============================================
// NetworkAddress
// ============================================

/// An immutable wormhole address.
///
/// # Example
/// ```
/// use wormhole_core::address::{NetworkAddress, Tier};
///
/// let addr = NetworkAddress::new(Tier::Overlay, 37.7749, -122.4194, 7, 443, 3).unwrap();
/// let (lat, lon) = addr.coordinates();
/// assert!((lat - 37.7749).abs() < 1e-6);
/// assert!((lon + 122.4194).abs() < 1e-6);
///
/// let parsed: NetworkAddress = addr.to_compact().parse().unwrap();
/// assert_eq!(parsed, addr);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NetworkAddress {
    tier: Tier,
    geographic_id: u64,
    service_id: u64,
    privacy_level: u8,
    check_digit: char,
    resonance_score: f64,
}

impl NetworkAddress {
    /// Builds an address from coordinates and a service-type/port pair.
    ///
    /// # Errors
    /// - `InvalidCoordinate` for out-of-range latitude/longitude
    /// - `InvalidPrivacyLevel` if `privacy_level > 9`
    pub fn new(
        tier: Tier,
        latitude: f64,
        longitude: f64,
        service_type: u32,
        port: u16,
        privacy_level: u8,
    ) -> Result<Self> {
        let geographic_id = codec::encode_coordinates(latitude, longitude)?;
        let service_id = codec::pair(u64::from(service_type), u64::from(port))?;
        Self::from_parts(tier, geographic_id, service_id, privacy_level)
    }

    /// Builds an address from already-encoded ids.
    ///
    /// # Errors
    /// `InvalidPrivacyLevel` if `privacy_level > 9`.
    pub fn from_parts(
        tier: Tier,
        geographic_id: u64,
        service_id: u64,
        privacy_level: u8,
    ) -> Result<Self> {
        if privacy_level > MAX_PRIVACY_LEVEL {
            return Err(CoreError::InvalidPrivacyLevel(privacy_level));
        }

        Ok(Self {
            tier,
            geographic_id,
            service_id,
            privacy_level,
            check_digit: codec::checksum(geographic_id, service_id, tier.code(), privacy_level),
            resonance_score: codec::resonance(geographic_id, service_id, tier.code()),
        })
    }

    /// Same tier, service and privacy level at different coordinates.
    ///
    /// Coordinates are clamped into range first, so this only fails if the
    /// inputs are not finite.
    ///
    /// # Errors
    /// `InvalidCoordinate` for NaN or infinite inputs.
    pub fn with_coordinates(&self, latitude: f64, longitude: f64) -> Result<Self> {
        let (latitude, longitude) = codec::clamp_coordinates(latitude, longitude);
        let geographic_id = codec::encode_coordinates(latitude, longitude)?;
        Self::from_parts(self.tier, geographic_id, self.service_id, self.privacy_level)
    }

    // ========================================
    // Accessors
    // ========================================

    /// Network tier.
    #[must_use]
    pub const fn tier(&self) -> Tier {
        self.tier
    }

    /// Paired, scaled coordinates.
    #[must_use]
    pub const fn geographic_id(&self) -> u64 {
        self.geographic_id
    }

    /// Paired service type and port.
    #[must_use]
    pub const fn service_id(&self) -> u64 {
        self.service_id
    }

    /// Privacy level 0..=9.
    #[must_use]
    pub const fn privacy_level(&self) -> u8 {
        self.privacy_level
    }

    /// Base-36 check digit.
    #[must_use]
    pub const fn check_digit(&self) -> char {
        self.check_digit
    }

    /// Advisory QoS hint in `[0.0, 1.0]`.
    #[must_use]
    pub const fn resonance_score(&self) -> f64 {
        self.resonance_score
    }

    /// Decoded `(latitude, longitude)`.
    #[must_use]
    pub fn coordinates(&self) -> (f64, f64) {
        codec::decode_coordinates(self.geographic_id)
    }

    /// Decoded `(service_type, port)`.
    #[must_use]
    pub fn service(&self) -> (u64, u64) {
        codec::unpair(self.service_id)
    }
}

// ============================================
// Tests
// ============================================
