// ============================================
// File: crates/wormhole-core/src/address/codec.rs
// ============================================
//! # Address Codec Primitives
//!
//! ## Creation Reason
//! Pure arithmetic behind `NetworkAddress`: triangular pairing of two
//! integers into one, its inverse, the base-36 check digit and the
//! coordinate scaling used for geographic ids.
//!
//! ## Pairing
//! ```text
//! pair(a, b)  = (a + b)(a + b + 1) / 2 + b
//! unpair(z)   : w = ⌊(√(8z + 1) − 1) / 2⌋
//!               t = w(w + 1) / 2
//!               b = z − t,  a = w − b
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Intermediate products are computed in u128; never narrow early
//! - `unpair` uses an exact integer square root; an f64 sqrt silently
//!   loses precision above 2^53
//!
//! ## Last Modified
//! v0.1.0 - Initial codec primitives

use crate::error::{CoreError, Result};

/// Coordinates are stored as integer micro-degrees.
pub const COORDINATE_SCALE: f64 = 1_000_000.0;

/// Latitude offset applied before scaling (makes the value non-negative).
pub const LATITUDE_OFFSET: f64 = 90.0;

/// Longitude offset applied before scaling.
pub const LONGITUDE_OFFSET: f64 = 180.0;

/// Check digit alphabet.
const CHECK_ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

// ============================================
// Pairing
// ============================================

/// Triangular pairing of `(a, b)` into a single integer.
///
/// # Errors
/// `Overflow` if the result does not fit in a `u64`.
///
/// # Example
/// ```
/// use wormhole_core::address::codec::pair;
/// assert_eq!(pair(3, 5).unwrap(), 41);
/// ```
pub fn pair(a: u64, b: u64) -> Result<u64> {
    let overflow = || CoreError::Overflow { a, b };
    let s = u128::from(a) + u128::from(b);
    let z = s
        .checked_mul(s + 1)
        .map(|t| t / 2)
        .and_then(|t| t.checked_add(u128::from(b)))
        .ok_or_else(overflow)?;
    u64::try_from(z).map_err(|_| overflow())
}

/// Inverse of [`pair`].
///
/// Total over `u64`: every integer is the image of exactly one pair.
#[must_use]
pub fn unpair(z: u64) -> (u64, u64) {
    let w = (isqrt(8 * u128::from(z) + 1) - 1) / 2;
    let t = w * (w + 1) / 2;
    let b = u128::from(z) - t;
    let a = w - b;
    // w < 2^33 for any u64 input, so both halves fit.
    (a as u64, b as u64)
}

/// Exact integer square root (floor).
fn isqrt(n: u128) -> u128 {
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let mut r = (n as f64).sqrt() as u128;
    while r * r > n {
        r -= 1;
    }
    while (r + 1) * (r + 1) <= n {
        r += 1;
    }
    r
}

// ============================================
// Check Digit / Resonance
// ============================================

/// Check digit over the four identifying fields: `(sum mod 36)` as `0-9A-Z`.
#[must_use]
pub fn checksum(geographic_id: u64, service_id: u64, tier_code: u32, privacy_level: u8) -> char {
    let sum = u128::from(geographic_id)
        + u128::from(service_id)
        + u128::from(tier_code)
        + u128::from(privacy_level);
    char::from(CHECK_ALPHABET[(sum % 36) as usize])
}

/// Advisory 0.0-1.0 QoS hint: digital root of the identifying sum over 9.
#[must_use]
pub fn resonance(geographic_id: u64, service_id: u64, tier_code: u32) -> f64 {
    let n = u128::from(geographic_id) + u128::from(service_id) + u128::from(tier_code);
    let root = if n == 0 { 0 } else { 1 + (n - 1) % 9 };
    #[allow(clippy::cast_precision_loss)]
    let score = root as f64 / 9.0;
    score
}

// ============================================
// Coordinates
// ============================================

/// Scales a coordinate pair and pairs it into a geographic id.
///
/// # Errors
/// - `InvalidCoordinate` if latitude is outside ±90 or longitude outside ±180
/// - `Overflow` never in practice (scaled values are below 3.6×10^8)
pub fn encode_coordinates(latitude: f64, longitude: f64) -> Result<u64> {
    if !latitude.is_finite() || !(-LATITUDE_OFFSET..=LATITUDE_OFFSET).contains(&latitude) {
        return Err(CoreError::invalid_coordinate("latitude", latitude));
    }
    if !longitude.is_finite() || !(-LONGITUDE_OFFSET..=LONGITUDE_OFFSET).contains(&longitude) {
        return Err(CoreError::invalid_coordinate("longitude", longitude));
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (a, b) = (
        ((latitude + LATITUDE_OFFSET) * COORDINATE_SCALE).round() as u64,
        ((longitude + LONGITUDE_OFFSET) * COORDINATE_SCALE).round() as u64,
    );
    pair(a, b)
}

/// Decodes a geographic id back into `(latitude, longitude)`.
///
/// Ids that were not produced by [`encode_coordinates`] decode to values
/// outside the usual ranges; callers that re-encode must clamp.
#[must_use]
pub fn decode_coordinates(geographic_id: u64) -> (f64, f64) {
    let (a, b) = unpair(geographic_id);
    #[allow(clippy::cast_precision_loss)]
    let (a, b) = (a as f64, b as f64);
    (
        a / COORDINATE_SCALE - LATITUDE_OFFSET,
        b / COORDINATE_SCALE - LONGITUDE_OFFSET,
    )
}

/// Clamps a coordinate pair into the encodable range.
#[must_use]
pub fn clamp_coordinates(latitude: f64, longitude: f64) -> (f64, f64) {
    (
        latitude.clamp(-LATITUDE_OFFSET, LATITUDE_OFFSET),
        longitude.clamp(-LONGITUDE_OFFSET, LONGITUDE_OFFSET),
    )
}

// ============================================
// Tests
// ============================================
