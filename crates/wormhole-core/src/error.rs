// ============================================
// File: crates/wormhole-core/src/error.rs
// ============================================
//! # Core Error Types
//!
//! ## Creation Reason
//! Defines error types for the pure wormhole logic: address encoding,
//! privacy layering, routing/mesh construction and wire parsing.
//!
//! ## Error Categories
//! 1. **Codec Errors**: pairing overflow, out-of-range coordinates, bad literals
//! 2. **Layering Errors**: wrong/missing layer keys, bad layer counts
//! 3. **Wire Errors**: bad magic, truncation, checksum mismatch
//!
//! ## ⚠️ Important Note for Next Developer
//! - NEVER include key material in error messages
//! - Wire errors are expected on the hot path; keep them allocation-free
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

use wormhole_common::error::CommonError;

// ============================================
// Result Type Alias
// ============================================

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

// ============================================
// CoreError
// ============================================

/// Core error types for address, layering and protocol operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    // ========================================
    // Address Codec Errors
    // ========================================

    /// Pairing result would not fit in 64 bits.
    #[error("Pairing overflow: pair({a}, {b}) exceeds u64")]
    Overflow {
        /// First pairing operand
        a: u64,
        /// Second pairing operand
        b: u64,
    },

    /// Coordinate outside the valid latitude/longitude range.
    #[error("Invalid coordinate: {axis} = {value}")]
    InvalidCoordinate {
        /// "latitude" or "longitude"
        axis: &'static str,
        /// Offending value
        value: String,
    },

    /// Privacy level outside 0..=9.
    #[error("Invalid privacy level: {0} (expected 0-9)")]
    InvalidPrivacyLevel(u8),

    /// Unknown tier index or code.
    #[error("Invalid tier: {0}")]
    InvalidTier(u32),

    /// Address literal could not be parsed or failed its check digit.
    #[error("Invalid address '{input}': {reason}")]
    InvalidAddress {
        /// Literal that was parsed
        input: String,
        /// Why it was rejected
        reason: String,
    },

    // ========================================
    // Layering Errors
    // ========================================

    /// Layer count outside 1..=9.
    #[error("Invalid layer count: {0} (expected 1-9)")]
    InvalidLayerCount(usize),

    /// A layer was addressed that does not exist.
    #[error("Layer index {index} out of range for {count} layers")]
    LayerIndexOutOfRange {
        /// Requested layer
        index: usize,
        /// Layers present
        count: usize,
    },

    /// Not enough keys supplied to peel every layer.
    #[error("Missing key for layer {0}")]
    MissingLayerKey(usize),

    /// Decryption failed (wrong key, wrong order, or tampered ciphertext).
    #[error("Decryption failed: layer mismatch")]
    Decryption,

    /// Key derivation failed.
    #[error("Key derivation failed: {reason}")]
    KeyDerivation {
        /// Why derivation failed
        reason: String,
    },

    // ========================================
    // Wire Errors
    // ========================================

    /// Packet does not start with the protocol magic.
    #[error("Invalid magic: 0x{0:08x}")]
    InvalidMagic(u32),

    /// Packet version is not supported.
    #[error("Unsupported protocol version: {got}, expected {expected}")]
    UnsupportedVersion {
        /// Version received
        got: u8,
        /// Version expected
        expected: u8,
    },

    /// Packet ended before the header could be read.
    #[error("Truncated packet: expected at least {expected} bytes, got {actual}")]
    Truncated {
        /// Minimum expected length
        expected: usize,
        /// Actual length received
        actual: usize,
    },

    /// Header checksum does not match bytes 0-11.
    #[error("Checksum mismatch: header says 0x{expected:08x}, computed 0x{computed:08x}")]
    ChecksumMismatch {
        /// Checksum carried in the header
        expected: u32,
        /// Checksum computed over the header
        computed: u32,
    },

    /// Packet exceeds the maximum wire size.
    #[error("Packet too large: max {max} bytes, got {actual}")]
    MessageTooLarge {
        /// Maximum allowed size
        max: usize,
        /// Actual size received
        actual: usize,
    },

    // ========================================
    // Topology Errors
    // ========================================

    /// Mesh generation asked for zero nodes.
    #[error("Invalid node count: {0}")]
    InvalidNodeCount(usize),

    // ========================================
    // Wrapped Errors
    // ========================================

    /// Error from common crate.
    #[error(transparent)]
    Common(#[from] CommonError),
}

impl CoreError {
    // ========================================
    // Convenience Constructors
    // ========================================

    /// Creates an `InvalidAddress` error.
    pub fn invalid_address(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAddress {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Creates an `InvalidCoordinate` error.
    pub fn invalid_coordinate(axis: &'static str, value: f64) -> Self {
        Self::InvalidCoordinate {
            axis,
            value: value.to_string(),
        }
    }

    /// Creates a `Truncated` error.
    pub const fn truncated(expected: usize, actual: usize) -> Self {
        Self::Truncated { expected, actual }
    }

    // ========================================
    // Error Classification
    // ========================================

    /// Returns `true` for malformed-input errors on the wire path.
    ///
    /// These are always dropped and counted by the relay, never fatal.
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::InvalidMagic(_)
                | Self::UnsupportedVersion { .. }
                | Self::Truncated { .. }
                | Self::ChecksumMismatch { .. }
                | Self::MessageTooLarge { .. }
                | Self::Decryption
        )
    }

    /// Returns `true` for privacy-layer failures.
    #[must_use]
    pub const fn is_layering_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidLayerCount(_)
                | Self::LayerIndexOutOfRange { .. }
                | Self::MissingLayerKey(_)
                | Self::Decryption
                | Self::KeyDerivation { .. }
        )
    }
}

// ============================================
// Tests
// ============================================
