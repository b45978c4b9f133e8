// ============================================
// File: crates/wormhole-core/src/protocol/header.rs
// ============================================
//! # Wormhole Packet Header
//!
//! ## Wire Layout (big-endian, 16 bytes)
//! ```text
//! ┌───────┬─────────┬───────┬────────────────┬──────┬──────────┐
//! │ 0..4  │ 4       │ 5     │ 6..10          │10..12│ 12..16   │
//! │ magic │ version │ flags │ destination ip │ port │ checksum │
//! └───────┴─────────┴───────┴────────────────┴──────┴──────────┘
//! payload follows at byte 16
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The checksum covers bytes 0-11 only; it is not a MAC
//! - When `TARGET_ENCRYPTED` is set, bytes 6-11 are sealed on the wire and
//!   `destination_ip`/`destination_port` hold the sealed values until
//!   [`WormholeHeader::open_target`] is called
//!
//! ## Last Modified
//! v0.1.0 - Initial header definition

use std::fmt;
use std::net::{Ipv4Addr, SocketAddrV4};

use crate::layering::{apply_keystream, LayerKey};

// ============================================
// Constants
// ============================================

/// Protocol magic, ASCII "WHOL".
pub const MAGIC: u32 = 0x5748_4F4C;

/// Current protocol version.
pub const PROTOCOL_VERSION: u8 = 1;

/// Fixed header size.
pub const HEADER_SIZE: usize = 16;

/// Bytes covered by the header checksum.
pub const CHECKSUM_COVERAGE: usize = 12;

/// Largest packet accepted or produced.
pub const MAX_PACKET_SIZE: usize = 65_535;

/// Largest payload that fits in one packet.
pub const MAX_PAYLOAD_SIZE: usize = MAX_PACKET_SIZE - HEADER_SIZE;

// ============================================
// Flags
// ============================================

/// Header flag bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PacketFlags(u8);

impl PacketFlags {
    /// Bit 0: destination bytes are sealed.
    pub const TARGET_ENCRYPTED: u8 = 0x01;
    /// Bit 1: payload is layer-encrypted (opaque to the relay).
    pub const PAYLOAD_ENCRYPTED: u8 = 0x02;
    /// Bit 7: packet is a relay response.
    pub const RESPONSE: u8 = 0x80;

    /// No flags set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Wraps raw bits.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns `true` if every bit in `mask` is set.
    #[must_use]
    pub const fn contains(self, mask: u8) -> bool {
        self.0 & mask == mask
    }

    /// Copy with `mask` set.
    #[must_use]
    pub const fn with(self, mask: u8) -> Self {
        Self(self.0 | mask)
    }

    /// Target bytes are sealed.
    #[must_use]
    pub const fn is_target_encrypted(self) -> bool {
        self.contains(Self::TARGET_ENCRYPTED)
    }

    /// Payload is layer-encrypted.
    #[must_use]
    pub const fn is_payload_encrypted(self) -> bool {
        self.contains(Self::PAYLOAD_ENCRYPTED)
    }

    /// Packet is a response.
    #[must_use]
    pub const fn is_response(self) -> bool {
        self.contains(Self::RESPONSE)
    }
}

// ============================================
// Checksum
// ============================================

/// Position-weighted running hash over the first 12 header bytes.
///
/// `h = h * 31 + byte * (i + 1)`, wrapping in u32. Any single-bit change in
/// the covered bytes changes the result.
#[must_use]
pub fn header_checksum(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .take(CHECKSUM_COVERAGE)
        .zip(1u32..)
        .fold(0u32, |h, (&byte, weight)| {
            h.wrapping_mul(31).wrapping_add(u32::from(byte) * weight)
        })
}

// ============================================
// WormholeHeader
// ============================================

/// Parsed packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WormholeHeader {
    /// Protocol version
    pub version: u8,
    /// Flag bits
    pub flags: PacketFlags,
    /// Destination IPv4 (sealed when `TARGET_ENCRYPTED`)
    pub destination_ip: Ipv4Addr,
    /// Destination port (sealed when `TARGET_ENCRYPTED`)
    pub destination_port: u16,
}

impl WormholeHeader {
    /// Request header for a plaintext destination.
    #[must_use]
    pub const fn new(destination: SocketAddrV4) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            flags: PacketFlags::empty(),
            destination_ip: *destination.ip(),
            destination_port: destination.port(),
        }
    }

    /// Destination exactly as carried in the header.
    #[must_use]
    pub const fn destination(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.destination_ip, self.destination_port)
    }

    /// Copy with `flags` added.
    #[must_use]
    pub const fn with_flags(mut self, mask: u8) -> Self {
        self.flags = self.flags.with(mask);
        self
    }

    /// Seals the destination under `key` and sets `TARGET_ENCRYPTED`.
    #[must_use]
    pub fn seal_target(self, key: &LayerKey) -> Self {
        let sealed = xor_target(self.destination(), key);
        Self {
            flags: self.flags.with(PacketFlags::TARGET_ENCRYPTED),
            destination_ip: *sealed.ip(),
            destination_port: sealed.port(),
            ..self
        }
    }

    /// Recovers the plaintext destination of a sealed header.
    ///
    /// Returns the carried destination unchanged if the header is not sealed.
    #[must_use]
    pub fn open_target(&self, key: &LayerKey) -> SocketAddrV4 {
        if self.flags.is_target_encrypted() {
            xor_target(self.destination(), key)
        } else {
            self.destination()
        }
    }

    /// Header for the relay's response to this request.
    ///
    /// Keeps the request's destination bytes as-is (sealed or not) and its
    /// `TARGET_ENCRYPTED` bit, and sets `RESPONSE`.
    #[must_use]
    pub const fn response(&self) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            flags: PacketFlags::from_bits(
                (self.flags.bits() & PacketFlags::TARGET_ENCRYPTED) | PacketFlags::RESPONSE,
            ),
            destination_ip: self.destination_ip,
            destination_port: self.destination_port,
        }
    }

    /// The 12 checksummed bytes.
    #[must_use]
    pub fn covered_bytes(&self) -> [u8; CHECKSUM_COVERAGE] {
        let mut out = [0u8; CHECKSUM_COVERAGE];
        out[0..4].copy_from_slice(&MAGIC.to_be_bytes());
        out[4] = self.version;
        out[5] = self.flags.bits();
        out[6..10].copy_from_slice(&self.destination_ip.octets());
        out[10..12].copy_from_slice(&self.destination_port.to_be_bytes());
        out
    }

    /// Checksum this header will carry.
    #[must_use]
    pub fn checksum(&self) -> u32 {
        header_checksum(&self.covered_bytes())
    }
}

impl fmt::Display for WormholeHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "v{} flags=0x{:02x} dst={}",
            self.version,
            self.flags.bits(),
            self.destination()
        )
    }
}

fn xor_target(target: SocketAddrV4, key: &LayerKey) -> SocketAddrV4 {
    let mut bytes = [0u8; 6];
    bytes[..4].copy_from_slice(&target.ip().octets());
    bytes[4..].copy_from_slice(&target.port().to_be_bytes());
    apply_keystream(key, &mut bytes);
    SocketAddrV4::new(
        Ipv4Addr::new(bytes[0], bytes[1], bytes[2], bytes[3]),
        u16::from_be_bytes([bytes[4], bytes[5]]),
    )
}

// ============================================
// Tests
// ============================================
