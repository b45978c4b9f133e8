// ============================================
// File: crates/wormhole-core/src/protocol/codec.rs
// ============================================
//! # Packet Codec
//!
//! ## Creation Reason
//! Binary encoding and validation of wormhole packets as they cross the
//! relay.
//!
//! ## Parsing Strategy
//! 1. Reject anything larger than `MAX_PACKET_SIZE`
//! 2. Require a full 16-byte header (`Truncated`)
//! 3. Verify the checksum over bytes 0-11 (`ChecksumMismatch`)
//! 4. Verify magic and version
//! 5. Everything after byte 16 is payload, untouched
//!
//! ## ⚠️ Important Note for Next Developer
//! - The checksum is verified BEFORE the magic, so a flipped bit anywhere
//!   in bytes 0-11 reports `ChecksumMismatch`
//! - Payloads are never copied on decode; they share the input `Bytes`
//!
//! ## Last Modified
//! v0.1.0 - Initial packet codec

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::header::{
    header_checksum, PacketFlags, WormholeHeader, CHECKSUM_COVERAGE, HEADER_SIZE, MAGIC,
    MAX_PACKET_SIZE, MAX_PAYLOAD_SIZE, PROTOCOL_VERSION,
};
use crate::error::{CoreError, Result};
use crate::layering::{LayerCipher, LayerKey, XorStreamCipher};

const TARGET_KEY_CONTEXT: &[u8] = b"wormhole-target";

// ============================================
// Codec Trait
// ============================================

/// Trait for encoding and decoding protocol messages.
pub trait Codec<T> {
    /// Encodes a message into a byte buffer.
    fn encode(&self, msg: &T, buf: &mut BytesMut);

    /// Decodes a message from bytes.
    ///
    /// # Errors
    /// Returns a malformed-input error if the bytes are not a valid `T`.
    fn decode(&self, buf: &mut Bytes) -> Result<T>;
}

// ============================================
// WormholePacket
// ============================================

/// A header plus its opaque payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WormholePacket {
    /// Parsed header
    pub header: WormholeHeader,
    /// Payload bytes
    pub payload: Bytes,
}

impl WormholePacket {
    /// Pairs a header with a payload.
    pub fn new(header: WormholeHeader, payload: impl Into<Bytes>) -> Self {
        Self {
            header,
            payload: payload.into(),
        }
    }

    /// Payload length.
    #[must_use]
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Total encoded length.
    #[must_use]
    pub fn wire_len(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

// ============================================
// PacketCodec
// ============================================

/// Codec for [`WormholePacket`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PacketCodec;

impl PacketCodec {
    /// Creates a new packet codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Codec<WormholePacket> for PacketCodec {
    fn encode(&self, msg: &WormholePacket, buf: &mut BytesMut) {
        let covered = msg.header.covered_bytes();
        buf.reserve(msg.wire_len());
        buf.put_slice(&covered);
        buf.put_u32(header_checksum(&covered));
        buf.put_slice(&msg.payload);
    }

    fn decode(&self, buf: &mut Bytes) -> Result<WormholePacket> {
        if buf.len() > MAX_PACKET_SIZE {
            return Err(CoreError::MessageTooLarge {
                max: MAX_PACKET_SIZE,
                actual: buf.len(),
            });
        }
        if buf.len() < HEADER_SIZE {
            return Err(CoreError::truncated(HEADER_SIZE, buf.len()));
        }

        let computed = header_checksum(&buf[..CHECKSUM_COVERAGE]);
        let carried = u32::from_be_bytes([buf[12], buf[13], buf[14], buf[15]]);
        if computed != carried {
            return Err(CoreError::ChecksumMismatch {
                expected: carried,
                computed,
            });
        }

        let magic = buf.get_u32();
        if magic != MAGIC {
            return Err(CoreError::InvalidMagic(magic));
        }

        let version = buf.get_u8();
        if version != PROTOCOL_VERSION {
            return Err(CoreError::UnsupportedVersion {
                got: version,
                expected: PROTOCOL_VERSION,
            });
        }

        let flags = PacketFlags::from_bits(buf.get_u8());
        let mut octets = [0u8; 4];
        buf.copy_to_slice(&mut octets);
        let destination_port = buf.get_u16();
        buf.advance(4);

        Ok(WormholePacket {
            header: WormholeHeader {
                version,
                flags,
                destination_ip: octets.into(),
                destination_port,
            },
            payload: std::mem::take(buf),
        })
    }
}

// ============================================
// Convenience Functions
// ============================================

/// Encodes a header and payload into one packet.
///
/// # Errors
/// `MessageTooLarge` if the packet would exceed `MAX_PACKET_SIZE`.
pub fn encode_packet(header: &WormholeHeader, payload: &[u8]) -> Result<Bytes> {
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(CoreError::MessageTooLarge {
            max: MAX_PACKET_SIZE,
            actual: HEADER_SIZE + payload.len(),
        });
    }
    let mut buf = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    PacketCodec.encode(
        &WormholePacket::new(*header, Bytes::copy_from_slice(payload)),
        &mut buf,
    );
    Ok(buf.freeze())
}

/// Validates and parses one packet.
///
/// # Errors
/// `MessageTooLarge`, `Truncated`, `ChecksumMismatch`, `InvalidMagic` or
/// `UnsupportedVersion`.
pub fn decode_packet(packet: Bytes) -> Result<WormholePacket> {
    let mut buf = packet;
    PacketCodec.decode(&mut buf)
}

/// Key used to seal destination bytes, derived from a shared seed.
///
/// # Errors
/// `KeyDerivation` if HKDF fails.
pub fn target_key(seed: u64) -> Result<LayerKey> {
    let mut material = [0u8; TARGET_KEY_CONTEXT.len() + 8];
    material[..TARGET_KEY_CONTEXT.len()].copy_from_slice(TARGET_KEY_CONTEXT);
    material[TARGET_KEY_CONTEXT.len()..].copy_from_slice(&seed.to_be_bytes());
    XorStreamCipher.derive_key(&material)
}

// ============================================
// Tests
// ============================================
