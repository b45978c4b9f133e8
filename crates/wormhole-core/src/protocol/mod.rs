// ============================================
// File: crates/wormhole-core/src/protocol/mod.rs
// ============================================
//! # Protocol Module
//!
//! ## Creation Reason
//! Defines the wormhole packet wire format exchanged between sender, relay
//! and destination.
//!
//! ## Main Functionality
//! - [`header`]: 16-byte header, flag bits, checksum, target sealing
//! - [`codec`]: packet encode/decode with validation
//!
//! ## Packet Flow
//! ```text
//!  Sender ── request (flags=0x0?) ──► Relay ── payload ──► Destination
//!  Sender ◄── response (flags|0x80) ── Relay ◄── reply ──── Destination
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Big-endian byte order for all multi-byte fields
//! - ANY layout change requires a version bump
//!
//! ## Last Modified
//! v0.1.0 - Initial wire format

pub mod codec;
pub mod header;

pub use codec::{decode_packet, encode_packet, target_key, Codec, PacketCodec, WormholePacket};
pub use header::{
    header_checksum, PacketFlags, WormholeHeader, HEADER_SIZE, MAGIC, MAX_PACKET_SIZE,
    MAX_PAYLOAD_SIZE, PROTOCOL_VERSION,
};
