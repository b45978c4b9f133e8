// ============================================
// File: crates/wormhole-core/src/lib.rs
// ============================================
//! # Wormhole Core - Addressing, Layering & Wire Format
//!
//! ## Creation Reason
//! Holds every piece of wormhole logic that needs no I/O: the address
//! codec, onion-style privacy layering, the routing metric, the mesh
//! generator and the packet wire format used by the relay.
//!
//! ## Main Functionality
//!
//! ### Address Module ([`address`])
//! - `NetworkAddress` built from coordinates, service and tier
//! - Pairing / unpairing / check digit
//! - Compact, 128-bit-shaped and short-token renderings
//!
//! ### Layering Module ([`layering`])
//! - `LayerCipher` seam with the reference `XorStreamCipher`
//! - `OnionWrapper`: wrap / unwrap one layer / peel all layers
//!
//! ### Routing & Mesh ([`routing`], [`mesh`])
//! - Hyperbolic distance metric, pluggable next-hop strategy
//! - Synthetic mesh generation around a gateway
//!
//! ### Protocol Module ([`protocol`])
//! - 16-byte `WormholeHeader`, checksum, target sealing
//! - `PacketCodec` with validation
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              wormhole-relay                         │
//! │                    │                                │
//! │         ┌──────────┴──────────┐                     │
//! │         ▼                     ▼                     │
//! │   wormhole-core         wormhole-transport          │
//! │   You are here                │                     │
//! │         │                     │                     │
//! │         └──────────┬──────────┘                     │
//! │                    ▼                                │
//! │             wormhole-common                         │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The reference layer cipher is NOT secure; it is a placeholder behind
//!   the `LayerCipher` trait
//! - Everything here is pure and lock-free; keep I/O out of this crate
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod address;
pub mod error;
pub mod layering;
pub mod mesh;
pub mod protocol;
pub mod routing;

// Re-export commonly used items
pub use address::{NetworkAddress, Tier};
pub use error::{CoreError, Result};
pub use layering::{LayerCipher, LayerKey, OnionWrapper, WrappedPayload, XorStreamCipher};
pub use mesh::{generate, MeshGraph, MeshNode};
pub use protocol::{
    decode_packet, encode_packet, PacketFlags, WormholeHeader, WormholePacket, HEADER_SIZE,
    MAX_PACKET_SIZE,
};
pub use routing::{distance, MidpointStrategy, NextHopStrategy, Route, Router};
