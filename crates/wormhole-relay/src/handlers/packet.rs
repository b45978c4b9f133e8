// ============================================
// File: crates/wormhole-relay/src/handlers/packet.rs
// ============================================
//! # Packet Handler
//!
//! ## Creation Reason
//! The per-packet relay pipeline shared by the UDP and TCP listeners.
//!
//! ## Main Functionality
//! - `PacketHandler::handle`: run one inbound packet to a response or a drop
//! - `build_response`: re-wrap a destination reply
//!
//! ## Packet Processing
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  1. Validate header (size, checksum, magic, version)        │
//! │     └─ fail ─► drop: malformed                              │
//! │  2. Open sealed destination if TARGET_ENCRYPTED             │
//! │     └─ no target key ─► drop: malformed                     │
//! │  3. Policy: deny list, then allow list                      │
//! │     └─ reject ─► drop: policy                               │
//! │  4. Bandwidth budget (inbound wire bytes)                   │
//! │     └─ over ─► drop: rate_limited                           │
//! │  5. Forward payload, wait for one reply                     │
//! │     └─ timeout / error ─► drop: forward_failed              │
//! │  6. Response header (RESPONSE flag) + reply                 │
//! │  7. Touch peer, count packet and bytes                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - A drop never produces bytes for the sender; silence is the only signal
//! - Exactly one counter increment per drop
//! - The payload is opaque; it is forwarded as-is, flags or not
//!
//! ## Last Modified
//! v0.1.0 - Initial relay pipeline

use std::net::SocketAddrV4;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, trace};

use wormhole_core::error::CoreError;
use wormhole_core::protocol::{decode_packet, encode_packet, WormholeHeader, WormholePacket};
use wormhole_core::LayerKey;
use wormhole_transport::PacketSource;

use crate::error::{RelayError, Result};
use crate::services::{
    AccessPolicy, BandwidthLimiter, DropReason, Forwarder, PeerTable, TransportKind, RelayState,
};

// ============================================
// PacketHandler
// ============================================

/// Runs inbound packets through validation, policy, rate limiting and
/// forwarding.
///
/// # Thread Safety
/// All operations take `&self` and can run concurrently.
pub struct PacketHandler {
    policy: AccessPolicy,
    limiter: Arc<BandwidthLimiter>,
    peers: Arc<PeerTable>,
    state: Arc<RelayState>,
    forwarder: Forwarder,
    target_key: Option<LayerKey>,
}

impl PacketHandler {
    /// Creates a handler over shared relay services.
    #[must_use]
    pub fn new(
        policy: AccessPolicy,
        limiter: Arc<BandwidthLimiter>,
        peers: Arc<PeerTable>,
        state: Arc<RelayState>,
        forwarder: Forwarder,
        target_key: Option<LayerKey>,
    ) -> Self {
        Self {
            policy,
            limiter,
            peers,
            state,
            forwarder,
            target_key,
        }
    }

    /// Handles one inbound packet from `source`.
    ///
    /// Returns the encoded response, or `None` if the packet was dropped.
    /// Drops are counted in the shared [`RelayState`]. The peer's last-seen
    /// time is the packet's arrival time.
    pub async fn handle(&self, data: Bytes, source: PacketSource, transport: TransportKind) -> Option<Bytes> {
        match self.process(data, transport).await {
            Ok((response, relayed_bytes)) => {
                self.peers.touch_at(source.addr, source.received_at, relayed_bytes);
                self.state.record_relayed(relayed_bytes);
                trace!(peer = %source.addr, bytes = relayed_bytes, "Packet relayed");
                Some(response)
            }
            Err(e) => {
                let reason = DropReason::from_error(&e);
                self.state.record_drop(reason);
                debug!(peer = %source.addr, reason = %reason, error = %e, "Packet dropped");
                None
            }
        }
    }

    /// Runs the pipeline without touching counters.
    ///
    /// Returns the response and the relayed byte count (request payload plus
    /// reply payload).
    ///
    /// # Errors
    /// Malformed header, policy rejection, rate limit or forward failure.
    pub async fn process(&self, data: Bytes, transport: TransportKind) -> Result<(Bytes, u64)> {
        let wire_len = data.len();
        let (packet, destination) = self.validate(data)?;

        self.admit(destination, wire_len)?;

        let reply = self
            .forwarder
            .forward(transport, destination, &packet.payload)
            .await?;

        let response = build_response(&packet.header, &reply)?;
        let relayed = (packet.payload.len() + reply.len()) as u64;

        Ok((response, relayed))
    }

    /// Parses the header and resolves the real destination.
    ///
    /// # Errors
    /// Any wire error from the codec; `Decryption` for a sealed destination
    /// when this relay has no target key.
    pub fn validate(&self, data: Bytes) -> Result<(WormholePacket, SocketAddrV4)> {
        let packet = decode_packet(data)?;

        let destination = if packet.header.flags.is_target_encrypted() {
            let key = self.target_key.as_ref().ok_or(CoreError::Decryption)?;
            packet.header.open_target(key)
        } else {
            packet.header.destination()
        };

        Ok((packet, destination))
    }

    /// Applies policy and the bandwidth budget.
    ///
    /// # Errors
    /// `PolicyRejected` or `RateLimited`.
    pub fn admit(&self, destination: SocketAddrV4, wire_len: usize) -> Result<()> {
        self.policy.check(*destination.ip())?;

        if !self.limiter.try_consume(wire_len) {
            return Err(RelayError::RateLimited {
                requested: wire_len,
                limit: self.limiter.limit_bytes(),
            });
        }

        Ok(())
    }

    /// Shared counters.
    #[must_use]
    pub fn state(&self) -> &Arc<RelayState> {
        &self.state
    }
}

impl std::fmt::Debug for PacketHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PacketHandler")
            .field("policy", &self.policy)
            .field("limit_bytes", &self.limiter.limit_bytes())
            .field("forwarder", &self.forwarder)
            .field("target_key", &self.target_key.is_some())
            .finish()
    }
}

/// Encodes `reply` under the response header for `request`.
///
/// # Errors
/// `MessageTooLarge` if the reply does not fit in one packet.
pub fn build_response(request: &WormholeHeader, reply: &[u8]) -> Result<Bytes> {
    Ok(encode_packet(&request.response(), reply)?)
}

// ============================================
// Tests
// ============================================
