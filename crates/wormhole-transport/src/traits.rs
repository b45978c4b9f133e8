// ============================================
// File: crates/wormhole-transport/src/traits.rs
// ============================================
//! # Transport Traits
//!
//! ## Creation Reason
//! The relay's datagram listener is driven through a trait so the receive
//! loop does not care which socket implementation sits underneath.
//!
//! ## Main Functionality
//! - `Transport`: datagram send/receive with an explicit shutdown
//! - `PacketSource`: sender address plus arrival time
//!
//! ## ⚠️ Important Note for Next Developer
//! - Implementations are shared by every packet worker: Send + Sync
//! - `received_at` is taken right after the socket call returns; the peer
//!   table uses it as last-seen
//!
//! ## Last Modified
//! v0.1.0 - Initial trait definitions

use std::net::SocketAddr;
use std::time::Instant;

use async_trait::async_trait;

use crate::error::Result;

// ============================================
// PacketSource
// ============================================

/// Who sent a packet (or opened a connection) and when it arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PacketSource {
    /// Remote address.
    pub addr: SocketAddr,
    /// Arrival time.
    pub received_at: Instant,
}

impl PacketSource {
    /// Stamps `addr` with the current time.
    #[must_use]
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            received_at: Instant::now(),
        }
    }
}

// ============================================
// Transport Trait
// ============================================

/// Datagram transport.
///
/// # Example
/// ```ignore
/// async fn echo<T: Transport>(transport: &T) -> Result<()> {
///     let mut buf = vec![0u8; 65_536];
///     loop {
///         let (len, source) = transport.recv(&mut buf).await?;
///         transport.send(&buf[..len], &source.addr).await?;
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Receives one datagram into `buf`.
    ///
    /// # Errors
    /// `ShuttingDown` after shutdown, `Receive` on socket errors.
    async fn recv(&self, buf: &mut [u8]) -> Result<(usize, PacketSource)>;

    /// Sends one datagram to `dest`.
    ///
    /// # Errors
    /// `ShuttingDown` after shutdown, `Send` on socket errors.
    async fn send(&self, buf: &[u8], dest: &SocketAddr) -> Result<usize>;

    /// Bound local address.
    ///
    /// # Errors
    /// Implementation-specific.
    fn local_addr(&self) -> Result<SocketAddr>;

    /// Closes the transport. Later operations fail with `ShuttingDown`.
    ///
    /// # Errors
    /// Implementation-specific.
    async fn shutdown(&self) -> Result<()>;

    /// `false` once shut down.
    fn is_active(&self) -> bool;
}
