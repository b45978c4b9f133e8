// ============================================
// File: crates/wormhole-transport/src/udp.rs
// ============================================
//! # UDP Transport
//!
//! ## Creation Reason
//! The relay's datagram listener.
//!
//! ## Main Functionality
//! - `UdpTransport`: bound Tokio socket behind the `Transport` trait
//!
//! ## ⚠️ Important Note for Next Developer
//! - Receive into a buffer one byte larger than the largest valid packet so
//!   oversize datagrams are visible to the decoder
//! - Shutdown is a flag; a `recv` already parked is not woken by it, the
//!   caller's select loop must watch its own shutdown signal
//!
//! ## Last Modified
//! v0.1.0 - Initial UDP transport implementation

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use socket2::{Protocol, Type};
use tokio::net::UdpSocket;
use tracing::{debug, info, trace};

use crate::error::{Result, TransportError};
use crate::socket::{bind_socket, parse_addr};
use crate::traits::{PacketSource, Transport};

/// UDP datagram transport.
///
/// # Example
/// ```ignore
/// use wormhole_transport::{Transport, UdpTransport};
///
/// let transport = UdpTransport::bind("0.0.0.0:5300").await?;
/// let mut buf = vec![0u8; 65_536];
/// let (len, source) = transport.recv(&mut buf).await?;
/// transport.send(&buf[..len], &source.addr).await?;
/// ```
pub struct UdpTransport {
    socket: UdpSocket,
    local_addr: SocketAddr,
    closed: AtomicBool,
}

impl UdpTransport {
    /// Binds to an address literal such as `"0.0.0.0:5300"`.
    ///
    /// # Errors
    /// `Common` if the literal does not parse, otherwise see
    /// [`bind_addr`](Self::bind_addr).
    pub async fn bind(addr: impl AsRef<str>) -> Result<Self> {
        Self::bind_addr(parse_addr(addr.as_ref())?).await
    }

    /// Binds to `addr`; the port must be free.
    ///
    /// # Errors
    /// `AddressInUse`, `PermissionDenied`, `Bind` or `Setup`.
    pub async fn bind_addr(addr: SocketAddr) -> Result<Self> {
        debug!(addr = %addr, "Binding UDP transport");

        let socket = bind_socket(addr, Type::DGRAM, Protocol::UDP, false)?;
        let socket = UdpSocket::from_std(socket.into())
            .map_err(|e| TransportError::setup("registering with the runtime", e))?;
        let local_addr = socket
            .local_addr()
            .map_err(|e| TransportError::setup("reading local address", e))?;

        info!(addr = %local_addr, "UDP transport bound");

        Ok(Self {
            socket,
            local_addr,
            closed: AtomicBool::new(false),
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(TransportError::ShuttingDown)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn recv(&self, buf: &mut [u8]) -> Result<(usize, PacketSource)> {
        self.ensure_open()?;

        let (len, addr) = self.socket.recv_from(buf).await.map_err(TransportError::Receive)?;
        trace!(len, from = %addr, "UDP datagram received");

        Ok((len, PacketSource::new(addr)))
    }

    async fn send(&self, buf: &[u8], dest: &SocketAddr) -> Result<usize> {
        self.ensure_open()?;

        let len = self
            .socket
            .send_to(buf, dest)
            .await
            .map_err(|source| TransportError::Send { dest: *dest, source })?;
        trace!(len, to = %dest, "UDP datagram sent");

        Ok(len)
    }

    fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.local_addr)
    }

    async fn shutdown(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(addr = %self.local_addr, "UDP transport closed");
        }
        Ok(())
    }

    fn is_active(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for UdpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UdpTransport")
            .field("local_addr", &self.local_addr)
            .field("active", &self.is_active())
            .finish()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_recv_loopback() {
        let server = UdpTransport::bind("127.0.0.1:0").await.unwrap();
        let client = UdpTransport::bind("127.0.0.1:0").await.unwrap();
        let server_addr = server.local_addr().unwrap();

        client.send(b"through the wormhole", &server_addr).await.unwrap();

        let mut buf = [0u8; 64];
        let (len, source) = server.recv(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], b"through the wormhole");
        assert_eq!(source.addr, client.local_addr().unwrap());
    }

    #[tokio::test]
    async fn test_closed_transport_refuses_io() {
        let transport = UdpTransport::bind("127.0.0.1:0").await.unwrap();
        transport.shutdown().await.unwrap();
        assert!(!transport.is_active());

        let mut buf = [0u8; 16];
        assert!(transport.recv(&mut buf).await.unwrap_err().is_shutdown());

        let dest: SocketAddr = "127.0.0.1:9".parse().unwrap();
        assert!(transport.send(b"x", &dest).await.unwrap_err().is_shutdown());
    }

    #[tokio::test]
    async fn test_bad_literal() {
        let err = UdpTransport::bind("not-an-address").await.unwrap_err();
        assert!(matches!(err, TransportError::Common(_)));
    }

    #[tokio::test]
    async fn test_port_held_by_plain_socket_is_in_use() {
        let holder = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();

        let err = UdpTransport::bind_addr(holder.local_addr().unwrap()).await.unwrap_err();
        assert!(err.is_bind_error(), "{err:?}");
    }

    #[tokio::test]
    async fn test_second_transport_on_held_port_fails() {
        let first = UdpTransport::bind("127.0.0.1:0").await.unwrap();

        let err = UdpTransport::bind_addr(first.local_addr().unwrap()).await.unwrap_err();
        assert!(matches!(err, TransportError::AddressInUse { .. }), "{err:?}");
    }
}
