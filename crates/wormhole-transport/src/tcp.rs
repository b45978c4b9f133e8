// ============================================
// File: crates/wormhole-transport/src/tcp.rs
// ============================================
//! # TCP Listener Transport
//!
//! ## Creation Reason
//! The relay also accepts wormhole packets over TCP: one packet per
//! connection, answered on the same connection.
//!
//! ## Main Functionality
//! - `TcpTransport`: `SO_REUSEADDR` listening socket with a shutdown flag
//! - `read_chunk`: one bounded read with a deadline
//!
//! ## ⚠️ Important Note for Next Developer
//! - A connection delivers exactly one chunk; there is no length prefix,
//!   the packet is whatever the first read returns
//! - Never read without a deadline; a silent peer must not pin a worker
//!
//! ## Last Modified
//! v0.1.0 - Initial TCP transport

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use socket2::{Protocol, Type};
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, trace};

use crate::error::{Result, TransportError};
use crate::socket::{bind_socket, parse_addr};
use crate::traits::PacketSource;

/// Listen backlog for the relay socket.
pub const LISTEN_BACKLOG: i32 = 1024;

/// TCP listening transport.
pub struct TcpTransport {
    listener: TcpListener,
    local_addr: SocketAddr,
    closed: AtomicBool,
}

impl TcpTransport {
    /// Binds to an address literal such as `"0.0.0.0:5300"`.
    ///
    /// # Errors
    /// `Common` if the literal does not parse, otherwise see
    /// [`bind_addr`](Self::bind_addr).
    pub async fn bind(addr: impl AsRef<str>) -> Result<Self> {
        Self::bind_addr(parse_addr(addr.as_ref())?).await
    }

    /// Binds and starts listening on `addr`.
    ///
    /// # Errors
    /// `AddressInUse`, `PermissionDenied`, `Bind` or `Setup`.
    pub async fn bind_addr(addr: SocketAddr) -> Result<Self> {
        debug!(addr = %addr, "Binding TCP transport");

        let socket = bind_socket(addr, Type::STREAM, Protocol::TCP, true)?;
        socket
            .listen(LISTEN_BACKLOG)
            .map_err(|e| TransportError::from_bind(addr, e))?;

        let listener = TcpListener::from_std(socket.into())
            .map_err(|e| TransportError::setup("registering with the runtime", e))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| TransportError::setup("reading local address", e))?;

        info!(addr = %local_addr, "TCP transport listening");

        Ok(Self {
            listener,
            local_addr,
            closed: AtomicBool::new(false),
        })
    }

    /// Accepts the next inbound connection.
    ///
    /// # Errors
    /// `ShuttingDown` after shutdown, `Accept` on socket errors.
    pub async fn accept(&self) -> Result<(TcpStream, PacketSource)> {
        if !self.is_active() {
            return Err(TransportError::ShuttingDown);
        }

        let (stream, addr) = self.listener.accept().await.map_err(TransportError::Accept)?;
        trace!(from = %addr, "TCP connection accepted");

        Ok((stream, PacketSource::new(addr)))
    }

    /// Local listening address.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Marks the transport closed; later accepts fail with `ShuttingDown`.
    pub fn shutdown(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(addr = %self.local_addr, "TCP transport closed");
        }
    }

    /// `false` once shut down.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransport")
            .field("local_addr", &self.local_addr)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Performs one read into `buf`, failing after `deadline`.
///
/// Returns 0 if the peer closed without sending.
///
/// # Errors
/// `ReadTimeout` if nothing arrives in time, `Receive` on socket errors.
pub async fn read_chunk(stream: &mut TcpStream, buf: &mut [u8], deadline: Duration) -> Result<usize> {
    match tokio::time::timeout(deadline, stream.read(buf)).await {
        Ok(result) => result.map_err(TransportError::Receive),
        Err(_) => Err(TransportError::ReadTimeout(deadline)),
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn test_accept_and_read_chunk() {
        let transport = TcpTransport::bind("127.0.0.1:0").await.unwrap();
        let addr = transport.local_addr();

        let client = tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            stream.write_all(b"hello relay").await.unwrap();
            let mut reply = [0u8; 16];
            let n = stream.read(&mut reply).await.unwrap();
            reply[..n].to_vec()
        });

        let (mut stream, source) = transport.accept().await.unwrap();
        assert_eq!(source.addr.ip(), addr.ip());

        let mut buf = [0u8; 64];
        let n = read_chunk(&mut stream, &mut buf, Duration::from_secs(2)).await.unwrap();
        assert_eq!(&buf[..n], b"hello relay");

        stream.write_all(b"ok").await.unwrap();
        assert_eq!(client.await.unwrap(), b"ok");
    }

    #[tokio::test]
    async fn test_read_chunk_times_out() {
        let transport = TcpTransport::bind("127.0.0.1:0").await.unwrap();
        let _client = TcpStream::connect(transport.local_addr()).await.unwrap();
        let (mut stream, _) = transport.accept().await.unwrap();

        let mut buf = [0u8; 8];
        let err = read_chunk(&mut stream, &mut buf, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::ReadTimeout(_)));
    }

    #[tokio::test]
    async fn test_peer_close_reads_zero() {
        let transport = TcpTransport::bind("127.0.0.1:0").await.unwrap();
        let client = TcpStream::connect(transport.local_addr()).await.unwrap();
        let (mut stream, _) = transport.accept().await.unwrap();
        drop(client);

        let mut buf = [0u8; 8];
        assert_eq!(read_chunk(&mut stream, &mut buf, Duration::from_secs(2)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_second_listener_is_refused() {
        let first = TcpTransport::bind("127.0.0.1:0").await.unwrap();
        let err = TcpTransport::bind_addr(first.local_addr()).await.unwrap_err();
        assert!(err.is_bind_error(), "{err:?}");
    }

    #[tokio::test]
    async fn test_accept_after_shutdown() {
        let transport = TcpTransport::bind("127.0.0.1:0").await.unwrap();
        transport.shutdown();
        assert!(!transport.is_active());
        assert!(transport.accept().await.unwrap_err().is_shutdown());
    }
}
