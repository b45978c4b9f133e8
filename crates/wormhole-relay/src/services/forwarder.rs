// ============================================
// File: crates/wormhole-relay/src/services/forwarder.rs
// ============================================
//! # Forwarder
//!
//! ## Creation Reason
//! Carries a validated payload to its destination and waits for one reply.
//!
//! ## Main Functionality
//! - UDP: send one datagram from a fresh connected socket, receive one
//! - TCP: connect, write the payload, read one chunk
//! - The outbound transport mirrors the inbound one
//!
//! ## ⚠️ Important Note for Next Developer
//! - The whole exchange (connect + send + receive) shares ONE deadline
//! - No retries; a failure is reported once and the caller drops
//! - A reply larger than a wormhole payload cannot be re-wrapped and fails
//!
//! ## Last Modified
//! v0.1.0 - Initial forwarder

use std::fmt;
use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
use tracing::trace;

use wormhole_core::protocol::MAX_PAYLOAD_SIZE;

use crate::error::{RelayError, Result};

// ============================================
// TransportKind
// ============================================

/// Socket type of an exchange; outbound mirrors inbound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// Datagram
    Udp,
    /// Stream
    Tcp,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Udp => f.write_str("udp"),
            Self::Tcp => f.write_str("tcp"),
        }
    }
}

// ============================================
// Forwarder
// ============================================

/// One-shot request/reply forwarder.
#[derive(Debug, Clone, Copy)]
pub struct Forwarder {
    timeout: Duration,
}

impl Forwarder {
    /// Creates a forwarder with a per-exchange timeout.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Per-exchange timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sends `payload` to `destination` and returns the reply.
    ///
    /// # Errors
    /// `ForwardTimeout` past the deadline, `ForwardFailed` on socket errors
    /// or an oversize reply.
    pub async fn forward(
        &self,
        transport: TransportKind,
        destination: SocketAddrV4,
        payload: &[u8],
    ) -> Result<Bytes> {
        let dest = SocketAddr::V4(destination);
        let reply = match transport {
            TransportKind::Udp => self.bounded(dest, exchange_udp(dest, payload)).await?,
            TransportKind::Tcp => self.bounded(dest, exchange_tcp(dest, payload)).await?,
        };

        trace!(
            to = %dest,
            transport = %transport,
            sent = payload.len(),
            received = reply.len(),
            "Forward complete"
        );

        Ok(reply)
    }

    async fn bounded<F>(&self, dest: SocketAddr, exchange: F) -> Result<Bytes>
    where
        F: Future<Output = std::io::Result<Bytes>>,
    {
        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(reply)) if reply.len() > MAX_PAYLOAD_SIZE => Err(RelayError::forward_failed(
                dest,
                format!("reply of {} bytes exceeds payload limit", reply.len()),
            )),
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(e)) => Err(RelayError::forward_failed(dest, e.to_string())),
            Err(_) => Err(RelayError::ForwardTimeout { destination: dest }),
        }
    }
}

async fn exchange_udp(dest: SocketAddr, payload: &[u8]) -> std::io::Result<Bytes> {
    let socket = UdpSocket::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))).await?;
    socket.connect(dest).await?;
    socket.send(payload).await?;

    let mut buf = vec![0u8; MAX_PAYLOAD_SIZE + 1];
    let len = socket.recv(&mut buf).await?;
    buf.truncate(len);
    Ok(Bytes::from(buf))
}

async fn exchange_tcp(dest: SocketAddr, payload: &[u8]) -> std::io::Result<Bytes> {
    let mut stream = TcpStream::connect(dest).await?;
    stream.write_all(payload).await?;

    let mut buf = vec![0u8; MAX_PAYLOAD_SIZE + 1];
    let len = stream.read(&mut buf).await?;
    if len == 0 {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "destination closed without replying",
        ));
    }
    buf.truncate(len);
    Ok(Bytes::from(buf))
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    fn v4(addr: SocketAddr) -> SocketAddrV4 {
        match addr {
            SocketAddr::V4(v4) => v4,
            SocketAddr::V6(_) => unreachable!("loopback test sockets are IPv4"),
        }
    }

    async fn udp_echo() -> SocketAddrV4 {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = v4(socket.local_addr().unwrap());
        tokio::spawn(async move {
            let mut buf = [0u8; 2048];
            loop {
                let Ok((len, from)) = socket.recv_from(&mut buf).await else {
                    break;
                };
                let mut reply = b"echo:".to_vec();
                reply.extend_from_slice(&buf[..len]);
                let _ = socket.send_to(&reply, from).await;
            }
        });
        addr
    }

    #[tokio::test]
    async fn test_udp_exchange() {
        let dest = udp_echo().await;
        let forwarder = Forwarder::new(Duration::from_secs(2));

        let reply = forwarder.forward(TransportKind::Udp, dest, b"ping").await.unwrap();
        assert_eq!(&reply[..], b"echo:ping");
    }

    #[tokio::test]
    async fn test_tcp_exchange() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dest = v4(listener.local_addr().unwrap());
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 64];
            let n = stream.read(&mut buf).await.unwrap();
            stream.write_all(&buf[..n]).await.unwrap();
        });

        let forwarder = Forwarder::new(Duration::from_secs(2));
        let reply = forwarder.forward(TransportKind::Tcp, dest, b"hello").await.unwrap();
        assert_eq!(&reply[..], b"hello");
    }

    #[tokio::test]
    async fn test_udp_silence_times_out() {
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let dest = v4(silent.local_addr().unwrap());

        let forwarder = Forwarder::new(Duration::from_millis(100));
        let err = forwarder.forward(TransportKind::Udp, dest, b"x").await.unwrap_err();
        assert!(matches!(err, RelayError::ForwardTimeout { .. }), "{err:?}");
        assert!(err.is_forward_error());
    }

    #[tokio::test]
    async fn test_tcp_refused_fails() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dest = v4(listener.local_addr().unwrap());
        drop(listener);

        let forwarder = Forwarder::new(Duration::from_secs(2));
        let err = forwarder.forward(TransportKind::Tcp, dest, b"x").await.unwrap_err();
        assert!(err.is_forward_error(), "{err:?}");
    }

    #[tokio::test]
    async fn test_tcp_close_without_reply_fails() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dest = v4(listener.local_addr().unwrap());
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 64];
            let _ = stream.read(&mut buf).await;
        });

        let forwarder = Forwarder::new(Duration::from_secs(2));
        let err = forwarder.forward(TransportKind::Tcp, dest, b"x").await.unwrap_err();
        assert!(matches!(err, RelayError::ForwardFailed { .. }), "{err:?}");
    }
}
