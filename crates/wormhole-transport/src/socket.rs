// ============================================
// File: crates/wormhole-transport/src/socket.rs
// ============================================
//! # Socket Construction
//!
//! ## Creation Reason
//! UDP and TCP listeners are created the same way: socket2 socket,
//! non-blocking, bind with classified errors.
//!
//! ## ⚠️ Important Note for Next Developer
//! - `SO_REUSEADDR` is for the TCP listener only (quick rebinding over
//!   `TIME_WAIT`). On a UDP socket it lets two relays share one port, so
//!   a port already held must stay a bind error
//!
//! ## Last Modified
//! v0.1.0 - Shared bind path for UDP and TCP

use std::net::SocketAddr;

use socket2::{Domain, Protocol, Socket, Type};
use wormhole_common::error::CommonError;

use crate::error::{Result, TransportError};

/// Parses a `"host:port"` literal.
pub(crate) fn parse_addr(input: &str) -> Result<SocketAddr> {
    input.parse().map_err(|e: std::net::AddrParseError| {
        TransportError::from(CommonError::parse("socket address", input, e.to_string()))
    })
}

/// Creates a non-blocking socket bound to `addr`.
pub(crate) fn bind_socket(
    addr: SocketAddr,
    ty: Type,
    protocol: Protocol,
    reuse_address: bool,
) -> Result<Socket> {
    let domain = Domain::for_address(addr);

    let socket = Socket::new(domain, ty, Some(protocol))
        .map_err(|e| TransportError::setup("creating socket", e))?;
    if reuse_address {
        socket
            .set_reuse_address(true)
            .map_err(|e| TransportError::setup("setting SO_REUSEADDR", e))?;
    }
    socket
        .set_nonblocking(true)
        .map_err(|e| TransportError::setup("setting non-blocking", e))?;
    socket
        .bind(&addr.into())
        .map_err(|e| TransportError::from_bind(addr, e))?;

    Ok(socket)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_addr() {
        assert_eq!(parse_addr("127.0.0.1:5300").unwrap().port(), 5300);
        assert!(matches!(parse_addr("localhost"), Err(TransportError::Common(_))));
    }

    #[test]
    fn test_bind_socket_ephemeral() {
        let addr = "127.0.0.1:0".parse().unwrap();
        let socket = bind_socket(addr, Type::DGRAM, Protocol::UDP, false).unwrap();
        let local = socket.local_addr().unwrap().as_socket().unwrap();
        assert!(local.port() > 0);
    }

    #[test]
    fn test_udp_port_is_exclusive() {
        let addr = "127.0.0.1:0".parse().unwrap();
        let first = bind_socket(addr, Type::DGRAM, Protocol::UDP, false).unwrap();
        let held = first.local_addr().unwrap().as_socket().unwrap();

        let err = bind_socket(held, Type::DGRAM, Protocol::UDP, false).unwrap_err();
        assert!(err.is_bind_error(), "{err:?}");
    }
}
