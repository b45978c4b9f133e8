// ============================================
// File: crates/wormhole-transport/src/lib.rs
// ============================================
//! # Wormhole Transport - Network I/O Layer
//!
//! ## Creation Reason
//! Owns the relay's inbound sockets: a UDP datagram socket and a TCP
//! listening socket, both created through socket2 and driven by Tokio.
//!
//! ## Main Functionality
//!
//! ### Modules
//! - [`traits`]: `Transport` trait and `PacketSource`
//! - [`udp`]: UDP socket implementation
//! - [`tcp`]: TCP listener and bounded stream reads
//! - `socket`: shared socket2 bind path
//! - [`error`]: Transport-specific error types
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              wormhole-relay                         │
//! │                    │                                │
//! │         ┌──────────┴──────────┐                     │
//! │         ▼                     ▼                     │
//! │   wormhole-core         wormhole-transport          │
//! │                         You are here ◄──            │
//! │         │                     │                     │
//! │         └──────────┬──────────┘                     │
//! │                    ▼                                │
//! │             wormhole-common                         │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Binding ports below 1024 requires elevated privileges
//! - Bind errors are classified so callers can keep running on the other socket
//!
//! ## Last Modified
//! v0.1.0 - Initial transport layer implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
mod socket;
pub mod tcp;
pub mod traits;
pub mod udp;

// Re-export primary types
pub use error::{Result, TransportError};
pub use tcp::{read_chunk, TcpTransport};
pub use traits::{PacketSource, Transport};
pub use udp::UdpTransport;
