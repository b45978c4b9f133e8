// ============================================
// File: crates/wormhole-transport/src/error.rs
// ============================================
//! # Transport Error Types
//!
//! ## Creation Reason
//! Errors from the relay's listening sockets.
//!
//! ## Error Categories
//! 1. **Bind**: address in use, permission denied, anything else at bind time
//! 2. **I/O**: send, receive, accept, bounded reads
//! 3. **Lifecycle**: use after shutdown
//!
//! ## ⚠️ Important Note for Next Developer
//! - A bind error takes down ONE transport; the relay keeps the other
//! - The underlying `io::Error` is kept as the source, not flattened
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use wormhole_common::error::CommonError;

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Transport layer error types.
#[derive(Error, Debug)]
pub enum TransportError {
    // ========================================
    // Bind Errors
    // ========================================

    /// Another socket already holds the address.
    #[error("Address {addr} already in use")]
    AddressInUse {
        /// Requested address
        addr: SocketAddr,
    },

    /// Not allowed to bind the address (usually a privileged port).
    #[error("Permission denied binding {addr}")]
    PermissionDenied {
        /// Requested address
        addr: SocketAddr,
    },

    /// Any other bind or listen failure.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// Requested address
        addr: SocketAddr,
        /// OS error
        source: io::Error,
    },

    /// Socket creation or option setup failed before binding.
    #[error("Socket setup failed while {step}: {source}")]
    Setup {
        /// What was being done
        step: &'static str,
        /// OS error
        source: io::Error,
    },

    // ========================================
    // I/O Errors
    // ========================================

    /// Sending a datagram failed.
    #[error("Failed to send to {dest}: {source}")]
    Send {
        /// Destination
        dest: SocketAddr,
        /// OS error
        source: io::Error,
    },

    /// Receiving failed.
    #[error("Failed to receive: {0}")]
    Receive(#[source] io::Error),

    /// Accepting a connection failed.
    #[error("Failed to accept connection: {0}")]
    Accept(#[source] io::Error),

    /// Nothing arrived before the deadline.
    #[error("No data within {0:?}")]
    ReadTimeout(Duration),

    // ========================================
    // Lifecycle
    // ========================================

    /// Transport has been shut down.
    #[error("Transport is shutting down")]
    ShuttingDown,

    /// Input rejected by the common validators.
    #[error(transparent)]
    Common(#[from] CommonError),
}

impl TransportError {
    /// Classifies an error returned by `bind` or `listen`.
    #[must_use]
    pub fn from_bind(addr: SocketAddr, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::AddrInUse => Self::AddressInUse { addr },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { addr },
            _ => Self::Bind { addr, source },
        }
    }

    /// Creates a `Setup` error.
    #[must_use]
    pub fn setup(step: &'static str, source: io::Error) -> Self {
        Self::Setup { step, source }
    }

    /// `true` for failures that happened while binding.
    #[must_use]
    pub const fn is_bind_error(&self) -> bool {
        matches!(
            self,
            Self::AddressInUse { .. } | Self::PermissionDenied { .. } | Self::Bind { .. }
        )
    }

    /// `true` once the transport has been shut down.
    #[must_use]
    pub const fn is_shutdown(&self) -> bool {
        matches!(self, Self::ShuttingDown)
    }
}
