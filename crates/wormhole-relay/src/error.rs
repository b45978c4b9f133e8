// ============================================
// File: crates/wormhole-relay/src/error.rs
// ============================================
//! # Relay Error Types
//!
//! ## Creation Reason
//! One error type for the relay service: configuration, startup and the
//! per-packet drop reasons.
//!
//! ## ⚠️ Important Note for Next Developer
//! - Per-packet errors are never returned to the sender; the handler maps
//!   them to a drop reason and counts them
//! - Only configuration and startup errors are fatal
//!
//! ## Last Modified
//! v0.1.0 - Initial relay errors

use std::net::{Ipv4Addr, SocketAddr};

use thiserror::Error;

use wormhole_common::error::CommonError;
use wormhole_core::error::CoreError;
use wormhole_transport::error::TransportError;

/// Result type for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Relay error types.
#[derive(Error, Debug)]
pub enum RelayError {
    // ========================================
    // Configuration / Lifecycle
    // ========================================
    /// Configuration file could not be read or parsed.
    #[error("Failed to load configuration from '{path}': {reason}")]
    ConfigLoad {
        /// File path, or `<string>` for inline TOML
        path: String,
        /// Reader or parser message
        reason: String,
    },

    /// A configuration value failed validation.
    #[error("Invalid configuration: {field} - {reason}")]
    ConfigInvalid {
        /// Dotted field name
        field: String,
        /// What is wrong with it
        reason: String,
    },

    /// Neither transport could bind.
    #[error("Relay failed to start: {reason}")]
    StartupFailed {
        /// Failure description
        reason: String,
    },

    /// `start` called on a running relay.
    #[error("Relay is already running")]
    AlreadyRunning,

    // ========================================
    // Per-packet
    // ========================================
    /// Destination denied by the access policy.
    #[error("Destination {destination} rejected by policy: {reason}")]
    PolicyRejected {
        /// Packet destination
        destination: Ipv4Addr,
        /// Which rule fired
        reason: &'static str,
    },

    /// Packet would push the rolling window over the bandwidth limit.
    #[error("Bandwidth limit exceeded: {requested} bytes over {limit} bytes/s")]
    RateLimited {
        /// Wire size of the packet
        requested: usize,
        /// Window limit in bytes
        limit: u64,
    },

    /// Exchange with the destination failed.
    #[error("Forward to {destination} failed: {reason}")]
    ForwardFailed {
        /// Destination address
        destination: SocketAddr,
        /// Socket error or oversize reply
        reason: String,
    },

    /// Destination did not answer within the forward deadline.
    #[error("Forward to {destination} timed out")]
    ForwardTimeout {
        /// Destination address
        destination: SocketAddr,
    },

    // ========================================
    // Wrapped
    // ========================================
    /// Shared value-type error.
    #[error(transparent)]
    Common(#[from] CommonError),

    /// Codec, header or layering error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Socket error.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl RelayError {
    /// Creates a `ConfigLoad` error.
    pub fn config_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `ConfigInvalid` error.
    pub fn config_invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `StartupFailed` error.
    pub fn startup_failed(reason: impl Into<String>) -> Self {
        Self::StartupFailed {
            reason: reason.into(),
        }
    }

    /// Creates a `ForwardFailed` error.
    pub fn forward_failed(destination: SocketAddr, reason: impl Into<String>) -> Self {
        Self::ForwardFailed {
            destination,
            reason: reason.into(),
        }
    }

    /// `ConfigLoad` or `ConfigInvalid`.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigLoad { .. } | Self::ConfigInvalid { .. })
    }

    /// Malformed wire input: bad header, bad sealed target, oversize.
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        match self {
            Self::Core(e) => e.is_malformed(),
            _ => false,
        }
    }

    /// Destination unreachable or too slow.
    #[must_use]
    pub const fn is_forward_error(&self) -> bool {
        matches!(self, Self::ForwardFailed { .. } | Self::ForwardTimeout { .. })
    }

    /// Errors that stop the relay rather than drop one packet.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigLoad { .. } | Self::ConfigInvalid { .. } | Self::StartupFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RelayError::config_load("/etc/wormhole/relay.toml", "file not found");
        assert!(err.to_string().contains("/etc/wormhole/relay.toml"));
    }

    #[test]
    fn test_error_classification() {
        let config_err = RelayError::config_invalid("limits.forward_timeout_secs", "must be > 0");
        assert!(config_err.is_config_error());
        assert!(config_err.is_fatal());

        let rejected = RelayError::PolicyRejected {
            destination: Ipv4Addr::new(10, 0, 0, 1),
            reason: "blocked",
        };
        assert!(!rejected.is_fatal());
        assert!(!rejected.is_malformed());

        let malformed = RelayError::from(CoreError::InvalidMagic(0));
        assert!(malformed.is_malformed());
        assert!(!malformed.is_fatal());

        let timeout = RelayError::ForwardTimeout {
            destination: "127.0.0.1:9".parse().unwrap(),
        };
        assert!(timeout.is_forward_error());
    }
}
