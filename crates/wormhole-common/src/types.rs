// ============================================
// File: crates/wormhole-common/src/types.rs
// ============================================
//! # Core Type Definitions
//!
//! ## Creation Reason
//! Relay policy and configuration both speak in IPv4 CIDR ranges. A single
//! parsed, normalised representation avoids re-parsing strings on the
//! packet path.
//!
//! ## Main Functionality
//! - `Ipv4Cidr`: IPv4 network + prefix length, with membership tests
//! - String parsing/formatting and serde support (`"10.0.0.0/8"`)
//!
//! ## ⚠️ Important Note for Next Developer
//! - Host bits are masked off on construction (`10.1.2.3/8` == `10.0.0.0/8`)
//! - A bare address without `/len` is accepted as a `/32`
//!
//! ## Last Modified
//! v0.1.0 - Initial CIDR type

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CommonError;

// ============================================
// Ipv4Cidr
// ============================================

/// An IPv4 network in CIDR notation.
///
/// # Example
/// ```
/// use wormhole_common::types::Ipv4Cidr;
/// use std::net::Ipv4Addr;
///
/// let cidr: Ipv4Cidr = "192.168.0.0/16".parse().unwrap();
/// assert!(cidr.contains(Ipv4Addr::new(192, 168, 44, 1)));
/// assert!(!cidr.contains(Ipv4Addr::new(192, 169, 0, 1)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ipv4Cidr {
    network: Ipv4Addr,
    prefix_len: u8,
}

impl Ipv4Cidr {
    /// Creates a CIDR, masking off host bits.
    ///
    /// # Errors
    /// Returns `OutOfRange` if `prefix_len > 32`.
    pub fn new(addr: Ipv4Addr, prefix_len: u8) -> Result<Self, CommonError> {
        if prefix_len > 32 {
            return Err(CommonError::out_of_range(prefix_len, 0, 32));
        }
        let network = Ipv4Addr::from(u32::from(addr) & Self::mask_for(prefix_len));
        Ok(Self { network, prefix_len })
    }

    /// A `/32` covering exactly one host.
    #[must_use]
    pub const fn host(addr: Ipv4Addr) -> Self {
        Self {
            network: addr,
            prefix_len: 32,
        }
    }

    const fn mask_for(prefix_len: u8) -> u32 {
        if prefix_len == 0 {
            0
        } else {
            u32::MAX << (32 - prefix_len as u32)
        }
    }

    /// Network address.
    #[must_use]
    pub const fn network(&self) -> Ipv4Addr {
        self.network
    }

    /// Prefix length (0..=32).
    #[must_use]
    pub const fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Returns `true` if `addr` falls inside this range.
    #[must_use]
    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        u32::from(addr) & Self::mask_for(self.prefix_len) == u32::from(self.network)
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

impl FromStr for Ipv4Cidr {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (addr_part, prefix_part) = match s.split_once('/') {
            Some((addr, prefix)) => (addr, Some(prefix)),
            None => (s, None),
        };

        let addr: Ipv4Addr = addr_part
            .parse()
            .map_err(|_| CommonError::parse("CIDR", s, "invalid network address"))?;

        let prefix_len = match prefix_part {
            Some(p) => p
                .parse::<u8>()
                .map_err(|_| CommonError::parse("CIDR", s, "invalid prefix length"))?,
            None => 32,
        };

        if prefix_len > 32 {
            return Err(CommonError::parse("CIDR", s, "prefix length cannot exceed 32"));
        }

        Self::new(addr, prefix_len)
    }
}

impl TryFrom<String> for Ipv4Cidr {
    type Error = CommonError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Ipv4Cidr> for String {
    fn from(cidr: Ipv4Cidr) -> Self {
        cidr.to_string()
    }
}

// ============================================
// Tests
// ============================================
