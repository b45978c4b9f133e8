// ============================================
// File: crates/wormhole-relay/src/services/policy.rs
// ============================================
//! # Destination Access Policy
//!
//! ## Creation Reason
//! Decides whether the relay may forward to a destination IPv4 address.
//!
//! ## Decision Order
//! 1. Deny list: any match rejects (the longest matching prefix is reported)
//! 2. Allow list: if non-empty, a destination must match one entry
//! 3. Otherwise allowed
//!
//! ## ⚠️ Important Note for Next Developer
//! - Deny ALWAYS wins, even if the allow list names the same network
//! - An empty allow list means default-allow, not default-deny
//!
//! ## Last Modified
//! v0.1.0 - Initial policy service

use std::net::Ipv4Addr;

use wormhole_common::Ipv4Cidr;

use crate::error::{RelayError, Result};

// ============================================
// PolicyVerdict
// ============================================

/// Outcome of a policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyVerdict {
    /// Destination may be relayed.
    Allowed,
    /// Destination matched the deny list.
    Blocked(Ipv4Cidr),
    /// Allow list is non-empty and nothing matched.
    NotAllowListed,
}

impl PolicyVerdict {
    /// Returns `true` for [`PolicyVerdict::Allowed`].
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

// ============================================
// AccessPolicy
// ============================================

/// Allow/deny lists over destination addresses.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    allowed: Vec<Ipv4Cidr>,
    blocked: Vec<Ipv4Cidr>,
}

impl AccessPolicy {
    /// Creates a policy.
    #[must_use]
    pub fn new(allowed: Vec<Ipv4Cidr>, blocked: Vec<Ipv4Cidr>) -> Self {
        Self { allowed, blocked }
    }

    /// Evaluates `destination`.
    #[must_use]
    pub fn evaluate(&self, destination: Ipv4Addr) -> PolicyVerdict {
        let deny = self
            .blocked
            .iter()
            .filter(|cidr| cidr.contains(destination))
            .max_by_key(|cidr| cidr.prefix_len());

        if let Some(cidr) = deny {
            return PolicyVerdict::Blocked(*cidr);
        }

        if !self.allowed.is_empty() && !self.allowed.iter().any(|cidr| cidr.contains(destination)) {
            return PolicyVerdict::NotAllowListed;
        }

        PolicyVerdict::Allowed
    }

    /// Like [`evaluate`](Self::evaluate) but as a `Result`.
    ///
    /// # Errors
    /// `PolicyRejected` unless the destination is allowed.
    pub fn check(&self, destination: Ipv4Addr) -> Result<()> {
        match self.evaluate(destination) {
            PolicyVerdict::Allowed => Ok(()),
            PolicyVerdict::Blocked(_) => Err(RelayError::PolicyRejected {
                destination,
                reason: "blocked",
            }),
            PolicyVerdict::NotAllowListed => Err(RelayError::PolicyRejected {
                destination,
                reason: "not allow-listed",
            }),
        }
    }

    /// Number of allow entries.
    #[must_use]
    pub fn allowed_len(&self) -> usize {
        self.allowed.len()
    }

    /// Number of deny entries.
    #[must_use]
    pub fn blocked_len(&self) -> usize {
        self.blocked.len()
    }
}

// ============================================
// Tests
// ============================================
