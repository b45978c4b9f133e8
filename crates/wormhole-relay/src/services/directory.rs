// ============================================
// File: crates/wormhole-relay/src/services/directory.rs
// ============================================
//! # Relay Directory
//!
//! ## Creation Reason
//! Operators list the relays they know about and the targets that are
//! blocked on the direct path. The directory answers "which relay should
//! carry traffic for this target".
//!
//! ## Main Functionality
//! - `RelayNode`, `BlockedTarget`, `RelayProtocol`: configuration records
//! - `RelayDirectory::select_relay`: blocked-target lookup with fallbacks
//!
//! ## Selection Order
//! ```text
//! target (name or IPv4)
//!   │
//!   ├─ not a blocked target ───────────────► direct
//!   │
//!   └─ blocked
//!        ├─ first capable relay named in reachable_via
//!        ├─ else first capable configured relay
//!        └─ else direct
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - A node with `capable = false` is never selected
//! - Name matching is case-insensitive; IP matching is exact
//! - The directory is read-only after startup
//!
//! ## Last Modified
//! v0.1.0 - Initial relay directory

use std::fmt;
use std::net::{Ipv4Addr, SocketAddrV4};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Name of the built-in direct route.
pub const DIRECT_RELAY_NAME: &str = "direct";

// ============================================
// Records
// ============================================

/// Carrier a relay node disguises its traffic as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayProtocol {
    /// DNS-like query/response
    Dns,
    /// HTTPS-like stream
    Https,
    /// Raw datagrams
    #[default]
    Udp,
}

impl fmt::Display for RelayProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dns => write!(f, "dns"),
            Self::Https => write!(f, "https"),
            Self::Udp => write!(f, "udp"),
        }
    }
}

fn default_capable() -> bool {
    true
}

/// A known wormhole relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayNode {
    /// Unique name
    pub name: String,
    /// Relay IPv4 address
    pub ip: Ipv4Addr,
    /// Relay port
    pub port: u16,
    /// Carrier the relay speaks
    #[serde(default)]
    pub protocol: RelayProtocol,
    /// Declared able to relay; `false` takes the node out of selection
    #[serde(default = "default_capable")]
    pub capable: bool,
}

impl RelayNode {
    /// The built-in "no relay" choice.
    #[must_use]
    pub fn direct() -> Self {
        Self {
            name: DIRECT_RELAY_NAME.to_string(),
            ip: Ipv4Addr::UNSPECIFIED,
            port: 0,
            protocol: RelayProtocol::Udp,
            capable: true,
        }
    }

    /// Returns `true` for the direct fallback.
    #[must_use]
    pub fn is_direct(&self) -> bool {
        self.name == DIRECT_RELAY_NAME && self.ip.is_unspecified()
    }

    /// Relay socket address.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.ip, self.port)
    }
}

impl fmt::Display for RelayNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_direct() {
            write!(f, "{DIRECT_RELAY_NAME}")
        } else {
            write!(f, "{} ({}://{})", self.name, self.protocol, self.socket_addr())
        }
    }
}

/// A destination that cannot be reached directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedTarget {
    /// Human-readable name
    pub name: String,
    /// Target IPv4 address
    pub ip: Ipv4Addr,
    /// Why it is blocked
    #[serde(default)]
    pub reason: String,
    /// Relay names that can reach it, in preference order
    #[serde(default)]
    pub reachable_via: Vec<String>,
}

impl BlockedTarget {
    fn matches(&self, target: &str) -> bool {
        if self.name.eq_ignore_ascii_case(target) {
            return true;
        }
        target.parse::<Ipv4Addr>().is_ok_and(|ip| ip == self.ip)
    }
}

// ============================================
// RelayDirectory
// ============================================

/// Static relay and blocked-target tables.
#[derive(Debug, Clone, Default)]
pub struct RelayDirectory {
    relays: Vec<RelayNode>,
    blocked: Vec<BlockedTarget>,
}

impl RelayDirectory {
    /// Creates a directory.
    #[must_use]
    pub fn new(relays: Vec<RelayNode>, blocked: Vec<BlockedTarget>) -> Self {
        Self { relays, blocked }
    }

    /// Configured relays.
    #[must_use]
    pub fn relays(&self) -> &[RelayNode] {
        &self.relays
    }

    /// Configured blocked targets.
    #[must_use]
    pub fn blocked_targets(&self) -> &[BlockedTarget] {
        &self.blocked
    }

    /// Relay by exact name.
    #[must_use]
    pub fn relay(&self, name: &str) -> Option<&RelayNode> {
        self.relays.iter().find(|r| r.name == name)
    }

    /// Relays that declare themselves capable, in configured order.
    pub fn capable_relays(&self) -> impl Iterator<Item = &RelayNode> {
        self.relays.iter().filter(|r| r.capable)
    }

    /// Blocked target by name or IPv4 literal.
    #[must_use]
    pub fn find_blocked(&self, target: &str) -> Option<&BlockedTarget> {
        self.blocked.iter().find(|b| b.matches(target))
    }

    /// Picks the relay for `target`.
    #[must_use]
    pub fn select_relay(&self, target: &str) -> RelayNode {
        let Some(blocked) = self.find_blocked(target) else {
            return RelayNode::direct();
        };

        let preferred = blocked
            .reachable_via
            .iter()
            .filter_map(|name| self.relay(name))
            .find(|relay| relay.capable);

        let chosen = preferred
            .or_else(|| self.capable_relays().next())
            .cloned()
            .unwrap_or_else(RelayNode::direct);

        debug!(
            target = %target,
            blocked = %blocked.name,
            relay = %chosen,
            "Relay selected"
        );

        chosen
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    fn relay(name: &str, last: u8) -> RelayNode {
        RelayNode {
            name: name.to_string(),
            ip: Ipv4Addr::new(203, 0, 113, last),
            port: 5300,
            protocol: RelayProtocol::Udp,
            capable: true,
        }
    }

    fn incapable(name: &str, last: u8) -> RelayNode {
        RelayNode {
            capable: false,
            ..relay(name, last)
        }
    }

    fn blocked(name: &str, ip: Ipv4Addr, via: &[&str]) -> BlockedTarget {
        BlockedTarget {
            name: name.to_string(),
            ip,
            reason: "filtered upstream".to_string(),
            reachable_via: via.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    fn directory() -> RelayDirectory {
        RelayDirectory::new(
            vec![relay("alpha", 1), relay("beta", 2)],
            vec![
                blocked("archive", Ipv4Addr::new(198, 51, 100, 7), &["beta"]),
                blocked("mirror", Ipv4Addr::new(198, 51, 100, 8), &["gamma"]),
            ],
        )
    }

    #[test]
    fn test_reachable_via_preferred() {
        let chosen = directory().select_relay("archive");
        assert_eq!(chosen.name, "beta");
    }

    #[test]
    fn test_lookup_by_ip_and_case() {
        let dir = directory();
        assert_eq!(dir.select_relay("198.51.100.7").name, "beta");
        assert_eq!(dir.select_relay("ARCHIVE").name, "beta");
    }

    #[test]
    fn test_unknown_reachable_via_falls_back_to_first_relay() {
        assert_eq!(directory().select_relay("mirror").name, "alpha");
    }

    #[test]
    fn test_no_relays_is_direct() {
        let dir = RelayDirectory::new(
            Vec::new(),
            vec![blocked("archive", Ipv4Addr::new(198, 51, 100, 7), &["beta"])],
        );
        assert!(dir.select_relay("archive").is_direct());
    }

    #[test]
    fn test_unblocked_target_is_direct() {
        let chosen = directory().select_relay("10.0.0.1");
        assert!(chosen.is_direct());
        assert_eq!(chosen.to_string(), "direct");
    }

    #[test]
    fn test_incapable_preferred_relay_is_skipped() {
        let dir = RelayDirectory::new(
            vec![relay("alpha", 1), incapable("beta", 2), relay("gamma", 3)],
            vec![blocked("archive", Ipv4Addr::new(198, 51, 100, 7), &["beta", "gamma"])],
        );
        assert_eq!(dir.select_relay("archive").name, "gamma");
    }

    #[test]
    fn test_fallback_skips_incapable_relays() {
        let dir = RelayDirectory::new(
            vec![incapable("alpha", 1), relay("beta", 2)],
            vec![blocked("archive", Ipv4Addr::new(198, 51, 100, 7), &["alpha"])],
        );
        assert_eq!(dir.select_relay("archive").name, "beta");
        assert_eq!(dir.capable_relays().count(), 1);
    }

    #[test]
    fn test_only_incapable_relays_is_direct() {
        let dir = RelayDirectory::new(
            vec![incapable("alpha", 1)],
            vec![blocked("archive", Ipv4Addr::new(198, 51, 100, 7), &["alpha"])],
        );
        assert!(dir.select_relay("archive").is_direct());
    }

    #[test]
    fn test_relay_node_serde() {
        let node: RelayNode = toml::from_str(
            r#"
                name = "edge"
                ip = "192.0.2.10"
                port = 443
                protocol = "https"
            "#,
        )
        .unwrap();
        assert_eq!(node.protocol, RelayProtocol::Https);
        assert!(node.capable);
        assert_eq!(node.socket_addr().to_string(), "192.0.2.10:443");
        assert_eq!(node.to_string(), "edge (https://192.0.2.10:443)");

        let node: RelayNode = toml::from_str(
            r#"
                name = "resolver"
                ip = "192.0.2.53"
                port = 53
                protocol = "dns"
                capable = false
            "#,
        )
        .unwrap();
        assert_eq!(node.protocol, RelayProtocol::Dns);
        assert!(!node.capable);
    }
}
