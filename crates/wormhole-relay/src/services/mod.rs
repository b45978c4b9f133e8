// ============================================
// File: crates/wormhole-relay/src/services/mod.rs
// ============================================
//! # Relay Services
//!
//! ## Creation Reason
//! The pieces the packet handler composes, each testable on its own.
//!
//! ## Main Functionality
//!
//! ### Submodules
//! - [`policy`]: destination allow/deny lists
//! - [`rate_limit`]: relay-wide rolling bandwidth budget
//! - [`peers`]: last-seen table with idle eviction
//! - [`stats`]: shared counters and snapshots
//! - [`forwarder`]: outbound request/reply exchange
//! - [`directory`]: relay selection for blocked targets
//!
//! ## Service Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Service Layer                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  ┌──────────────┐  ┌──────────────────┐  ┌──────────────┐  │
//! │  │ AccessPolicy │  │ BandwidthLimiter │  │  Forwarder   │  │
//! │  │  deny, allow │  │  rolling 1s      │  │  udp / tcp   │  │
//! │  └──────────────┘  └──────────────────┘  └──────────────┘  │
//! │                                                             │
//! │  ┌──────────────┐  ┌──────────────────┐  ┌──────────────┐  │
//! │  │  PeerTable   │  │   RelayState     │  │RelayDirectory│  │
//! │  │  last seen   │  │   counters       │  │  (CLI only)  │  │
//! │  └──────────────┘  └──────────────────┘  └──────────────┘  │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Everything here is Send + Sync and shared through `Arc`
//! - One set of services per relay instance; nothing is global
//!
//! ## Last Modified
//! v0.1.0 - Initial services structure

pub mod directory;
pub mod forwarder;
pub mod peers;
pub mod policy;
pub mod rate_limit;
pub mod stats;

// Re-export primary types
pub use directory::{BlockedTarget, RelayDirectory, RelayNode, RelayProtocol};
pub use forwarder::{Forwarder, TransportKind};
pub use peers::PeerTable;
pub use policy::{AccessPolicy, PolicyVerdict};
pub use rate_limit::BandwidthLimiter;
pub use stats::{DropReason, RelayState, RelayStats};
