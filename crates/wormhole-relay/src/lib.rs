// ============================================
// File: crates/wormhole-relay/src/lib.rs
// ============================================
//! # Wormhole Relay Library
//!
//! ## Creation Reason
//! The relay service: accepts wormhole packets on UDP and TCP, checks them
//! against policy and the bandwidth budget, forwards the payload to the
//! destination carried in the header and returns the reply wrapped in a
//! response header.
//!
//! ## Main Functionality
//!
//! ### Modules
//! - [`config`]: TOML configuration
//! - [`server`]: relay lifecycle and listener loops
//! - [`services`]: policy, rate limit, peers, stats, forwarder, directory
//! - [`handlers`]: per-packet pipeline
//! - [`error`]: relay error type
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Wormhole Relay                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌─────────────┐     ┌─────────────┐     ┌─────────────────┐  │
//! │  │ RelayConfig │────►│ RelayServer │────►│ PacketHandler   │  │
//! │  └─────────────┘     └──────┬──────┘     └────────┬────────┘  │
//! │                             │                     │           │
//! │         ┌───────────────────┼─────────────────────┤           │
//! │         ▼                   ▼                     ▼           │
//! │  ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     │
//! │  │ PeerTable   │     │ Bandwidth   │     │ Forwarder   │     │
//! │  │             │     │ Limiter     │     │             │     │
//! │  └─────────────┘     └─────────────┘     └─────────────┘     │
//! │                                                               │
//! ├───────────────────────────────────────────────────────────────┤
//! │                     Transport Layer                           │
//! │  ┌─────────────────────┐     ┌─────────────────────────────┐ │
//! │  │    UDP Transport    │     │       TCP Transport         │ │
//! │  └─────────────────────┘     └─────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Data Flow
//! ```text
//! Sender → UDP/TCP → Decode → Policy → Rate limit → Forward → Destination
//! Sender ← UDP/TCP ← Response header ←──────────── reply ←─── Destination
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Configuration changes require restart (no hot-reload)
//! - Stop does not drain in-flight packets
//! - Dropped packets never get a reply; only the counters move
//!
//! ## Last Modified
//! v0.1.0 - Initial relay library

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod server;
pub mod services;

// Re-export primary types
pub use config::RelayConfig;
pub use error::{RelayError, Result};
pub use server::{RelayPhase, RelayServer};
pub use services::{RelayDirectory, RelayNode, RelayProtocol, RelayStats};
