// ============================================
// File: crates/wormhole-common/src/lib.rs
// ============================================
//! # Wormhole Common - Shared Utilities Library
//!
//! ## Creation Reason
//! Provides foundational types shared by every wormhole crate so that the
//! relay, the transports and the pure address/routing logic agree on error
//! shapes, timestamps and IPv4 address ranges.
//!
//! ## Main Functionality
//! - [`error`]: Common error type and result alias
//! - [`time`]: Lock-free timestamps for peer bookkeeping
//! - [`types`]: `Ipv4Cidr` range type used by relay policy and config
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              wormhole-relay                         │
//! │                    │                                │
//! │         ┌──────────┴──────────┐                    │
//! │         ▼                     ▼                    │
//! │   wormhole-core        wormhole-transport          │
//! │         │                     │                    │
//! │         └──────────┬──────────┘                    │
//! │                    ▼                               │
//! │             wormhole-common  ◄── You are here     │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - This crate is the foundation - changes affect everything
//! - Keep dependencies minimal (thiserror + serde only)
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod time;
pub mod types;

// Re-export commonly used items at crate root
pub use error::{CommonError, Result};
pub use time::AtomicInstant;
pub use types::Ipv4Cidr;
