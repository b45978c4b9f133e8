// ============================================
// File: crates/wormhole-relay/src/handlers/mod.rs
// ============================================
//! # Packet Handlers
//!
//! ## Creation Reason
//! Packet processing shared by both listening transports.
//!
//! ## Main Functionality
//!
//! ### Submodules
//! - [`packet`]: validate, admit, forward and respond
//!
//! ## Data Flow
//! ```text
//! Sender → UDP/TCP → Validate → Policy → Rate limit → Forward → Destination
//! Sender ← UDP/TCP ← Response header ←───────────── reply ←── Destination
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Handlers run on the per-packet task; never block
//! - Drops are counted, not answered
//!
//! ## Last Modified
//! v0.1.0 - Initial handlers structure

pub mod packet;

pub use packet::{build_response, PacketHandler};
