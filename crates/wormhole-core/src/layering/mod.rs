// ============================================
// File: crates/wormhole-core/src/layering/mod.rs
// ============================================
//! # Privacy Layering
//!
//! ## Creation Reason
//! Onion-style wrapping of payloads: each layer is encrypted under its own
//! key so that a relay holding one key learns only the next layer.
//!
//! ## Main Functionality
//! - [`cipher`]: `LayerCipher` trait, `LayerKey`, reference `XorStreamCipher`
//! - [`onion`]: `OnionWrapper` (wrap / unwrap_one / peel)
//!
//! ## Last Modified
//! v0.1.0 - Initial layering module

pub mod cipher;
pub mod onion;

pub use cipher::{apply_keystream, LayerCipher, LayerKey, XorStreamCipher, LAYER_KEY_SIZE, TAG_SIZE};
pub use onion::{OnionWrapper, RelayHop, WrappedPayload, MAX_LAYERS};
