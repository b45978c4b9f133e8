// ============================================
// File: crates/wormhole-core/src/layering/onion.rs
// ============================================
//! # Onion Wrapping
//!
//! ## Main Functionality
//! - `OnionWrapper::wrap`: encrypts a payload once per layer, each layer
//!   over the previous layer's ciphertext
//! - `OnionWrapper::unwrap_one`: decrypts exactly one named layer
//! - `OnionWrapper::peel`: decrypts all layers outermost-first
//!
//! ## Layer Structure
//! ```text
//! layer 0: E(k0, payload)
//! layer 1: E(k1, layer 0)
//! ...
//! layer n-1: E(k(n-1), layer n-2)   <- outer address names only this relay
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Keys come from `(layer_index, seed)`; the same seed always yields the
//!   same keys, relay ids do not (they consume the wrapper's nonce)
//! - A missing or misplaced key is a hard error; there is no partial result
//!
//! ## Last Modified
//! v0.1.0 - Initial layering

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

use super::cipher::{LayerCipher, LayerKey, XorStreamCipher};
use crate::error::{CoreError, Result};

// ============================================
// Constants
// ============================================

/// Maximum number of privacy layers.
pub const MAX_LAYERS: usize = 9;

/// Scheme prefix of the outer address.
pub const OUTER_SCHEME: &str = "wh://";

/// Fixed per-layer constants mixed into relay ids.
const LAYER_CONSTANTS: [u64; MAX_LAYERS] = [
    0x9E37_79B9_7F4A_7C15,
    0xBF58_476D_1CE4_E5B9,
    0x94D0_49BB_1331_11EB,
    0xD6E8_FEB8_6659_FD93,
    0xA076_1D64_78BD_642F,
    0xE703_7ED1_A0B4_28DB,
    0x8EBC_6AF0_9C88_C6E3,
    0x5899_65CC_7537_4CC3,
    0x1D8E_4E27_C47D_124F,
];

// ============================================
// Wrapped Payload
// ============================================

/// One encryption layer and the relay it is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayHop {
    /// Position in the wrap order (0 = innermost)
    pub layer_index: usize,
    /// Hex relay identifier
    pub relay_id: String,
    /// Ciphertext produced at this layer
    pub ciphertext: Vec<u8>,
}

/// Result of wrapping a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedPayload {
    /// Layers in wrap order
    pub layers: Vec<RelayHop>,
    /// Address of the outermost relay only
    pub outer: String,
}

impl WrappedPayload {
    /// Number of layers.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Outermost layer (what goes on the wire).
    #[must_use]
    pub fn outermost(&self) -> Option<&RelayHop> {
        self.layers.last()
    }
}

// ============================================
// OnionWrapper
// ============================================

/// Wraps and unwraps payloads over a pluggable [`LayerCipher`].
///
/// # Example
/// ```
/// use wormhole_core::layering::OnionWrapper;
///
/// let onion = OnionWrapper::new();
/// let wrapped = onion.wrap(b"hello", 3, 42).unwrap();
/// let keys: Vec<_> = (0..3).map(|i| onion.layer_key(i, 42).unwrap()).collect();
/// assert_eq!(onion.peel(&wrapped, &keys).unwrap(), b"hello");
/// ```
pub struct OnionWrapper<C = XorStreamCipher> {
    cipher: C,
    nonce: AtomicU64,
}

impl OnionWrapper<XorStreamCipher> {
    /// Wrapper over the reference cipher.
    #[must_use]
    pub fn new() -> Self {
        Self::with_cipher(XorStreamCipher)
    }
}

impl Default for OnionWrapper<XorStreamCipher> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: LayerCipher> OnionWrapper<C> {
    /// Wrapper over a caller-supplied cipher.
    pub fn with_cipher(cipher: C) -> Self {
        Self {
            cipher,
            nonce: AtomicU64::new(0),
        }
    }

    /// The underlying cipher.
    pub fn cipher(&self) -> &C {
        &self.cipher
    }

    /// Key for `layer_index` under `seed`.
    ///
    /// # Errors
    /// `KeyDerivation` if the cipher's KDF fails.
    pub fn layer_key(&self, layer_index: usize, seed: u64) -> Result<LayerKey> {
        let mut material = [0u8; 16];
        material[..8].copy_from_slice(&(layer_index as u64).to_be_bytes());
        material[8..].copy_from_slice(&seed.to_be_bytes());
        self.cipher.derive_key(&material)
    }

    fn relay_id(&self, layer_index: usize, nonce: u64) -> String {
        let mut input = [0u8; 16];
        input[..8].copy_from_slice(&LAYER_CONSTANTS[layer_index].to_be_bytes());
        input[8..].copy_from_slice(&nonce.to_be_bytes());
        hex::encode(&self.cipher.hash(&input)[..8])
    }

    /// Wraps `payload` in `layer_count` layers.
    ///
    /// # Errors
    /// - `InvalidLayerCount` unless `1 <= layer_count <= 9`
    /// - `KeyDerivation` if a layer key cannot be derived
    pub fn wrap(&self, payload: &[u8], layer_count: usize, seed: u64) -> Result<WrappedPayload> {
        if !(1..=MAX_LAYERS).contains(&layer_count) {
            return Err(CoreError::InvalidLayerCount(layer_count));
        }

        let nonce = self.nonce.fetch_add(1, Ordering::Relaxed);
        let mut layers: Vec<RelayHop> = Vec::with_capacity(layer_count);

        for layer_index in 0..layer_count {
            let key = self.layer_key(layer_index, seed)?;
            let input = layers.last().map_or(payload, |hop| hop.ciphertext.as_slice());
            let ciphertext = self.cipher.encrypt(input, &key);

            layers.push(RelayHop {
                layer_index,
                relay_id: self.relay_id(layer_index, nonce),
                ciphertext,
            });
        }

        let outer = layers
            .last()
            .map(|hop| format!("{OUTER_SCHEME}{}", hop.relay_id))
            .unwrap_or_default();

        trace!(layers = layer_count, nonce, outer = %outer, "Payload wrapped");

        Ok(WrappedPayload { layers, outer })
    }

    /// Decrypts the single layer `layer_index`.
    ///
    /// Returns the previous layer's ciphertext, or the original payload for
    /// layer 0.
    ///
    /// # Errors
    /// - `LayerIndexOutOfRange` if the layer does not exist
    /// - `Decryption` if `key` is not that layer's key
    pub fn unwrap_one(
        &self,
        wrapped: &WrappedPayload,
        layer_index: usize,
        key: &LayerKey,
    ) -> Result<Vec<u8>> {
        let hop = wrapped
            .layers
            .get(layer_index)
            .ok_or(CoreError::LayerIndexOutOfRange {
                index: layer_index,
                count: wrapped.layer_count(),
            })?;
        self.cipher.decrypt(&hop.ciphertext, key)
    }

    /// Recovers the original payload. `keys[i]` must be layer `i`'s key.
    ///
    /// # Errors
    /// - `MissingLayerKey` if fewer keys than layers are supplied
    /// - `Decryption` on the first key that does not match its layer
    pub fn peel(&self, wrapped: &WrappedPayload, keys: &[LayerKey]) -> Result<Vec<u8>> {
        let Some(outermost) = wrapped.outermost() else {
            return Err(CoreError::InvalidLayerCount(0));
        };

        let mut current = outermost.ciphertext.clone();
        for layer_index in (0..wrapped.layer_count()).rev() {
            let key = keys
                .get(layer_index)
                .ok_or(CoreError::MissingLayerKey(layer_index))?;
            current = self.cipher.decrypt(&current, key)?;
        }
        Ok(current)
    }
}

impl<C> std::fmt::Debug for OnionWrapper<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnionWrapper")
            .field("nonce", &self.nonce.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

// ============================================
// Tests
// ============================================
