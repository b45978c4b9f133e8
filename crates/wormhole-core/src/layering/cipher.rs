// ============================================
// File: crates/wormhole-core/src/layering/cipher.rs
// ============================================
//! # Layer Cipher
//!
//! ## Creation Reason
//! Privacy layering must not care which symmetric primitive it runs on.
//! `LayerCipher` is the seam; `XorStreamCipher` is the reference
//! implementation used by default and by the wire codec's target sealing.
//!
//! ## Reference Cipher
//! ```text
//! keystream block i = SHA-256(key || i as u64 BE)
//! body              = plaintext XOR keystream
//! tag               = SHA-256(TAG_DOMAIN || key || body)[..8]
//! ciphertext        = body || tag
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - `XorStreamCipher` is NOT a secure cipher. It exists so layering can be
//!   exercised end to end. Swap in an AEAD behind `LayerCipher` for
//!   anything real.
//! - Keys are 32 bytes and never rotated; `LayerKey` zeroizes on drop
//!
//! ## Last Modified
//! v0.1.0 - Initial cipher interface and reference implementation

use std::fmt;

use hkdf::Hkdf;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CoreError, Result};

// ============================================
// Constants
// ============================================

/// Size of a layer key in bytes.
pub const LAYER_KEY_SIZE: usize = 32;

/// Size of the integrity tag appended by [`XorStreamCipher`].
pub const TAG_SIZE: usize = 8;

const KDF_SALT: &[u8] = b"wormhole-layer-v1";
const KDF_INFO: &[u8] = b"wormhole layer key";
const TAG_DOMAIN: &[u8] = b"wormhole-tag";

// ============================================
// LayerKey
// ============================================

/// Symmetric key for one privacy layer.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct LayerKey([u8; LAYER_KEY_SIZE]);

impl LayerKey {
    /// Wraps raw key bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; LAYER_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes. Do not log.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; LAYER_KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for LayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LayerKey([REDACTED])")
    }
}

// ============================================
// LayerCipher
// ============================================

/// Symmetric primitive used for privacy layers.
///
/// Implementations must be deterministic in `derive_key` and `hash`, and
/// `decrypt` must fail (never return garbage) when given the wrong key.
pub trait LayerCipher: Send + Sync {
    /// Encrypts `plaintext` under `key`.
    fn encrypt(&self, plaintext: &[u8], key: &LayerKey) -> Vec<u8>;

    /// Decrypts `ciphertext` under `key`.
    ///
    /// # Errors
    /// `Decryption` if the key is wrong or the ciphertext was altered.
    fn decrypt(&self, ciphertext: &[u8], key: &LayerKey) -> Result<Vec<u8>>;

    /// Derives a key from arbitrary input material.
    ///
    /// # Errors
    /// `KeyDerivation` if the underlying KDF rejects the request.
    fn derive_key(&self, material: &[u8]) -> Result<LayerKey>;

    /// 32-byte digest.
    fn hash(&self, data: &[u8]) -> [u8; 32];
}

// ============================================
// XorStreamCipher
// ============================================

/// Reference cipher: SHA-256 keystream XOR plus a truncated tag.
#[derive(Debug, Default, Clone, Copy)]
pub struct XorStreamCipher;

impl XorStreamCipher {
    fn tag(key: &LayerKey, body: &[u8]) -> [u8; TAG_SIZE] {
        let digest = Sha256::new()
            .chain_update(TAG_DOMAIN)
            .chain_update(key.as_bytes())
            .chain_update(body)
            .finalize();
        let mut tag = [0u8; TAG_SIZE];
        tag.copy_from_slice(&digest[..TAG_SIZE]);
        tag
    }
}

impl LayerCipher for XorStreamCipher {
    fn encrypt(&self, plaintext: &[u8], key: &LayerKey) -> Vec<u8> {
        let mut out = Vec::with_capacity(plaintext.len() + TAG_SIZE);
        out.extend_from_slice(plaintext);
        apply_keystream(key, &mut out);
        let tag = Self::tag(key, &out);
        out.extend_from_slice(&tag);
        out
    }

    fn decrypt(&self, ciphertext: &[u8], key: &LayerKey) -> Result<Vec<u8>> {
        if ciphertext.len() < TAG_SIZE {
            return Err(CoreError::Decryption);
        }
        let (body, tag) = ciphertext.split_at(ciphertext.len() - TAG_SIZE);

        let expected = Self::tag(key, body);
        // Constant-time compare.
        let diff = expected.iter().zip(tag).fold(0u8, |acc, (a, b)| acc | (a ^ b));
        if diff != 0 {
            return Err(CoreError::Decryption);
        }

        let mut out = body.to_vec();
        apply_keystream(key, &mut out);
        Ok(out)
    }

    fn derive_key(&self, material: &[u8]) -> Result<LayerKey> {
        let hk = Hkdf::<Sha256>::new(Some(KDF_SALT), material);
        let mut key_bytes = [0u8; LAYER_KEY_SIZE];
        hk.expand(KDF_INFO, &mut key_bytes)
            .map_err(|_| CoreError::KeyDerivation {
                reason: "HKDF expansion failed".into(),
            })?;
        let key = LayerKey::from_bytes(key_bytes);
        key_bytes.zeroize();
        Ok(key)
    }

    fn hash(&self, data: &[u8]) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&Sha256::digest(data));
        out
    }
}

/// XORs `data` in place with the SHA-256 keystream for `key`.
///
/// Applying it twice restores the input.
pub fn apply_keystream(key: &LayerKey, data: &mut [u8]) {
    for (counter, chunk) in data.chunks_mut(32).enumerate() {
        let block = Sha256::new()
            .chain_update(key.as_bytes())
            .chain_update((counter as u64).to_be_bytes())
            .finalize();
        for (byte, k) in chunk.iter_mut().zip(block.iter()) {
            *byte ^= k;
        }
    }
}

// ============================================
// Tests
// ============================================
