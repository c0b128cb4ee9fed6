//! Deterministic cipher-key derivation from raw key material.
//!
//! The issuing authority and every master node read the same key-material
//! file and must arrive at the same cipher key, so the derivation is fixed:
//! strip ASCII whitespace from both ends of the file bytes, hash with
//! SHA-256, use the 32-byte digest as the XChaCha20-Poly1305 key.

use crate::error::{Result, TokenError};
use chacha20poly1305::Key;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Cipher key length in bytes (SHA-256 digest size, XChaCha20 key size).
pub const KEY_LENGTH: usize = 32;

/// Derive the cipher key from raw key material.
///
/// Stable and reproducible: the same material always yields the same key,
/// on the device and at the issuing authority alike.
#[must_use]
pub fn derive_cipher_key(material: &[u8]) -> Key {
    let digest = Sha256::digest(material);
    Key::clone_from_slice(&digest)
}

/// Read key material from a file, stripping surrounding ASCII whitespace.
///
/// Key files are commonly edited by hand and pick up trailing newlines; the
/// issuing side strips them before hashing, so the device must too.
///
/// # Errors
/// Returns `TokenError::KeyMaterial` if the file cannot be read or is empty
/// after stripping.
pub fn load_key_material(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let raw = std::fs::read(path).map_err(|e| TokenError::KeyMaterial {
        message: format!("cannot read {}: {e}", path.display()),
    })?;

    let trimmed = raw.trim_ascii();
    if trimmed.is_empty() {
        return Err(TokenError::KeyMaterial {
            message: format!("{} holds no key material", path.display()),
        });
    }

    Ok(trimmed.to_vec())
}
