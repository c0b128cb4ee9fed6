//! Token sealing and decoding.
//!
//! A token is `hex(nonce || ciphertext)` where the ciphertext is the
//! XChaCha20-Poly1305 encryption of a JSON object with the fields
//! `locker_id`, `actor`, `request_id`, `start_date`, `end_date`. The
//! decoder validates structure and the validity window in one pass and
//! reports each failure as its own [`TokenError`] category.

use crate::error::{Result, TokenError};
use crate::grant::{AccessGrant, GrantClaims};
use crate::keys::{derive_cipher_key, load_key_material};
use chacha20poly1305::aead::Aead;
use chacha20poly1305::{KeyInit, XChaCha20Poly1305, XNonce};
use chrono::{DateTime, Utc};
use hasp_core::{LockerAddress, WireTimestamp};
use rand::RngCore;
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;

/// Nonce length in bytes (XChaCha20-Poly1305 extended nonce).
pub const NONCE_LENGTH: usize = 24;

/// Poly1305 authentication tag length in bytes.
const TAG_LENGTH: usize = 16;

/// Seals and opens access tokens with a key derived from shared material.
pub struct TokenCodec {
    cipher: XChaCha20Poly1305,
}

impl TokenCodec {
    /// Build a codec from raw key material (see [`derive_cipher_key`]).
    #[must_use]
    pub fn new(key_material: &[u8]) -> Self {
        let key = derive_cipher_key(key_material);
        Self {
            cipher: XChaCha20Poly1305::new(&key),
        }
    }

    /// Build a codec from a key-material file.
    ///
    /// # Errors
    /// Returns `TokenError::KeyMaterial` if the file cannot be read or is
    /// empty.
    pub fn from_key_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(&load_key_material(path)?))
    }

    /// Decode and validate a token against the supplied clock value.
    ///
    /// Pure and idempotent in `(token, now)`. Succeeds only when the token
    /// authenticates, carries all identifying fields, and
    /// `valid_from <= now <= valid_until` (inclusive on both ends).
    ///
    /// # Errors
    /// - `DecryptionFailed`: not hex, truncated, or AEAD rejection;
    /// - `MalformedPayload`: valid decryption, wrong structure or types;
    /// - `MissingFields`: `locker_id` / `actor` / `request_id` absent;
    /// - `MissingTimeWindow`: `start_date` or `end_date` absent;
    /// - `OutOfTimeWindow`: window present but does not contain `now`.
    pub fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<AccessGrant> {
        let raw = hex::decode(token.trim()).map_err(|_| TokenError::DecryptionFailed)?;
        if raw.len() < NONCE_LENGTH + TAG_LENGTH {
            return Err(TokenError::DecryptionFailed);
        }

        let (nonce, ciphertext) = raw.split_at(NONCE_LENGTH);
        let plaintext = self
            .cipher
            .decrypt(XNonce::from_slice(nonce), ciphertext)
            .map_err(|_| TokenError::DecryptionFailed)?;

        let value: Value =
            serde_json::from_slice(&plaintext).map_err(|_| TokenError::MalformedPayload {
                detail: "plaintext is not valid JSON".to_string(),
            })?;
        let payload = value.as_object().ok_or_else(|| TokenError::MalformedPayload {
            detail: "plaintext is not a JSON object".to_string(),
        })?;

        let locker_raw = required_str(payload, "locker_id")?;
        let actor = required_str(payload, "actor")?.to_string();
        let request_id = required_str(payload, "request_id")?.to_string();

        let locker_id =
            LockerAddress::new(locker_raw).map_err(|_| TokenError::MalformedPayload {
                detail: "locker_id is not a valid address".to_string(),
            })?;

        let (Some(start), Some(end)) = (
            window_field(payload, "start_date"),
            window_field(payload, "end_date"),
        ) else {
            return Err(TokenError::MissingTimeWindow);
        };

        let valid_from = parse_window_instant(start, "start_date")?;
        let valid_until = parse_window_instant(end, "end_date")?;

        if valid_from > valid_until || now < valid_from || now > valid_until {
            return Err(TokenError::OutOfTimeWindow);
        }

        Ok(AccessGrant::new(
            locker_id,
            actor,
            request_id,
            valid_from,
            valid_until,
        ))
    }

    /// Seal claims into a token with a fresh OS-drawn nonce.
    ///
    /// # Errors
    /// Returns `TokenError::SealFailed` on a cipher or serialization error.
    pub fn encode(&self, claims: &GrantClaims) -> Result<String> {
        let mut nonce = [0u8; NONCE_LENGTH];
        rand::rngs::OsRng.fill_bytes(&mut nonce);
        self.encode_with_nonce(claims, &nonce)
    }

    /// Seal claims with a caller-supplied nonce.
    ///
    /// Deterministic: the same claims and nonce always yield the same
    /// token, which is what tests rely on. Callers outside tests must
    /// never reuse a nonce under the same key.
    ///
    /// # Errors
    /// Returns `TokenError::SealFailed` on a cipher or serialization error.
    pub fn encode_with_nonce(
        &self,
        claims: &GrantClaims,
        nonce: &[u8; NONCE_LENGTH],
    ) -> Result<String> {
        let payload = serde_json::json!({
            "locker_id": claims.locker_id.as_str(),
            "actor": claims.actor,
            "request_id": claims.request_id,
            "start_date": WireTimestamp::from_datetime(claims.valid_from).format(),
            "end_date": WireTimestamp::from_datetime(claims.valid_until).format(),
        });
        let plaintext = serde_json::to_vec(&payload).map_err(|_| TokenError::SealFailed)?;

        let ciphertext = self
            .cipher
            .encrypt(XNonce::from_slice(nonce), plaintext.as_slice())
            .map_err(|_| TokenError::SealFailed)?;

        let mut raw = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
        raw.extend_from_slice(nonce);
        raw.extend_from_slice(&ciphertext);
        Ok(hex::encode(raw))
    }

    /// Seal an arbitrary plaintext. Exists so tests can craft payloads the
    /// issuing path would never produce.
    #[cfg(test)]
    fn seal_raw(&self, plaintext: &[u8], nonce: &[u8; NONCE_LENGTH]) -> String {
        let ciphertext = self
            .cipher
            .encrypt(XNonce::from_slice(nonce), plaintext)
            .unwrap();
        let mut raw = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
        raw.extend_from_slice(nonce);
        raw.extend_from_slice(&ciphertext);
        hex::encode(raw)
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

/// Fetch a required string field; absent and `null` both count as missing.
fn required_str<'a>(payload: &'a Map<String, Value>, field: &'static str) -> Result<&'a str> {
    match payload.get(field) {
        None | Some(Value::Null) => Err(TokenError::MissingFields { field }),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(TokenError::MalformedPayload {
            detail: format!("{field} must be a string"),
        }),
    }
}

/// A window field counts as present only when non-null.
fn window_field<'a>(payload: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    match payload.get(field) {
        None | Some(Value::Null) => None,
        Some(v) => Some(v),
    }
}

fn parse_window_instant(value: &Value, field: &'static str) -> Result<DateTime<Utc>> {
    let s = value.as_str().ok_or_else(|| TokenError::MalformedPayload {
        detail: format!("{field} must be a string"),
    })?;
    WireTimestamp::parse(s)
        .map(|t| t.inner())
        .map_err(|_| TokenError::MalformedPayload {
            detail: format!("{field} is not ISO-8601"),
        })
}
