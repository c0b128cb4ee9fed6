//! Access token codec for the locker system.
//!
//! Turns an opaque encrypted token string into a validated, time-bounded
//! [`AccessGrant`], and seals grant claims into tokens for the issuing side.
//!
//! # Design
//!
//! Decoding is a pure function of `(token, now)`: no retries, no side
//! effects beyond the caller-supplied clock value. Sealing takes the nonce
//! from the caller in [`TokenCodec::encode_with_nonce`] so tests can be
//! fully deterministic; [`TokenCodec::encode`] is the convenience wrapper
//! that draws one from the OS.
//!
//! # Key derivation
//!
//! The cipher key is derived from arbitrary-length raw key material by
//! hashing it with SHA-256; the 32-byte digest is the XChaCha20-Poly1305
//! key. The derivation is part of the codec's contract: the issuing
//! authority and every device derive the same key from the same material
//! file, so it must never change shape.
//!
//! # Security Properties
//!
//! - Authenticity: the AEAD tag rejects any bit flip in the token
//!   (`DecryptionFailed`), so a tampered token can never yield a
//!   different-but-plausible grant.
//! - Fail closed: every failure path is a distinct error category and none
//!   of them echo token or payload contents.

pub mod codec;
pub mod error;
pub mod grant;
pub mod keys;

pub use codec::{NONCE_LENGTH, TokenCodec};
pub use error::{Result, TokenError};
pub use grant::{AccessGrant, GrantClaims};
pub use keys::{KEY_LENGTH, derive_cipher_key, load_key_material};
