//! Error types for token decoding and sealing.
//!
//! Each decode failure is a distinct, individually observable category so
//! the orchestrator can log the reason without ever logging token contents.
//! None of the messages carry payload values.

/// Result type alias for token operations.
pub type Result<T> = std::result::Result<T, TokenError>;

/// Errors that can occur while decoding or sealing an access token.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    /// Ciphertext malformed, truncated, or authentication failed (wrong or
    /// tampered token, or key mismatch).
    #[error("Token decryption failed")]
    DecryptionFailed,

    /// Decryption succeeded but the plaintext is not the expected
    /// structure. The detail names the offending field or shape, never its
    /// value.
    #[error("Token payload malformed: {detail}")]
    MalformedPayload { detail: String },

    /// Structure is valid but a required identifying field is absent.
    #[error("Token missing required field: {field}")]
    MissingFields { field: &'static str },

    /// No validity window present (start or end instant absent).
    #[error("Token has no validity window")]
    MissingTimeWindow,

    /// All fields present but the current time falls outside
    /// `[valid_from, valid_until]`.
    #[error("Token outside its validity window")]
    OutOfTimeWindow,

    /// Key material could not be loaded.
    #[error("Key material unavailable: {message}")]
    KeyMaterial { message: String },

    /// Sealing failed (serialization or cipher error on the issuing path).
    #[error("Token sealing failed")]
    SealFailed,
}

impl TokenError {
    /// Short category label used in rejected-scan diagnostics.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            TokenError::DecryptionFailed => "decryption_failed",
            TokenError::MalformedPayload { .. } => "malformed_payload",
            TokenError::MissingFields { .. } => "missing_fields",
            TokenError::MissingTimeWindow => "missing_time_window",
            TokenError::OutOfTimeWindow => "out_of_time_window",
            TokenError::KeyMaterial { .. } => "key_material",
            TokenError::SealFailed => "seal_failed",
        }
    }
}
