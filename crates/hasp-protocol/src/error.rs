//! Frame-level error types.
//!
//! A shared half-duplex bus carries every node's traffic plus electrical
//! noise, so most of these errors are expected in normal operation and are
//! dropped silently by the transport. Variants carry just enough context
//! for a debug log and for the one case that is NOT silent: a well-formed
//! frame addressed to this node with an action it does not recognize.

use thiserror::Error;

/// Result alias for frame and command parsing operations.
pub type Result<T> = std::result::Result<T, FrameError>;

/// Errors produced while turning wire bytes into commands.
#[derive(Error, Debug)]
pub enum FrameError {
    /// Payload between delimiters is not a well-formed command object.
    ///
    /// Covers invalid UTF-8, broken JSON, wrong field types, missing
    /// fields and invalid addresses or timestamps. Receivers treat this
    /// as line noise.
    #[error("Malformed command body: {message}")]
    MalformedBody { message: String },

    /// Structurally valid command carrying an action this protocol
    /// version does not recognize.
    ///
    /// Keeps the raw action and the target address so a receiver can
    /// warn when the frame was addressed to it and stay quiet otherwise.
    #[error("Unknown action '{action}' addressed to '{assign_to}'")]
    UnknownAction { action: String, assign_to: String },

    /// Frame exceeds the configured size limit.
    #[error("Frame too large: {size} bytes (max: {max_size})")]
    Oversized { size: usize, max_size: usize },

    /// I/O error from the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    /// Create a `MalformedBody` error with a message.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedBody {
            message: message.into(),
        }
    }

    /// Returns `true` for errors a receiver on a shared bus must swallow
    /// without logging above debug level.
    #[must_use]
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::MalformedBody { .. })
    }
}
