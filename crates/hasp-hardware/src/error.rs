//! Error types for hardware operations.
//!
//! This module defines error types specific to peripheral and bus line
//! operations, covering failure scenarios such as device disconnection,
//! timeouts, an unopenable serial line, and invalid data from a sensor.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during hardware device operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Device is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Operation timed out after specified duration.
    #[error("Operation timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// The serial line could not be opened.
    ///
    /// Raised when opening or reopening the bus port fails outright. At
    /// startup this is fatal: a node without its line cannot participate
    /// in the bus at all.
    #[error("Line unavailable: {port}: {message}")]
    LineUnavailable { port: String, message: String },

    /// Invalid data received from a device.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Generic I/O error.
    ///
    /// Read and write errors on an already-open line land here. These are
    /// transient: the owner closes and reopens the line, then resumes.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    /// Create a new line unavailable error.
    pub fn line_unavailable(port: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LineUnavailable {
            port: port.into(),
            message: message.into(),
        }
    }

    /// Create a new invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Whether the error rules out further use of the device.
    ///
    /// Fatal errors mean the hardware is gone or never existed; transient
    /// errors (I/O hiccups, timeouts) are recoverable by retrying or by
    /// reopening the line.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::LineUnavailable { .. } | Self::Disconnected { .. }
        )
    }
}
