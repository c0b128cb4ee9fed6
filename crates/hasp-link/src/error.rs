//! Error types for bus transport and request handling.

use hasp_hardware::HardwareError;
use hasp_protocol::FrameError;

/// Result type alias for link operations.
pub type Result<T> = std::result::Result<T, LinkError>;

/// Errors that can occur while moving commands over the bus.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// Every transmission attempt went unanswered.
    ///
    /// Raised by the courier once the configured retry ceiling is spent.
    /// `attempts` counts all transmissions including the first.
    #[error("No response after {attempts} attempts")]
    TimeoutExceeded { attempts: u32 },

    /// A received frame could not be handled as a command.
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    /// The line underneath failed.
    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),
}

impl LinkError {
    /// Returns `true` if this is the courier's retry-ceiling timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimeoutExceeded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display() {
        let error = LinkError::TimeoutExceeded { attempts: 4 };
        assert_eq!(error.to_string(), "No response after 4 attempts");
        assert!(error.is_timeout());
    }

    #[test]
    fn test_frame_error_conversion() {
        let error: LinkError = FrameError::malformed("not json").into();
        assert!(matches!(error, LinkError::Frame(_)));
        assert!(!error.is_timeout());
    }

    #[test]
    fn test_hardware_error_conversion() {
        let error: LinkError = HardwareError::timeout(50).into();
        assert!(matches!(error, LinkError::Hardware(_)));
    }
}
