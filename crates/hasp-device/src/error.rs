//! Error types for the device node.

use hasp_link::LinkError;
use thiserror::Error;

/// Result alias for device controller operations.
pub type Result<T> = std::result::Result<T, DeviceError>;

/// Errors a device node can surface.
///
/// Everything recoverable (foreign frames, unknown actions, a failing
/// sensor read) is absorbed inside the controller loop; what escapes here
/// is either a startup file problem or a bus failure the transport could
/// not recover from.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The one-line address file is missing or does not hold a valid
    /// locker address. Fatal at startup.
    #[error("Address file {path}: {message}")]
    AddressFile { path: String, message: String },

    /// The device configuration file is missing or malformed. Fatal at
    /// startup.
    #[error("Config file {path}: {message}")]
    ConfigFile { path: String, message: String },

    /// Bus transport failure that survived the link layer's own recovery.
    #[error("Link error: {0}")]
    Link(#[from] LinkError),
}

impl DeviceError {
    /// Create an `AddressFile` error.
    pub fn address_file(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AddressFile {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a `ConfigFile` error.
    pub fn config_file(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigFile {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = DeviceError::address_file("/etc/hasp/address", "file not found");
        assert_eq!(
            error.to_string(),
            "Address file /etc/hasp/address: file not found"
        );
    }

    #[test]
    fn test_link_error_conversion() {
        let error: DeviceError = LinkError::TimeoutExceeded { attempts: 4 }.into();
        assert!(matches!(error, DeviceError::Link(_)));
    }
}
