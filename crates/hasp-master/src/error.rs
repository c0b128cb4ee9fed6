//! Error types for the master node.
//!
//! Only conditions that should stop the master are errors here. A
//! rejected token, an unregistered locker, or a device that never
//! answers are absorbed inside the scan cycle with a diagnostic; what
//! propagates is a config or key file that cannot be loaded, a scan
//! source that dies, or a line failure the transport could not recover.

use hasp_hardware::HardwareError;
use hasp_link::LinkError;
use hasp_token::TokenError;

/// Result type alias for master-side operations.
pub type Result<T> = std::result::Result<T, MasterError>;

/// Errors that can stop the master node.
#[derive(Debug, thiserror::Error)]
pub enum MasterError {
    /// The configuration file could not be read or parsed. Fatal at
    /// startup.
    #[error("Config file {path}: {message}")]
    ConfigFile { path: String, message: String },

    /// The token codec could not be constructed, which at startup means
    /// the key material file is unusable.
    #[error("Token codec: {0}")]
    Token(#[from] TokenError),

    /// The bus failed underneath the courier.
    #[error("Link error: {0}")]
    Link(#[from] LinkError),

    /// The scan source failed and no further scans will arrive.
    #[error("Scan source failed: {0}")]
    ScanSource(#[from] HardwareError),
}

impl MasterError {
    /// Build a [`MasterError::ConfigFile`].
    pub fn config_file(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigFile {
            path: path.into(),
            message: message.into(),
        }
    }
}
