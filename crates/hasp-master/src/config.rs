//! Master node configuration.
//!
//! The master is configured by a JSON file naming the serial port, the
//! key material file, and the set of slave addresses it may command:
//!
//! ```json
//! {
//!     "serial_port": "/dev/ttyUSB0",
//!     "key_file": "/etc/hasp/key",
//!     "slaves": ["A1", "A2", "B1"],
//!     "max_retries": 3,
//!     "audit_log": "/var/log/hasp/audit.log"
//! }
//! ```
//!
//! Timing knobs are optional and fall back to the protocol defaults in
//! [`hasp_core::constants`]. Slave addresses are validated during
//! deserialization, so a config with a malformed address fails to load
//! rather than silently registering an unreachable locker.

use std::path::{Path, PathBuf};
use std::time::Duration;

use hasp_core::constants::{
    DEFAULT_BAUD_RATE, DEFAULT_MAX_RETRIES, POLL_INTERVAL_MS, REOPEN_BACKOFF_MS,
    RESPONSE_WINDOW_MS, SETTLE_DELAY_MS,
};
use hasp_core::types::LockerAddress;
use hasp_link::{BusPortConfig, CourierConfig};
use serde::{Deserialize, Serialize};

use crate::error::{MasterError, Result};
use crate::registry::Registry;

/// Configuration for the master node, loaded from a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterConfig {
    /// Serial port the shared bus hangs off, such as `/dev/ttyUSB0`.
    pub serial_port: String,

    /// Bus baud rate.
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Settle delay after each half-duplex direction switch.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Backoff before reopening the line after a transient read error.
    #[serde(default = "default_reopen_backoff_ms")]
    pub reopen_backoff_ms: u64,

    /// Response window per transmission.
    #[serde(default = "default_response_window_ms")]
    pub response_window_ms: u64,

    /// Retransmissions after the first unanswered attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Pause between receive polls while a window is open, also the
    /// idle cadence for draining device reports.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Addresses of the lockers this master may command.
    pub slaves: Vec<LockerAddress>,

    /// File holding the raw token key material.
    pub key_file: PathBuf,

    /// Append-only audit log path. When absent, events stay in memory.
    #[serde(default)]
    pub audit_log: Option<PathBuf>,
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_settle_ms() -> u64 {
    SETTLE_DELAY_MS
}

fn default_reopen_backoff_ms() -> u64 {
    REOPEN_BACKOFF_MS
}

fn default_response_window_ms() -> u64 {
    RESPONSE_WINDOW_MS
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_poll_interval_ms() -> u64 {
    POLL_INTERVAL_MS
}

impl MasterConfig {
    /// Load a master configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`MasterError::ConfigFile`] when the file cannot be read
    /// or does not parse. Fatal at startup.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let shown = path.display().to_string();

        let raw = std::fs::read_to_string(path)
            .map_err(|e| MasterError::config_file(&shown, e.to_string()))?;

        serde_json::from_str(&raw).map_err(|e| MasterError::config_file(&shown, e.to_string()))
    }

    /// Transport timing derived from this configuration.
    #[must_use]
    pub fn port_config(&self) -> BusPortConfig {
        BusPortConfig {
            settle: Duration::from_millis(self.settle_ms),
            reopen_backoff: Duration::from_millis(self.reopen_backoff_ms),
        }
    }

    /// Request/response timing derived from this configuration.
    #[must_use]
    pub fn courier_config(&self) -> CourierConfig {
        CourierConfig {
            response_window: Duration::from_millis(self.response_window_ms),
            max_retries: self.max_retries,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }

    /// A registry holding one proxy per configured slave.
    #[must_use]
    pub fn registry(&self) -> Registry {
        Registry::from_addresses(self.slaves.iter().cloned())
    }
}
