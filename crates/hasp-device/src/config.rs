//! Device node configuration.
//!
//! A device node is configured by a small JSON file naming its serial
//! port and address file, with every timing knob optional:
//!
//! ```json
//! {
//!     "address_file": "/etc/hasp/address",
//!     "serial_port": "/dev/ttyUSB0",
//!     "baud_rate": 9600,
//!     "settle_ms": 200
//! }
//! ```
//!
//! Omitted knobs fall back to the protocol defaults in
//! [`hasp_core::constants`], so a minimal config is just the two file
//! paths.

use std::path::{Path, PathBuf};
use std::time::Duration;

use hasp_core::constants::{
    ACK_WINDOW_MS, DEFAULT_BAUD_RATE, FEEDBACK_INTERVAL_MS, PULSE_MS, REOPEN_BACKOFF_MS,
    SETTLE_DELAY_MS,
};
use hasp_link::BusPortConfig;
use serde::{Deserialize, Serialize};

use crate::controller::ControllerConfig;
use crate::error::{DeviceError, Result};

/// Configuration for one device node, loaded from a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// One-line file holding this device's own locker address.
    pub address_file: PathBuf,

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

    /// Latch feedback sampling interval.
    #[serde(default = "default_feedback_interval_ms")]
    pub feedback_interval_ms: u64,

    /// Mid-command window after dispatching a control action.
    #[serde(default = "default_ack_window_ms")]
    pub ack_window_ms: u64,

    /// Confirmation pulse duration.
    #[serde(default = "default_pulse_ms")]
    pub pulse_ms: u64,
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

fn default_feedback_interval_ms() -> u64 {
    FEEDBACK_INTERVAL_MS
}

fn default_ack_window_ms() -> u64 {
    ACK_WINDOW_MS
}

fn default_pulse_ms() -> u64 {
    PULSE_MS
}

impl DeviceConfig {
    /// Load a device configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::ConfigFile`] when the file cannot be read
    /// or does not parse. Fatal at startup.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let shown = path.display().to_string();

        let raw = std::fs::read_to_string(path)
            .map_err(|e| DeviceError::config_file(&shown, e.to_string()))?;

        serde_json::from_str(&raw).map_err(|e| DeviceError::config_file(&shown, e.to_string()))
    }

    /// Transport timing derived from this configuration.
    #[must_use]
    pub fn port_config(&self) -> BusPortConfig {
        BusPortConfig {
            settle: Duration::from_millis(self.settle_ms),
            reopen_backoff: Duration::from_millis(self.reopen_backoff_ms),
        }
    }

    /// Controller timing derived from this configuration.
    #[must_use]
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            feedback_interval: Duration::from_millis(self.feedback_interval_ms),
            ack_window: Duration::from_millis(self.ack_window_ms),
            pulse: Duration::from_millis(self.pulse_ms),
        }
    }
}
