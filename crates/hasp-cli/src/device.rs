//! The `hasp device` subcommand.
//!
//! Runs one locker node on the bus. Board-specific actuator drivers
//! plug in through the hardware traits; this subcommand wires the
//! simulated set, which makes a bench node that speaks the real wire
//! protocol over the real serial line.

use anyhow::{Context, Result};
use hasp_device::{DeviceConfig, DeviceController, load_address};
use hasp_hardware::mock::{MockAlert, MockFeedback, MockSolenoid};
use hasp_hardware::serial::SerialBusLine;
use hasp_link::BusPort;
use std::path::Path;
use tracing::{info, warn};

/// Load the configuration, bring up the line, and run the node until
/// Ctrl-C.
pub async fn run(config_path: &Path) -> Result<()> {
    let config = DeviceConfig::load(config_path)
        .with_context(|| format!("loading device config {}", config_path.display()))?;

    let address = load_address(&config.address_file).context("reading address file")?;

    let line = SerialBusLine::open(&config.serial_port, config.baud_rate)
        .with_context(|| format!("opening serial line {}", config.serial_port))?;
    let port = BusPort::with_config(line, config.port_config());

    let (solenoid, _solenoid_handle) = MockSolenoid::new();
    let (feedback, _feedback_handle) = MockFeedback::new();
    let (alert, _alert_handle) = MockAlert::new();
    warn!("running with simulated actuators, commands actuate nothing physical");

    info!(address = %address, port = %config.serial_port, "device node starting");
    let mut controller = DeviceController::with_config(
        address,
        solenoid,
        feedback,
        alert,
        port,
        config.controller_config(),
    );

    let shutdown = crate::shutdown_on_ctrl_c();
    controller
        .run(shutdown)
        .await
        .context("device loop failed")
}
