//! Device-side firmware for one locker on the shared bus.
//!
//! A device node is the slave end of the locker bus: it listens for
//! commands addressed to it, drives a solenoid latch, watches the latch
//! feedback sensor, and reports everything it does back to the master as
//! confirmation frames.
//!
//! # Node Anatomy
//!
//! - [`DeviceController`]: the poll loop tying the pieces together,
//!   covering command dispatch, actuation, confirmation, and the manual
//!   re-lock path driven by the latch sensor.
//! - [`history`]: bounded, timestamped record of recent lock transitions
//!   for diagnostics.
//! - [`identity`]: the one-line address file a node learns its own
//!   locker address from.
//! - [`DeviceConfig`]: JSON configuration covering the serial line and
//!   every timing knob.
//!
//! # Design Philosophy
//!
//! - **Composition over inheritance**: the controller owns independent
//!   hardware collaborators behind the seams in `hasp-hardware`; nothing
//!   subclasses anything.
//! - **Fail quiet, stay up**: foreign frames, unknown actions, and
//!   transient sensor failures are logged and absorbed. The loop only
//!   stops for a bus the transport could not bring back.
//! - **Reality wins**: the feedback sensor is authoritative. A latch
//!   closed by hand is re-locked and reported, never silently ignored.
//!
//! # Example
//!
//! ```no_run
//! use hasp_device::{DeviceConfig, DeviceController, identity};
//! use hasp_hardware::mock::{MockAlert, MockBusLine, MockFeedback, MockSolenoid};
//! use hasp_link::BusPort;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DeviceConfig::load("device.json")?;
//! let address = identity::load_address(&config.address_file)?;
//!
//! let (line, _peer) = MockBusLine::pair();
//! let (solenoid, _) = MockSolenoid::new();
//! let (feedback, _) = MockFeedback::new();
//! let (alert, _) = MockAlert::new();
//!
//! let port = BusPort::with_config(line, config.port_config());
//! let mut controller = DeviceController::with_config(
//!     address,
//!     solenoid,
//!     feedback,
//!     alert,
//!     port,
//!     config.controller_config(),
//! );
//!
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! controller.run(shutdown_rx).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod history;
pub mod identity;

pub use config::DeviceConfig;
pub use controller::{ControllerConfig, DeviceController};
pub use error::{DeviceError, Result};
pub use history::{TransitionHistory, TransitionRecord, TransitionSource};
pub use identity::load_address;
