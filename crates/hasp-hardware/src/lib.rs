//! Hardware abstraction layer for the Hasp locker control system.
//!
//! This crate provides trait-based abstractions for the peripherals a
//! locker node touches: the solenoid latch, the latch feedback sensor,
//! the operator alert output, the badge scanner, and the shared
//! half-duplex bus line. The traits enable substitution between mock
//! implementations (for development and testing) and real hardware.
//!
//! # Design Philosophy
//!
//! The hardware abstraction layer is designed with the following principles:
//!
//! - **Async-first**: All I/O operations are asynchronous using native
//!   `async fn` in traits (Rust 1.90 + Edition 2024 RPITIT).
//! - **Thread-safe**: All traits require `Send + Sync` for use with Tokio.
//! - **Dumb at the bottom**: implementations perform raw operations only.
//!   Policy such as direction settle timing, feedback debouncing, and
//!   retry lives in the layers above.
//! - **Error-aware**: All operations return `Result<T>` distinguishing
//!   fatal failures (the line never opened) from transient ones (a read
//!   hiccup the caller recovers from by reopening).
//!
//! # Peripheral Traits
//!
//! ```no_run
//! use hasp_hardware::traits::{AlertOutput, SolenoidDrive};
//! use hasp_hardware::error::Result;
//! use hasp_core::types::LockState;
//! use std::time::Duration;
//!
//! async fn release_and_confirm<S, A>(latch: &mut S, alert: &mut A) -> Result<()>
//! where
//!     S: SolenoidDrive,
//!     A: AlertOutput,
//! {
//!     latch.set_state(LockState::Open).await?;
//!     alert.pulse(Duration::from_millis(100)).await?;
//!     Ok(())
//! }
//! ```
//!
//! The [`BusLine`] trait is the bottom of the transport stack: raw bytes
//! and a direction pin, with framing and timing layered on top by the
//! transport crate.
//!
//! # Implementations
//!
//! - [`mock`] provides programmable stand-ins for every trait, each
//!   paired with a test handle.
//! - [`serial`] provides [`SerialBusLine`], the real bus line over a
//!   serial adapter with RTS repurposed as the transceiver driver-enable.
//! - [`wedge`] provides [`LineScanner`], adapting keyboard-wedge scanners
//!   (or any line-oriented stream) into a [`ScanSource`].
//!
//! Real latch, sensor, and alert drivers are expected behind the
//! `hardware-*` cargo features as they materialize; until then nodes run
//! those peripherals from the mocks, emulator style.
//!
//! [`BusLine`]: traits::BusLine
//! [`ScanSource`]: traits::ScanSource
//! [`SerialBusLine`]: serial::SerialBusLine
//! [`LineScanner`]: wedge::LineScanner

pub mod error;
pub mod mock;
pub mod serial;
pub mod traits;
pub mod wedge;

// Re-export commonly used types for convenience
pub use error::{HardwareError, Result};
pub use traits::{
    AlertOutput, BusLine, FeedbackSense, LineDirection, MAX_SCAN_LENGTH, ScanEvent, ScanSource,
    SolenoidDrive,
};

// The states these peripherals speak in are defined by the core crate;
// re-exported here so hardware users need only one import path.
pub use hasp_core::types::{FeedbackState, LockState};
