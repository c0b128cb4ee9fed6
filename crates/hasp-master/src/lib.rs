//! Master-side control for a bank of bus-connected lockers.
//!
//! The master is the only initiator on the shared half-duplex line: it
//! turns validated access tokens into unlock exchanges and keeps an
//! audit trail of every outcome. This crate assembles the pieces the
//! binary wires together:
//!
//! - [`MasterOrchestrator`]: the scan-to-unlock cycle; owns the
//!   courier, registry, codec, and sink.
//! - [`SlaveProxy`] / [`Registry`]: one typed stand-in per registered
//!   locker; the registry bounds which addresses the master will ever
//!   transmit to.
//! - [`AuditSink`] with [`MemorySink`] and [`FileSink`]: where settled
//!   outcomes go.
//! - [`MasterConfig`]: the JSON startup file.
//!
//! # Design Philosophy
//!
//! - **Fail closed**: a token that does not decode cleanly produces
//!   nothing on the wire, and its contents never reach a log line.
//! - **Bounded patience**: every exchange gives up after a configured
//!   retransmission ceiling and is recorded as failed to open; the
//!   loop never hangs on a dead device.
//! - **Stay up**: bad scans, unknown lockers, and sink failures are
//!   diagnostics, not crashes. Only the line dying or the scan source
//!   closing stops the master.
//!
//! # Example
//!
//! ```no_run
//! use hasp_hardware::serial::SerialBusLine;
//! use hasp_hardware::wedge::LineScanner;
//! use hasp_link::{BusPort, Courier};
//! use hasp_master::{MasterConfig, MasterOrchestrator, MemorySink};
//! use hasp_token::TokenCodec;
//! use tokio::sync::watch;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MasterConfig::load("/etc/hasp/master.json")?;
//!
//!     let line = SerialBusLine::open(&config.serial_port, config.baud_rate)?;
//!     let port = BusPort::with_config(line, config.port_config());
//!     let courier = Courier::with_config(port, config.courier_config());
//!     let codec = TokenCodec::from_key_file(&config.key_file)?;
//!
//!     let mut orchestrator = MasterOrchestrator::new(
//!         courier,
//!         config.registry(),
//!         codec,
//!         MemorySink::new(),
//!     );
//!
//!     let (_shutdown_tx, shutdown_rx) = watch::channel(false);
//!     let mut scanner = LineScanner::stdin();
//!     orchestrator.run(&mut scanner, shutdown_rx).await?;
//!     Ok(())
//! }
//! ```

pub mod audit;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod proxy;
pub mod registry;

pub use audit::{AuditError, AuditEvent, AuditOutcome, AuditSink, FileSink, MemorySink};
pub use config::MasterConfig;
pub use error::{MasterError, Result};
pub use orchestrator::MasterOrchestrator;
pub use proxy::{Confirmation, SlaveProxy};
pub use registry::Registry;
