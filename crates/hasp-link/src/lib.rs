//! Bus transport and request engine for the Hasp locker control system.
//!
//! This crate turns the raw half-duplex line from `hasp-hardware` into
//! something the control layers can hold a conversation over:
//!
//! - [`BusPort`] owns framing, direction discipline with settle delays,
//!   and read-error recovery for one line.
//! - [`Courier`] runs the master's request/response exchanges on top of a
//!   port: response windows, bounded retransmission, stale-frame discard,
//!   and the closing acknowledgment.
//!
//! Devices use a [`BusPort`] directly, since they only ever answer.
//! Masters wrap theirs in a [`Courier`].
//!
//! ```text
//! master                                             device
//!   Courier ── BusPort ──(line)── ── ──(line)── BusPort
//!     │  request ──────────────────────────────────▶ │
//!     │ ◀────────────────────────────── confirmation │
//!     │  ack ──────────────────────────────────────▶ │
//! ```

pub mod courier;
pub mod error;
pub mod port;

pub use courier::{Courier, CourierConfig};
pub use error::{LinkError, Result};
pub use port::{BusPort, BusPortConfig};
