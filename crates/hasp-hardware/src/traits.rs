//! Hardware device trait definitions.
//!
//! This module defines trait interfaces for the peripherals a locker node
//! touches: the solenoid latch, the latch feedback sensor, the alert
//! output, the badge scanner, and the shared half-duplex bus line. The
//! traits establish the contract between the control logic and the
//! peripherals, enabling substitution between mock and real hardware.
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024
//! RPITIT), eliminating the need for the `async_trait` macro. They are
//! consequently not object-safe; use generic type parameters, which is how
//! the device controller and master orchestrator consume them.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use bytes::BytesMut;
use chrono::{DateTime, Utc};
use hasp_core::types::{FeedbackState, LockState};
use std::time::Duration;

/// Transfer direction of a half-duplex bus line.
///
/// The physical line can carry traffic one way at a time. Every node idles
/// in [`Receive`](LineDirection::Receive) and switches to
/// [`Transmit`](LineDirection::Transmit) only for the duration of its own
/// frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineDirection {
    /// Driver enabled, line carries this node's output.
    Transmit,

    /// Driver released, line is listened to.
    Receive,
}

impl LineDirection {
    /// The other direction.
    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            Self::Transmit => Self::Receive,
            Self::Receive => Self::Transmit,
        }
    }

    /// Short name for logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transmit => "TX",
            Self::Receive => "RX",
        }
    }
}

impl std::fmt::Display for LineDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maximum accepted scan payload length in characters.
///
/// Sealed access tokens are a few hundred hex characters; anything past
/// this limit is noise or a misbehaving reader.
pub const MAX_SCAN_LENGTH: usize = 1024;

/// A single read from a badge or code scanner.
///
/// Carries the raw payload exactly as the reader delivered it (minus the
/// terminator most keyboard-wedge scanners append) and the instant it was
/// captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEvent {
    /// Raw scanned payload.
    pub payload: String,

    /// Timestamp when the scan was captured.
    pub timestamp: DateTime<Utc>,
}

impl ScanEvent {
    /// Create a scan event with the current timestamp.
    ///
    /// Trailing `\r` and `\n` are stripped before validation since wedge
    /// scanners terminate every read with Enter.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is empty after stripping, longer
    /// than [`MAX_SCAN_LENGTH`], or contains control characters.
    pub fn new(payload: impl Into<String>) -> Result<Self> {
        let mut payload = payload.into();
        while payload.ends_with('\n') || payload.ends_with('\r') {
            payload.pop();
        }

        if payload.is_empty() {
            return Err(crate::error::HardwareError::invalid_data(
                "empty scan payload",
            ));
        }
        if payload.len() > MAX_SCAN_LENGTH {
            return Err(crate::error::HardwareError::invalid_data(format!(
                "scan payload of {} chars exceeds limit of {}",
                payload.len(),
                MAX_SCAN_LENGTH
            )));
        }
        if payload.chars().any(char::is_control) {
            return Err(crate::error::HardwareError::invalid_data(
                "scan payload contains control characters",
            ));
        }

        Ok(Self {
            payload,
            timestamp: Utc::now(),
        })
    }

    /// Replace the capture timestamp.
    ///
    /// Useful for tests and for replaying recorded scan logs.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Solenoid latch actuator abstraction.
///
/// The latch is the mechanism that physically holds a locker door. It is
/// commanded, never sensed: what the door actually does is reported
/// separately through [`FeedbackSense`].
///
/// # Examples
///
/// ```no_run
/// use hasp_hardware::traits::SolenoidDrive;
/// use hasp_hardware::error::Result;
/// use hasp_core::types::LockState;
///
/// async fn release<S: SolenoidDrive>(latch: &mut S) -> Result<()> {
///     latch.set_state(LockState::Open).await?;
///     Ok(())
/// }
/// ```
pub trait SolenoidDrive: Send + Sync {
    /// Drive the latch to the given state.
    ///
    /// # Errors
    ///
    /// Returns an error if the actuator is disconnected or the drive
    /// operation fails.
    async fn set_state(&mut self, state: LockState) -> Result<()>;

    /// The last commanded latch state.
    ///
    /// # Errors
    ///
    /// Returns an error if the actuator cannot be queried.
    async fn state(&self) -> Result<LockState>;
}

/// Latch feedback sensor abstraction.
///
/// Reports the observed position of the latch. Readings are raw: the
/// caller is responsible for sampling at an interval and debouncing, which
/// is what the device controller's feedback loop does.
pub trait FeedbackSense: Send + Sync {
    /// Read the instantaneous sensor level.
    ///
    /// # Errors
    ///
    /// Returns an error if the sensor is disconnected or delivers an
    /// out-of-range level.
    async fn read(&mut self) -> Result<FeedbackState>;
}

/// Operator-facing alert output (buzzer, lamp).
///
/// Used for the short confirmation pulse after a locker command completes.
pub trait AlertOutput: Send + Sync {
    /// Drive the output active for the given duration, then release it.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be driven.
    async fn pulse(&mut self, duration: Duration) -> Result<()>;
}

/// Badge or code scanner abstraction.
///
/// # Examples
///
/// ```no_run
/// use hasp_hardware::traits::ScanSource;
/// use hasp_hardware::error::Result;
///
/// async fn next_payload<S: ScanSource>(scanner: &mut S) -> Result<String> {
///     let event = scanner.next_scan().await?;
///     Ok(event.payload)
/// }
/// ```
pub trait ScanSource: Send + Sync {
    /// Wait for the next scan.
    ///
    /// Blocks asynchronously until the reader delivers a payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader is disconnected.
    async fn next_scan(&mut self) -> Result<ScanEvent>;
}

/// Raw half-duplex bus line abstraction.
///
/// This is the bottom of the transport stack: bytes in, bytes out, and a
/// direction pin. It knows nothing about frames, settle timing, or
/// direction discipline; all of that is owned by the transport layered on
/// top. Implementations only perform the physical operations they are
/// asked for.
pub trait BusLine: Send + Sync {
    /// Write the given bytes and wait until they have left the wire.
    ///
    /// The drain requirement matters on a half-duplex line: the caller
    /// flips direction right after sending, and doing so before the last
    /// byte clears the transceiver truncates the frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or the line is gone.
    async fn send(&mut self, bytes: &[u8]) -> Result<()>;

    /// Append whatever input is pending to `buf` and return the byte count.
    ///
    /// Must not block waiting for data: if nothing is pending within the
    /// line's short read timeout, returns `Ok(0)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails. Such errors are transient; the
    /// caller recovers by calling [`reopen`](BusLine::reopen).
    async fn recv_available(&mut self, buf: &mut BytesMut) -> Result<usize>;

    /// Switch the line driver direction.
    ///
    /// This is the raw pin operation with no settle delay. The transport
    /// above decides when to switch and how long to wait afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver control fails.
    async fn set_direction(&mut self, direction: LineDirection) -> Result<()>;

    /// Close and reopen the line.
    ///
    /// Any input pending at the time of the reopen is discarded, the way
    /// an OS buffer is dropped when a port closes. Used to recover from
    /// transient read errors.
    ///
    /// # Errors
    ///
    /// Returns an error if the line cannot be opened again.
    async fn reopen(&mut self) -> Result<()>;

    /// Identifier of the line for logs (port path or mock label).
    fn descriptor(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_direction_flipped() {
        assert_eq!(LineDirection::Transmit.flipped(), LineDirection::Receive);
        assert_eq!(LineDirection::Receive.flipped(), LineDirection::Transmit);
    }

    #[test]
    fn test_line_direction_display() {
        assert_eq!(LineDirection::Transmit.to_string(), "TX");
        assert_eq!(LineDirection::Receive.to_string(), "RX");
    }

    #[test]
    fn test_scan_event_strips_terminator() {
        let event = ScanEvent::new("aabbcc\r\n").unwrap();
        assert_eq!(event.payload, "aabbcc");

        let event = ScanEvent::new("aabbcc\n").unwrap();
        assert_eq!(event.payload, "aabbcc");
    }

    #[test]
    fn test_scan_event_rejects_empty() {
        assert!(ScanEvent::new("").is_err());
        assert!(ScanEvent::new("\r\n").is_err());
    }

    #[test]
    fn test_scan_event_rejects_oversized() {
        let oversized = "f".repeat(MAX_SCAN_LENGTH + 1);
        assert!(ScanEvent::new(oversized).is_err());

        let at_limit = "f".repeat(MAX_SCAN_LENGTH);
        assert!(ScanEvent::new(at_limit).is_ok());
    }

    #[test]
    fn test_scan_event_rejects_interior_control_chars() {
        assert!(ScanEvent::new("aa\x07bb").is_err());
        assert!(ScanEvent::new("aa\nbb").is_err());
    }

    #[test]
    fn test_scan_event_with_timestamp() {
        use chrono::TimeZone;

        let at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let event = ScanEvent::new("aabbcc").unwrap().with_timestamp(at);
        assert_eq!(event.timestamp, at);
    }
}
