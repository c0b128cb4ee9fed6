//! Core constants for the locker bus protocol.
//!
//! This module defines the protocol-level constants shared by every node on
//! the bus: the frame delimiter, address constraints, timing defaults, and
//! buffer limits. Centralizing them keeps master and device firmware in
//! agreement about wire behavior.
//!
//! # Wire Format
//!
//! Every message on the bus is a JSON object wrapped by the same 3-byte
//! delimiter on both ends, followed by a newline as an inter-frame gap:
//!
//! ```text
//! ;;;{"assign_to":"A1","action":"UNLOCK","actor":"alice","timestamp":"..."};;;\n
//! ^^^                                                                     ^^^
//! opening delimiter                                         closing delimiter
//! ```
//!
//! The delimiter never appears inside a payload; [`crate::LockerAddress`]
//! validation and JSON string escaping of the remaining fields guarantee it.
//!
//! # Timing Model
//!
//! The bus is half-duplex. After each direction switch the line needs
//! [`SETTLE_DELAY_MS`] before it carries trustworthy signal. A command issuer
//! waits [`RESPONSE_WINDOW_MS`] per attempt and retransmits up to
//! [`DEFAULT_MAX_RETRIES`] times before giving up. All values are defaults;
//! node configuration may override them.

// ============================================================================
// Frame Delimiter
// ============================================================================

/// Frame delimiter marking both the start and the end of a message.
///
/// A fixed 3-byte ASCII sequence. Unlike single-byte STX/ETX framing, the
/// same sequence opens and closes a frame, so a receiver pairs delimiters in
/// arrival order.
///
/// # Examples
///
/// ```
/// use hasp_core::constants::FRAME_DELIMITER;
///
/// let framed = [FRAME_DELIMITER, b"{\"k\":1}", FRAME_DELIMITER].concat();
/// assert!(framed.starts_with(b";;;"));
/// assert!(framed.ends_with(b";;;"));
/// ```
pub const FRAME_DELIMITER: &[u8] = b";;;";

/// Length of [`FRAME_DELIMITER`] in bytes.
pub const FRAME_DELIMITER_LEN: usize = 3;

/// Inter-frame gap byte appended after the closing delimiter.
///
/// Transmitters append it so a trailing read on slow hardware has a byte to
/// terminate on; receivers treat it as noise between frames.
pub const FRAME_GAP: u8 = b'\n';

/// Total framing overhead in bytes (both delimiters, excluding the gap).
pub const FRAME_OVERHEAD: usize = FRAME_DELIMITER_LEN * 2;

// ============================================================================
// Receive Buffer Limits
// ============================================================================

/// Maximum size of the receive accumulation buffer (bytes).
///
/// Commands are small JSON objects; a buffer that grows past this limit can
/// only contain garbage (for example an unterminated opening delimiter
/// followed by noise) and is cleared rather than retained indefinitely.
pub const MAX_BUFFER_SIZE: usize = 4096;

/// Maximum length of any single string field in a command payload (bytes).
///
/// Protects the parser from a syntactically valid frame carrying absurdly
/// long field values.
pub const MAX_FIELD_LENGTH: usize = 256;

// ============================================================================
// Locker Addresses
// ============================================================================

/// Minimum locker address length (characters).
pub const MIN_ADDRESS_LENGTH: usize = 1;

/// Maximum locker address length (characters).
///
/// # Examples
///
/// ```
/// use hasp_core::constants::{MIN_ADDRESS_LENGTH, MAX_ADDRESS_LENGTH};
///
/// fn plausible(addr: &str) -> bool {
///     (MIN_ADDRESS_LENGTH..=MAX_ADDRESS_LENGTH).contains(&addr.len())
/// }
///
/// assert!(plausible("A1"));
/// assert!(!plausible(""));
/// ```
pub const MAX_ADDRESS_LENGTH: usize = 32;

// ============================================================================
// Bus Timing Defaults
// ============================================================================

/// Settle delay after a half-duplex direction switch (milliseconds).
///
/// The transceiver needs slew/settle time before the line carries valid
/// signal; this delay is honored after switching in either direction and is
/// deliberately not zero.
///
/// # Value: 200ms
pub const SETTLE_DELAY_MS: u64 = 200;

/// Response wait window per transmission attempt (milliseconds).
///
/// A command issuer polls for a matching response for this long before
/// retransmitting. The window restarts with each retransmission.
///
/// # Value: 400ms
pub const RESPONSE_WINDOW_MS: u64 = 400;

/// Default number of retransmissions after the initial send.
///
/// Once the initial transmission plus this many retries all expire without a
/// matching response, the exchange fails with a timeout. The ceiling is
/// configurable per courier; this is only the default.
///
/// # Value: 3
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Pacing sleep between receive polls inside a response window
/// (milliseconds).
///
/// Keeps the poll loop cooperative without adding meaningful latency.
///
/// # Value: 10ms
pub const POLL_INTERVAL_MS: u64 = 10;

/// Backoff before reopening the serial line after a transient I/O error
/// (milliseconds).
///
/// # Value: 1000ms
pub const REOPEN_BACKOFF_MS: u64 = 1000;

// ============================================================================
// Device Timing Defaults
// ============================================================================

/// Feedback sensor sampling interval (milliseconds).
///
/// The latch sensor is debounced by comparing consecutive samples taken this
/// far apart; a transition is only acted on when two consecutive samples
/// differ.
///
/// # Value: 100ms
pub const FEEDBACK_INTERVAL_MS: u64 = 100;

/// Mid-command window after dispatching a control action (milliseconds).
///
/// Within this window (ended early by the master's `ACK`), feedback
/// transitions are attributed to the commanded actuation rather than to a
/// manual event.
///
/// # Value: 700ms
pub const ACK_WINDOW_MS: u64 = 700;

/// Confirmation pulse duration for the audible/visual alert (milliseconds).
///
/// # Value: 100ms
pub const PULSE_MS: u64 = 100;

/// Actor name recorded for physically observed (non-commanded) events such
/// as a manual re-lock.
pub const MANUAL_EVENT_ACTOR: &str = "maintenance";

// ============================================================================
// Serial Line Defaults
// ============================================================================

/// Default baud rate for the shared bus.
///
/// # Value: 9600
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default read timeout handed to the serial driver (milliseconds).
///
/// Reads are only issued when bytes are already reported available, so this
/// bound exists to keep a misbehaving driver from stalling the poll loop.
///
/// # Value: 50ms
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 50;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delimiter_shape() {
        assert_eq!(FRAME_DELIMITER.len(), FRAME_DELIMITER_LEN);
        assert_eq!(FRAME_OVERHEAD, 6);
        assert!(FRAME_DELIMITER.iter().all(|b| *b == b';'));
    }

    #[test]
    fn test_timing_defaults_nonzero() {
        assert!(SETTLE_DELAY_MS > 0);
        assert!(RESPONSE_WINDOW_MS > 0);
        assert!(FEEDBACK_INTERVAL_MS > 0);
        assert!(ACK_WINDOW_MS >= RESPONSE_WINDOW_MS);
    }
}
