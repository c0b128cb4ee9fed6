//! Framed transport over a half-duplex bus line.
//!
//! [`BusPort`] is the layer between raw bytes and commands. It owns the
//! three things the line itself refuses to know about:
//!
//! - **Framing**: outgoing commands are wrapped in delimiters, incoming
//!   bytes are accumulated and reassembled by a [`StreamParser`], so a
//!   frame split across reads comes out whole and noise comes out not at
//!   all.
//! - **Direction discipline**: the port tracks which way the line points
//!   and is the only place that switches it. Every switch, in either
//!   direction, is followed by a settle delay before traffic continues,
//!   giving the transceivers on a multi-drop bus time to turn around.
//! - **Read recovery**: a transient read error closes and reopens the
//!   line after a backoff, then resumes. Only a line that cannot be
//!   reopened is allowed to escape as an error.
//!
//! The port idles in receive, switching to transmit just long enough to
//! put one frame on the wire.

use crate::error::{LinkError, Result};
use bytes::BytesMut;
use hasp_core::constants::{REOPEN_BACKOFF_MS, SETTLE_DELAY_MS};
use hasp_hardware::traits::{BusLine, LineDirection};
use hasp_protocol::{Command, Frame, StreamParser};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Configuration for a bus port.
#[derive(Debug, Clone)]
pub struct BusPortConfig {
    /// Delay after every direction switch before the line is used.
    pub settle: Duration,

    /// Delay before reopening the line after a transient read error.
    pub reopen_backoff: Duration,
}

impl Default for BusPortConfig {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(SETTLE_DELAY_MS),
            reopen_backoff: Duration::from_millis(REOPEN_BACKOFF_MS),
        }
    }
}

/// Framed, direction-disciplined transport over one [`BusLine`].
///
/// Expects the line to start in receive direction, which every
/// implementation in the hardware crate guarantees after open and after
/// reopen.
#[derive(Debug)]
pub struct BusPort<L> {
    line: L,
    parser: StreamParser,
    scratch: BytesMut,
    direction: LineDirection,
    config: BusPortConfig,
}

impl<L: BusLine> BusPort<L> {
    /// Create a port with the default timing configuration.
    pub fn new(line: L) -> Self {
        Self::with_config(line, BusPortConfig::default())
    }

    /// Create a port with explicit timing configuration.
    pub fn with_config(line: L, config: BusPortConfig) -> Self {
        Self {
            line,
            parser: StreamParser::new(),
            scratch: BytesMut::new(),
            direction: LineDirection::Receive,
            config,
        }
    }

    /// The direction the port currently holds the line in.
    #[must_use]
    pub fn direction(&self) -> LineDirection {
        self.direction
    }

    /// Identifier of the underlying line for logs.
    #[must_use]
    pub fn descriptor(&self) -> String {
        self.line.descriptor()
    }

    /// Frame and transmit one command, then release the line.
    ///
    /// Switches to transmit (with settle), writes the frame until it has
    /// drained onto the wire, and switches back to receive (with settle).
    /// The port is always listening again by the time this returns, so a
    /// prompt response cannot slip by unheard.
    ///
    /// # Errors
    ///
    /// Returns an error if the line write or direction control fails.
    pub async fn send_command(&mut self, command: &Command) -> Result<()> {
        let frame = Frame::from(command).with_delimiters();
        trace!(
            line = %self.line.descriptor(),
            command = %command,
            size = frame.size(),
            "transmitting frame"
        );

        self.ensure_direction(LineDirection::Transmit).await?;
        let sent = self.line.send(frame.as_bytes()).await;
        // Release the line even when the write failed; a port stuck in
        // transmit deafens the whole node.
        let released = self.ensure_direction(LineDirection::Receive).await;
        sent?;
        released
    }

    /// Poll for one received command without blocking.
    ///
    /// Pulls whatever bytes the line has pending into the accumulation
    /// buffer and returns the first complete command, or `None` when no
    /// complete frame has arrived yet. Partial frames stay buffered
    /// across calls; malformed frames are dropped silently.
    ///
    /// A transient read error is absorbed here: the line is reopened
    /// after a backoff and `None` is returned, with whatever had been
    /// accumulated still intact.
    ///
    /// # Errors
    ///
    /// Returns an error if the line cannot be reopened, or if a frame
    /// carries an unknown action, which the caller must judge because
    /// only it knows whether the frame was addressed to it.
    pub async fn try_receive(&mut self) -> Result<Option<Command>> {
        self.ensure_direction(LineDirection::Receive).await?;

        match self.line.recv_available(&mut self.scratch).await {
            Ok(0) => {}
            Ok(n) => {
                trace!(line = %self.line.descriptor(), bytes = n, "line delivered bytes");
                self.parser.feed(&self.scratch);
                self.scratch.clear();
            }
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                warn!(
                    line = %self.line.descriptor(),
                    error = %e,
                    "transient read error, reopening line"
                );
                self.scratch.clear();
                tokio::time::sleep(self.config.reopen_backoff).await;
                self.line.reopen().await?;
                self.direction = LineDirection::Receive;
                debug!(line = %self.line.descriptor(), "line reopened");
                return Ok(None);
            }
        }

        while let Some(frame) = self.parser.next_frame() {
            match Command::try_from(frame) {
                Ok(command) => {
                    trace!(line = %self.line.descriptor(), command = %command, "received command");
                    return Ok(Some(command));
                }
                Err(e) if e.is_silent() => {
                    trace!(line = %self.line.descriptor(), error = %e, "dropping malformed frame");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(None)
    }

    async fn ensure_direction(&mut self, target: LineDirection) -> Result<()> {
        if self.direction == target {
            return Ok(());
        }

        self.line.set_direction(target).await?;
        self.direction = target;
        tokio::time::sleep(self.config.settle).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hasp_core::types::{Action, LockerAddress};
    use hasp_hardware::mock::MockBusLine;
    use tokio::time::Instant;

    fn unlock_command(address: &str) -> Command {
        Command::unlock(LockerAddress::new(address).unwrap(), "alice")
    }

    /// Put one framed command on the wire from the peer end.
    async fn peer_send(peer: &mut MockBusLine, command: &Command) {
        let frame = Frame::from(command).with_delimiters();
        peer.set_direction(LineDirection::Transmit).await.unwrap();
        peer.send(frame.as_bytes()).await.unwrap();
        peer.set_direction(LineDirection::Receive).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_switches_and_releases_line() {
        let (line, mut peer) = MockBusLine::pair();
        let handle = line.handle();
        let mut port = BusPort::new(line);

        port.send_command(&unlock_command("A1")).await.unwrap();

        assert_eq!(
            handle.switch_log(),
            vec![LineDirection::Transmit, LineDirection::Receive]
        );
        assert_eq!(port.direction(), LineDirection::Receive);

        // The peer received one framed command.
        let mut buf = BytesMut::new();
        peer.recv_available(&mut buf).await.unwrap();
        assert!(buf.starts_with(b";;;"));
        assert!(buf.ends_with(b";;;\n"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_settles_after_both_switches() {
        let (line, _peer) = MockBusLine::pair();
        let mut port = BusPort::new(line);

        let before = Instant::now();
        port.send_command(&unlock_command("A1")).await.unwrap();
        let elapsed = before.elapsed();

        let settle = Duration::from_millis(SETTLE_DELAY_MS);
        assert!(
            elapsed >= settle * 2,
            "expected two settle delays, got {elapsed:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_try_receive_is_non_blocking_when_idle() {
        let (line, _peer) = MockBusLine::pair();
        let mut port = BusPort::new(line);

        let before = Instant::now();
        assert!(port.try_receive().await.unwrap().is_none());
        // Already in receive: no switch, no settle.
        assert_eq!(before.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_try_receive_reassembles_split_frame() {
        let (line, mut peer) = MockBusLine::pair();
        let mut port = BusPort::new(line);

        let frame = Frame::from(&unlock_command("A1")).with_delimiters();
        let bytes = frame.as_bytes();
        let (head, tail) = bytes.split_at(bytes.len() / 2);

        peer.set_direction(LineDirection::Transmit).await.unwrap();
        peer.send(head).await.unwrap();
        assert!(port.try_receive().await.unwrap().is_none());

        peer.send(tail).await.unwrap();
        let command = port.try_receive().await.unwrap().unwrap();
        assert_eq!(command.assign_to.as_str(), "A1");
        assert_eq!(command.action, Action::Unlock);
    }

    #[tokio::test(start_paused = true)]
    async fn test_try_receive_skips_malformed_frames_silently() {
        let (line, mut peer) = MockBusLine::pair();
        let mut port = BusPort::new(line);

        peer.set_direction(LineDirection::Transmit).await.unwrap();
        peer.send(b";;;this is not json;;;\n").await.unwrap();
        peer.set_direction(LineDirection::Receive).await.unwrap();
        peer_send(&mut peer, &unlock_command("A1")).await;

        let command = port.try_receive().await.unwrap().unwrap();
        assert_eq!(command.assign_to.as_str(), "A1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_try_receive_surfaces_unknown_action() {
        let (line, mut peer) = MockBusLine::pair();
        let mut port = BusPort::new(line);

        let payload = r#"{"assign_to":"A1","action":"REBOOT","actor":"eve","timestamp":"2025-06-01T12:00:00"}"#;
        peer.set_direction(LineDirection::Transmit).await.unwrap();
        peer.send(format!(";;;{payload};;;\n").as_bytes())
            .await
            .unwrap();

        let error = port.try_receive().await.unwrap_err();
        assert!(matches!(
            error,
            LinkError::Frame(hasp_protocol::FrameError::UnknownAction { .. })
        ));

        // The port survives; the offending frame is gone.
        assert!(port.try_receive().await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_try_receive_reopens_after_transient_error() {
        let (line, mut peer) = MockBusLine::pair();
        let handle = line.handle();
        let mut port = BusPort::new(line);

        handle.inject_read_errors(1);
        assert!(port.try_receive().await.unwrap().is_none());
        assert_eq!(handle.reopen_count(), 1);

        // Traffic resumes on the reopened line.
        peer_send(&mut peer, &unlock_command("A1")).await;
        let command = port.try_receive().await.unwrap().unwrap();
        assert_eq!(command.assign_to.as_str(), "A1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_accumulated_partial_frame_survives_reopen() {
        let (line, mut peer) = MockBusLine::pair();
        let handle = line.handle();
        let mut port = BusPort::new(line);

        let frame = Frame::from(&unlock_command("A1")).with_delimiters();
        let bytes = frame.as_bytes();
        let (head, tail) = bytes.split_at(bytes.len() / 2);

        // The head reaches the accumulation buffer, then the line hiccups.
        peer.set_direction(LineDirection::Transmit).await.unwrap();
        peer.send(head).await.unwrap();
        assert!(port.try_receive().await.unwrap().is_none());

        handle.inject_read_errors(1);
        assert!(port.try_receive().await.unwrap().is_none());
        assert_eq!(handle.reopen_count(), 1);

        // The tail arrives on the reopened line and completes the frame
        // held across the reopen.
        peer.send(tail).await.unwrap();
        let command = port.try_receive().await.unwrap().unwrap();
        assert_eq!(command.assign_to.as_str(), "A1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_frames_drain_one_per_call() {
        let (line, mut peer) = MockBusLine::pair();
        let mut port = BusPort::new(line);

        peer_send(&mut peer, &unlock_command("A1")).await;
        peer_send(&mut peer, &unlock_command("B2")).await;

        assert_eq!(
            port.try_receive().await.unwrap().unwrap().assign_to.as_str(),
            "A1"
        );
        assert_eq!(
            port.try_receive().await.unwrap().unwrap().assign_to.as_str(),
            "B2"
        );
        assert!(port.try_receive().await.unwrap().is_none());
    }
}
