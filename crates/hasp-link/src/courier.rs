//! Request/response engine for the master side of the bus.
//!
//! Devices on the bus never speak first: the master transmits a command
//! and the addressed device answers with a confirmation, which the master
//! then acknowledges. [`Courier`] runs that exchange, including the part
//! the happy path never shows: a response window per transmission, a
//! bounded number of retransmissions when a window expires, and the
//! discard of whatever else drifts in off a multi-drop line while
//! waiting.
//!
//! # Design Principles
//!
//! - **Bounded retry**: every request gives up after a configured number
//!   of attempts and surfaces [`LinkError::TimeoutExceeded`]. The caller
//!   decides what a dead device means; the courier never loops forever.
//! - **Window restart**: each retransmission restarts a full response
//!   window, since the retransmitted frame is a new chance for the device
//!   to answer.
//! - **Correlation by address**: a response counts only if it carries the
//!   requested device's address. Frames from other devices, left over
//!   from earlier exchanges, are discarded with a log line.
//! - **Acks terminate, never dispatch**: a stray `ACK` is consumed
//!   silently and is never returned as a response.

use crate::error::{LinkError, Result};
use crate::port::BusPort;
use hasp_core::constants::{DEFAULT_MAX_RETRIES, POLL_INTERVAL_MS, RESPONSE_WINDOW_MS};
use hasp_hardware::traits::BusLine;
use hasp_protocol::Command;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

/// Configuration for the request/response engine.
///
/// # Example
///
/// ```
/// use hasp_link::CourierConfig;
/// use std::time::Duration;
///
/// let config = CourierConfig {
///     response_window: Duration::from_millis(400),
///     max_retries: 3,
///     poll_interval: Duration::from_millis(10),
/// };
/// assert_eq!(config.max_attempts(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct CourierConfig {
    /// How long to wait for a response after each transmission.
    pub response_window: Duration,

    /// How many times to retransmit after the first attempt goes
    /// unanswered. Zero means a single attempt.
    pub max_retries: u32,

    /// Pause between receive polls while a window is open.
    pub poll_interval: Duration,
}

impl CourierConfig {
    /// Total transmissions a request may use, first attempt included.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl Default for CourierConfig {
    fn default() -> Self {
        Self {
            response_window: Duration::from_millis(RESPONSE_WINDOW_MS),
            max_retries: DEFAULT_MAX_RETRIES,
            poll_interval: Duration::from_millis(POLL_INTERVAL_MS),
        }
    }
}

/// Master-side request/response engine over one [`BusPort`].
#[derive(Debug)]
pub struct Courier<L> {
    port: BusPort<L>,
    config: CourierConfig,
}

impl<L: BusLine> Courier<L> {
    /// Create a courier with the default timing configuration.
    pub fn new(port: BusPort<L>) -> Self {
        Self::with_config(port, CourierConfig::default())
    }

    /// Create a courier with explicit timing configuration.
    pub fn with_config(port: BusPort<L>, config: CourierConfig) -> Self {
        Self { port, config }
    }

    /// The timing configuration in effect.
    #[must_use]
    pub fn config(&self) -> &CourierConfig {
        &self.config
    }

    /// Transmit a request and wait for the addressed device's response.
    ///
    /// Each transmission opens a fresh response window. While a window is
    /// open, frames from other addresses and stray acknowledgments are
    /// discarded. When a window expires the request is retransmitted,
    /// up to the configured ceiling.
    ///
    /// On success the caller should close the exchange with
    /// [`acknowledge`](Courier::acknowledge).
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::TimeoutExceeded`] when every attempt goes
    /// unanswered, or a hardware error if the line fails fatally.
    pub async fn request_and_wait(&mut self, request: &Command) -> Result<Command> {
        let max_attempts = self.config.max_attempts();

        for attempt in 1..=max_attempts {
            debug!(command = %request, attempt, max_attempts, "transmitting request");
            self.port.send_command(request).await?;

            if let Some(response) = self.await_response(request).await? {
                debug!(response = %response, attempt, "request answered");
                return Ok(response);
            }

            debug!(
                command = %request,
                attempt,
                window_ms = self.config.response_window.as_millis() as u64,
                "response window expired"
            );
        }

        warn!(
            command = %request,
            attempts = max_attempts,
            "request abandoned, device did not answer"
        );
        Err(LinkError::TimeoutExceeded {
            attempts: max_attempts,
        })
    }

    /// Close an exchange by acknowledging the device's response.
    ///
    /// The acknowledgment carries the response's address and actor, so
    /// the device can match it to the exchange it just served.
    ///
    /// # Errors
    ///
    /// Returns an error if the line write fails.
    pub async fn acknowledge(&mut self, response: &Command) -> Result<()> {
        let ack = Command::ack(response.assign_to.clone(), response.actor.clone());
        trace!(ack = %ack, "closing exchange");
        self.port.send_command(&ack).await
    }

    /// Poll the bus for one unsolicited command without blocking.
    ///
    /// Devices emit audit frames on their own initiative (a manual
    /// re-lock, for example); between requests the master drains them
    /// through here.
    ///
    /// # Errors
    ///
    /// Propagates transport errors the same way the port does.
    pub async fn try_receive(&mut self) -> Result<Option<Command>> {
        self.port.try_receive().await
    }

    /// Wait out one response window, returning the first matching frame.
    ///
    /// `Ok(None)` means the window expired without a match.
    async fn await_response(&mut self, request: &Command) -> Result<Option<Command>> {
        let deadline = Instant::now() + self.config.response_window;

        loop {
            match self.port.try_receive().await {
                Ok(Some(frame)) if Self::is_response_to(request, &frame) => {
                    return Ok(Some(frame));
                }
                Ok(Some(frame)) => {
                    debug!(frame = %frame, "discarding frame while waiting for response");
                }
                Ok(None) => {}
                Err(LinkError::Frame(e)) => {
                    debug!(error = %e, "discarding unhandleable frame while waiting");
                }
                Err(e) => return Err(e),
            }

            if Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// A frame answers a request when it carries the requested address
    /// and is not itself an acknowledgment.
    fn is_response_to(request: &Command, frame: &Command) -> bool {
        frame.is_for(&request.assign_to) && !frame.is_ack()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::BusPortConfig;
    use hasp_core::types::{Action, LockerAddress};
    use hasp_hardware::mock::MockBusLine;
    use tokio::task::JoinHandle;

    fn address(s: &str) -> LockerAddress {
        LockerAddress::new(s).unwrap()
    }

    fn courier_over(line: MockBusLine, max_retries: u32) -> Courier<MockBusLine> {
        let port = BusPort::with_config(
            line,
            BusPortConfig {
                settle: Duration::from_millis(5),
                reopen_backoff: Duration::from_millis(5),
            },
        );
        Courier::with_config(
            port,
            CourierConfig {
                response_window: Duration::from_millis(100),
                max_retries,
                poll_interval: Duration::from_millis(5),
            },
        )
    }

    /// A scripted device end: answers the nth control command it sees for
    /// `own`, then waits for the closing ack. Returns how many control
    /// commands it saw.
    fn spawn_responder(
        line: MockBusLine,
        own: LockerAddress,
        answer_on: usize,
    ) -> JoinHandle<usize> {
        tokio::spawn(async move {
            let mut port = BusPort::with_config(
                line,
                BusPortConfig {
                    settle: Duration::from_millis(5),
                    reopen_backoff: Duration::from_millis(5),
                },
            );
            let mut seen = 0;

            loop {
                match port.try_receive().await {
                    Ok(Some(command)) if command.is_for(&own) && !command.is_ack() => {
                        seen += 1;
                        if seen >= answer_on {
                            let confirmation =
                                Command::new(own.clone(), command.action, command.actor.clone());
                            port.send_command(&confirmation).await.unwrap();
                            break;
                        }
                    }
                    _ => {}
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }

            // Consume the closing ack so it never lingers on the wire.
            loop {
                match port.try_receive().await {
                    Ok(Some(command)) if command.is_for(&own) && command.is_ack() => break,
                    _ => {}
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }

            seen
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_answered_first_attempt() {
        let (master_line, device_line) = MockBusLine::pair();
        let mut courier = courier_over(master_line, 3);
        let responder = spawn_responder(device_line, address("A1"), 1);

        let request = Command::unlock(address("A1"), "alice");
        let response = courier.request_and_wait(&request).await.unwrap();

        assert_eq!(response.assign_to, address("A1"));
        assert_eq!(response.action, Action::Unlock);
        assert_eq!(response.actor, "alice");

        courier.acknowledge(&response).await.unwrap();
        assert_eq!(responder.await.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retransmit_restarts_window_until_answered() {
        let (master_line, device_line) = MockBusLine::pair();
        let mut courier = courier_over(master_line, 3);
        // Device stays silent until the third transmission.
        let responder = spawn_responder(device_line, address("A1"), 3);

        let request = Command::unlock(address("A1"), "alice");
        let response = courier.request_and_wait(&request).await.unwrap();
        assert_eq!(response.action, Action::Unlock);

        courier.acknowledge(&response).await.unwrap();
        assert_eq!(responder.await.unwrap(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_after_retry_ceiling() {
        let (master_line, _device_line) = MockBusLine::pair();
        let mut courier = courier_over(master_line, 2);

        let request = Command::unlock(address("A1"), "alice");
        let error = courier.request_and_wait(&request).await.unwrap_err();

        match error {
            LinkError::TimeoutExceeded { attempts } => assert_eq!(attempts, 3),
            other => panic!("expected TimeoutExceeded, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries_means_single_attempt() {
        let (master_line, _device_line) = MockBusLine::pair();
        let mut courier = courier_over(master_line, 0);

        let request = Command::unlock(address("A1"), "alice");
        let error = courier.request_and_wait(&request).await.unwrap_err();
        assert!(matches!(error, LinkError::TimeoutExceeded { attempts: 1 }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_foreign_address_discarded_while_waiting() {
        let (master_line, device_line) = MockBusLine::pair();
        let mut courier = courier_over(master_line, 1);

        let noise_task = tokio::spawn(async move {
            let mut port = BusPort::with_config(
                device_line,
                BusPortConfig {
                    settle: Duration::from_millis(5),
                    reopen_backoff: Duration::from_millis(5),
                },
            );
            // A leftover confirmation from another device, then the real
            // response.
            port.send_command(&Command::new(address("B9"), Action::Unlock, "mallory"))
                .await
                .unwrap();
            port.send_command(&Command::new(address("A1"), Action::Unlock, "alice"))
                .await
                .unwrap();
        });

        let request = Command::unlock(address("A1"), "alice");
        let response = courier.request_and_wait(&request).await.unwrap();
        assert_eq!(response.assign_to, address("A1"));

        noise_task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stray_ack_consumed_not_returned() {
        let (master_line, device_line) = MockBusLine::pair();
        let mut courier = courier_over(master_line, 1);

        let noise_task = tokio::spawn(async move {
            let mut port = BusPort::with_config(
                device_line,
                BusPortConfig {
                    settle: Duration::from_millis(5),
                    reopen_backoff: Duration::from_millis(5),
                },
            );
            // A duplicate ack for the right address must not count as the
            // response.
            port.send_command(&Command::ack(address("A1"), "alice"))
                .await
                .unwrap();
            port.send_command(&Command::new(address("A1"), Action::Unlock, "alice"))
                .await
                .unwrap();
        });

        let request = Command::unlock(address("A1"), "alice");
        let response = courier.request_and_wait(&request).await.unwrap();
        assert!(!response.is_ack());
        assert_eq!(response.action, Action::Unlock);

        noise_task.await.unwrap();
    }
}
