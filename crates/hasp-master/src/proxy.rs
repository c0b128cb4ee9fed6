//! Master-side stand-in for one locker on the bus.
//!
//! The orchestrator never talks wire format. It asks a [`SlaveProxy`]
//! to unlock, and the proxy runs the exchange through the shared
//! courier: build the command, wait out the retransmission schedule,
//! acknowledge the device's confirmation, and hand back a typed
//! [`Confirmation`]. One proxy exists per registered locker; all of
//! them borrow the same courier because there is only one line.

use hasp_core::types::{Action, LockerAddress, WireTimestamp};
use hasp_hardware::traits::BusLine;
use hasp_link::{Courier, LinkError};
use hasp_protocol::Command;
use std::fmt;
use tracing::debug;

/// A device's accepted answer to a control command.
///
/// Carries the fields of the confirmation frame the device put on the
/// bus, which the audit trail records verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct Confirmation {
    /// Address of the locker that confirmed.
    pub locker_id: LockerAddress,
    /// The action the device reports having performed.
    pub action: Action,
    /// Actor the device attributed the action to.
    pub actor: String,
    /// The device's own timestamp for the actuation.
    pub timestamp: WireTimestamp,
}

impl From<&Command> for Confirmation {
    fn from(frame: &Command) -> Self {
        Self {
            locker_id: frame.assign_to.clone(),
            action: frame.action,
            actor: frame.actor.clone(),
            timestamp: frame.timestamp,
        }
    }
}

impl fmt::Display for Confirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} confirmed by {} (actor: {})",
            self.action, self.locker_id, self.actor
        )
    }
}

/// Master-side proxy for a single slave address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlaveProxy {
    address: LockerAddress,
}

impl SlaveProxy {
    /// Create a proxy for the given slave address.
    #[must_use]
    pub fn new(address: LockerAddress) -> Self {
        Self { address }
    }

    /// The slave address this proxy speaks for.
    #[must_use]
    pub fn address(&self) -> &LockerAddress {
        &self.address
    }

    /// Command the slave to unlock and wait for its confirmation.
    ///
    /// The exchange is closed with an acknowledgment before the
    /// confirmation is returned, so the device's report is settled by
    /// the time the caller sees it.
    ///
    /// # Errors
    ///
    /// [`LinkError::TimeoutExceeded`] when the device never answers
    /// within the courier's retransmission schedule; line errors pass
    /// through unchanged.
    pub async fn unlock<L: BusLine>(
        &self,
        courier: &mut Courier<L>,
        actor: &str,
    ) -> Result<Confirmation, LinkError> {
        self.command(courier, Action::Unlock, actor).await
    }

    /// Command the slave to lock and wait for its confirmation.
    ///
    /// # Errors
    ///
    /// Same contract as [`unlock`](SlaveProxy::unlock).
    pub async fn lock<L: BusLine>(
        &self,
        courier: &mut Courier<L>,
        actor: &str,
    ) -> Result<Confirmation, LinkError> {
        self.command(courier, Action::Lock, actor).await
    }

    async fn command<L: BusLine>(
        &self,
        courier: &mut Courier<L>,
        action: Action,
        actor: &str,
    ) -> Result<Confirmation, LinkError> {
        let request = Command::new(self.address.clone(), action, actor);
        let response = courier.request_and_wait(&request).await?;
        courier.acknowledge(&response).await?;

        let confirmation = Confirmation::from(&response);
        debug!(confirmation = %confirmation, "exchange settled");
        Ok(confirmation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hasp_hardware::mock::MockBusLine;
    use hasp_link::{BusPort, BusPortConfig, CourierConfig};
    use std::time::Duration;
    use tokio::task::JoinHandle;

    fn address(s: &str) -> LockerAddress {
        LockerAddress::new(s).unwrap()
    }

    fn courier_over(line: MockBusLine) -> Courier<MockBusLine> {
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
                max_retries: 1,
                poll_interval: Duration::from_millis(5),
            },
        )
    }

    /// A device end that confirms the first control command for `own`
    /// and then consumes the closing ack.
    fn spawn_device(line: MockBusLine, own: LockerAddress) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut port = BusPort::with_config(
                line,
                BusPortConfig {
                    settle: Duration::from_millis(5),
                    reopen_backoff: Duration::from_millis(5),
                },
            );

            loop {
                match port.try_receive().await {
                    Ok(Some(command)) if command.is_for(&own) && !command.is_ack() => {
                        let confirmation =
                            Command::new(own.clone(), command.action, command.actor.clone());
                        port.send_command(&confirmation).await.unwrap();
                        break;
                    }
                    _ => {}
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }

            loop {
                match port.try_receive().await {
                    Ok(Some(command)) if command.is_ack() => break,
                    _ => {}
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_unlock_returns_confirmation() {
        let (master_line, device_line) = MockBusLine::pair();
        let mut courier = courier_over(master_line);
        let device = spawn_device(device_line, address("A1"));

        let proxy = SlaveProxy::new(address("A1"));
        let confirmation = proxy.unlock(&mut courier, "alice").await.unwrap();

        assert_eq!(confirmation.locker_id, address("A1"));
        assert_eq!(confirmation.action, Action::Unlock);
        assert_eq!(confirmation.actor, "alice");
        device.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_lock_returns_confirmation() {
        let (master_line, device_line) = MockBusLine::pair();
        let mut courier = courier_over(master_line);
        let device = spawn_device(device_line, address("B2"));

        let proxy = SlaveProxy::new(address("B2"));
        let confirmation = proxy.lock(&mut courier, "janitor").await.unwrap();

        assert_eq!(confirmation.action, Action::Lock);
        device.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_unlock_times_out_on_silent_device() {
        let (master_line, _device_line) = MockBusLine::pair();
        let mut courier = courier_over(master_line);

        let proxy = SlaveProxy::new(address("A1"));
        let error = proxy.unlock(&mut courier, "alice").await.unwrap_err();

        assert!(matches!(error, LinkError::TimeoutExceeded { attempts: 2 }));
    }

    #[test]
    fn test_confirmation_from_frame_and_display() {
        let frame = Command::new(address("A1"), Action::Unlock, "alice");
        let confirmation = Confirmation::from(&frame);

        assert_eq!(confirmation.timestamp, frame.timestamp);
        assert_eq!(
            confirmation.to_string(),
            "UNLOCK confirmed by A1 (actor: alice)"
        );
    }
}
