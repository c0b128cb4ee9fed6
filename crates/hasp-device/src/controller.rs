//! Device-side controller for a single locker.
//!
//! Each locker node runs one [`DeviceController`] that owns the solenoid
//! latch, the latch feedback sensor, the confirmation buzzer, and the
//! node's end of the shared bus. The controller is a cooperative poll
//! loop; every iteration services the bus, samples the latch sensor, and
//! ticks the acknowledgment window, then sleeps for one feedback
//! interval.
//!
//! # Command handling
//!
//! Frames not addressed to this device are discarded without a trace on
//! the wire. An addressed `UNLOCK` or `LOCK` drives the solenoid,
//! transmits a confirmation frame carrying the device's OWN address, and
//! fires the buzzer. An addressed `ACK` closes the exchange; a duplicate
//! `ACK` is consumed with no effect. A well-formed frame with an action
//! this firmware does not know is logged and dropped.
//!
//! # Manual re-lock
//!
//! The latch sensor is authoritative over commanded intent. When it
//! reports `OPEN -> CLOSED` and the controller is not inside the window
//! that follows a commanded actuation, someone pushed the door shut by
//! hand: the controller drives the solenoid closed and reports a `LOCK`
//! event under the maintenance actor, exactly as if it had been
//! commanded. Inside the window the same sensor edge is attributed to the
//! command that caused it.

use std::time::Duration;

use hasp_core::constants::{ACK_WINDOW_MS, FEEDBACK_INTERVAL_MS, MANUAL_EVENT_ACTOR, PULSE_MS};
use hasp_core::types::{Action, FeedbackState, LockState, LockerAddress};
use hasp_hardware::traits::{AlertOutput, BusLine, FeedbackSense, SolenoidDrive};
use hasp_link::{BusPort, LinkError};
use hasp_protocol::{Command, FrameError};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::error::Result;
use crate::history::{TransitionHistory, TransitionSource};

/// Timing configuration for a device controller.
///
/// # Examples
///
/// ```
/// use hasp_device::ControllerConfig;
/// use std::time::Duration;
///
/// let config = ControllerConfig::default();
/// assert_eq!(config.feedback_interval, Duration::from_millis(100));
/// assert_eq!(config.ack_window, Duration::from_millis(700));
/// ```
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Interval between latch sensor samples, which is also the pacing
    /// sleep of the main loop.
    pub feedback_interval: Duration,

    /// How long after a commanded actuation the controller stays
    /// mid-command when no `ACK` arrives.
    pub ack_window: Duration,

    /// Confirmation pulse duration for the buzzer.
    pub pulse: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            feedback_interval: Duration::from_millis(FEEDBACK_INTERVAL_MS),
            ack_window: Duration::from_millis(ACK_WINDOW_MS),
            pulse: Duration::from_millis(PULSE_MS),
        }
    }
}

/// Controller for one locker on the shared bus.
///
/// Composes the hardware seams rather than inheriting from any of them:
/// the solenoid, sensor, and buzzer are independent collaborators, and
/// the bus port owns framing and direction discipline. The controller
/// contributes only the locker's behavior.
#[derive(Debug)]
pub struct DeviceController<S, F, A, L> {
    address: LockerAddress,
    solenoid: S,
    feedback: F,
    alert: A,
    port: BusPort<L>,
    config: ControllerConfig,

    /// Last sampled sensor level, compared against the next sample for
    /// debouncing.
    last_feedback: FeedbackState,

    /// Deadline of the mid-command window, when one is open.
    ack_deadline: Option<Instant>,

    history: TransitionHistory,
}

impl<S, F, A, L> DeviceController<S, F, A, L>
where
    S: SolenoidDrive,
    F: FeedbackSense,
    A: AlertOutput,
    L: BusLine,
{
    /// Create a controller with the default timing configuration.
    pub fn new(address: LockerAddress, solenoid: S, feedback: F, alert: A, port: BusPort<L>) -> Self {
        Self::with_config(
            address,
            solenoid,
            feedback,
            alert,
            port,
            ControllerConfig::default(),
        )
    }

    /// Create a controller with explicit timing configuration.
    pub fn with_config(
        address: LockerAddress,
        solenoid: S,
        feedback: F,
        alert: A,
        port: BusPort<L>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            address,
            solenoid,
            feedback,
            alert,
            port,
            config,
            // A de-energized latch rests closed; treating the first
            // sample of an already-open door as an opening observation is
            // harmless, while the opposite assumption would fabricate a
            // manual re-lock at boot.
            last_feedback: FeedbackState::Closed,
            ack_deadline: None,
            history: TransitionHistory::new(),
        }
    }

    /// This device's own locker address.
    #[must_use]
    pub fn address(&self) -> &LockerAddress {
        &self.address
    }

    /// The active timing configuration.
    #[must_use]
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Recent lock transitions, oldest first.
    #[must_use]
    pub fn history(&self) -> &TransitionHistory {
        &self.history
    }

    /// Returns `true` while a commanded actuation awaits its `ACK`.
    #[must_use]
    pub fn mid_command(&self) -> bool {
        self.ack_deadline
            .is_some_and(|deadline| Instant::now() < deadline)
    }

    /// Run the controller until the shutdown signal flips to `true`.
    ///
    /// Each iteration services the bus, samples the latch sensor, and
    /// ticks the acknowledgment window, then sleeps one feedback
    /// interval.
    ///
    /// # Errors
    ///
    /// Returns an error only for bus failures the transport could not
    /// recover from; everything else is logged and absorbed.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!(
            address = %self.address,
            line = %self.port.descriptor(),
            "device controller online"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.service_bus().await?;
            self.sample_feedback().await?;
            self.tick_window();

            tokio::select! {
                _ = tokio::time::sleep(self.config.feedback_interval) => {}
                changed = shutdown.changed() => {
                    // A dropped sender means nobody is left to stop us
                    // gracefully; treat it as shutdown.
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!(address = %self.address, "device controller stopped");
        Ok(())
    }

    /// Drain and dispatch every command the bus has pending.
    async fn service_bus(&mut self) -> Result<()> {
        loop {
            match self.port.try_receive().await {
                Ok(Some(command)) => self.handle_command(command).await?,
                Ok(None) => return Ok(()),
                Err(LinkError::Frame(FrameError::UnknownAction { action, assign_to })) => {
                    if assign_to == self.address.as_str() {
                        warn!(action = %action, "unsupported action, dropping");
                    } else {
                        trace!(
                            action = %action,
                            target = %assign_to,
                            "unsupported action for another locker"
                        );
                    }
                }
                Err(error) => return Err(error.into()),
            }
        }
    }

    /// Dispatch one received command.
    async fn handle_command(&mut self, command: Command) -> Result<()> {
        if !command.is_for(&self.address) {
            trace!(target = %command.assign_to, "frame for another locker");
            return Ok(());
        }

        match command.action {
            Action::Unlock => {
                info!(actor = %command.actor, "unlock commanded");
                self.execute_control(LockState::Open, &command.actor).await
            }
            Action::Lock => {
                info!(actor = %command.actor, "lock commanded");
                self.execute_control(LockState::Closed, &command.actor)
                    .await
            }
            Action::Ack => {
                if self.ack_deadline.take().is_some() {
                    debug!("report acknowledged");
                } else {
                    // Duplicate or stray: the exchange already resolved.
                    trace!("ack for a resolved exchange, ignoring");
                }
                Ok(())
            }
        }
    }

    /// Drive the solenoid and report the result on the bus.
    ///
    /// When the actuator cannot be driven, no confirmation goes out: the
    /// master times out and retransmits, and the retried command lands
    /// back here. Re-processing a retransmission is idempotent; the
    /// solenoid is simply driven to the state it already holds and the
    /// confirmation is sent again.
    async fn execute_control(&mut self, target: LockState, actor: &str) -> Result<()> {
        let previous = match self.solenoid.state().await {
            Ok(state) => state,
            Err(error) => {
                warn!(%error, "actuator unreadable, withholding confirmation");
                return Ok(());
            }
        };

        if let Err(error) = self.solenoid.set_state(target).await {
            warn!(%error, "actuation failed, withholding confirmation");
            return Ok(());
        }

        if previous != target {
            self.history.record(
                previous,
                target,
                TransitionSource::Command {
                    actor: actor.to_string(),
                },
            );
        }

        self.open_ack_window();
        self.confirm(target, actor).await
    }

    /// Transmit the confirmation frame for `state` and fire the buzzer.
    async fn confirm(&mut self, state: LockState, actor: &str) -> Result<()> {
        let action = match state {
            LockState::Open => Action::Unlock,
            LockState::Closed => Action::Lock,
        };
        let report = Command::new(self.address.clone(), action, actor);

        match self.port.send_command(&report).await {
            Ok(()) => {
                debug!(command = %report, "confirmation transmitted");
            }
            Err(LinkError::Hardware(error)) if !error.is_fatal() => {
                // The master hears nothing and will retransmit; the
                // retried command reaches this same path again.
                warn!(%error, "confirmation lost to the line");
                return Ok(());
            }
            Err(error) => return Err(error.into()),
        }

        if let Err(error) = self.alert.pulse(self.config.pulse).await {
            warn!(%error, "confirmation pulse failed");
        }

        Ok(())
    }

    /// Sample the latch sensor and act on a debounced transition.
    async fn sample_feedback(&mut self) -> Result<()> {
        let level = match self.feedback.read().await {
            Ok(level) => level,
            Err(error) => {
                warn!(%error, "latch sensor read failed, keeping last sample");
                return Ok(());
            }
        };

        let previous = std::mem::replace(&mut self.last_feedback, level);
        if previous == level {
            return Ok(());
        }

        if level == FeedbackState::Closed {
            if self.mid_command() {
                trace!("latch closed inside the command window");
            } else {
                return self.manual_relock().await;
            }
        } else {
            debug!("latch opened");
            self.history.record(
                LockState::Closed,
                LockState::Open,
                TransitionSource::Observation,
            );
        }

        Ok(())
    }

    /// Handle a latch closed by hand: re-lock and report it.
    async fn manual_relock(&mut self) -> Result<()> {
        info!(actor = MANUAL_EVENT_ACTOR, "latch closed by hand, re-locking");

        if let Err(error) = self.solenoid.set_state(LockState::Closed).await {
            warn!(%error, "re-lock actuation failed");
        }

        self.history
            .record(LockState::Open, LockState::Closed, TransitionSource::Manual);

        // The LOCK report awaits the master's ACK like any commanded
        // actuation, which also debounces a bouncing sensor edge.
        self.open_ack_window();
        self.confirm(LockState::Closed, MANUAL_EVENT_ACTOR).await
    }

    fn open_ack_window(&mut self) {
        self.ack_deadline = Some(Instant::now() + self.config.ack_window);
    }

    /// Expire the mid-command window once its deadline passes.
    fn tick_window(&mut self) {
        if let Some(deadline) = self.ack_deadline {
            if Instant::now() >= deadline {
                self.ack_deadline = None;
                debug!("report never acknowledged, window expired");
            }
        }
    }
}
