//! Mock solenoid latch for testing and development.

use crate::{Result, traits::SolenoidDrive};
use hasp_core::types::LockState;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;

/// Mock solenoid latch.
///
/// Tracks the commanded state and reports every transition to its handle,
/// so a test can assert the exact actuation sequence a controller drove.
/// Starts in [`LockState::Closed`], matching a de-energized solenoid.
///
/// # Examples
///
/// ```
/// use hasp_hardware::mock::MockSolenoid;
/// use hasp_hardware::traits::SolenoidDrive;
/// use hasp_core::types::LockState;
///
/// #[tokio::main]
/// async fn main() -> hasp_hardware::Result<()> {
///     let (mut latch, mut handle) = MockSolenoid::new();
///
///     latch.set_state(LockState::Open).await?;
///     latch.set_state(LockState::Closed).await?;
///
///     assert_eq!(
///         handle.drain_transitions(),
///         vec![LockState::Open, LockState::Closed]
///     );
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockSolenoid {
    state: LockState,
    transition_tx: mpsc::UnboundedSender<LockState>,
    fail_budget: Arc<AtomicUsize>,
    name: String,
}

impl MockSolenoid {
    /// Create a new mock latch with the default name.
    pub fn new() -> (Self, MockSolenoidHandle) {
        Self::with_name("Mock Solenoid".to_string())
    }

    /// Create a new mock latch with a custom name.
    pub fn with_name(name: String) -> (Self, MockSolenoidHandle) {
        let (transition_tx, transition_rx) = mpsc::unbounded_channel();
        let fail_budget = Arc::new(AtomicUsize::new(0));

        let latch = Self {
            state: LockState::Closed,
            transition_tx,
            fail_budget: Arc::clone(&fail_budget),
            name,
        };

        let handle = MockSolenoidHandle {
            transition_rx,
            fail_budget,
        };

        (latch, handle)
    }

    fn consume_fault(&self) -> bool {
        self.fail_budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl SolenoidDrive for MockSolenoid {
    async fn set_state(&mut self, state: LockState) -> Result<()> {
        if self.consume_fault() {
            return Err(crate::HardwareError::disconnected(self.name.clone()));
        }

        self.state = state;
        // Observation only; a dropped handle must not fail the actuator.
        let _ = self.transition_tx.send(state);
        Ok(())
    }

    async fn state(&self) -> Result<LockState> {
        Ok(self.state)
    }
}

/// Handle for observing and fault-injecting a [`MockSolenoid`].
#[derive(Debug)]
pub struct MockSolenoidHandle {
    transition_rx: mpsc::UnboundedReceiver<LockState>,
    fail_budget: Arc<AtomicUsize>,
}

impl MockSolenoidHandle {
    /// Wait for the next commanded transition.
    ///
    /// Returns `None` once the latch has been dropped and all recorded
    /// transitions were consumed.
    pub async fn next_transition(&mut self) -> Option<LockState> {
        self.transition_rx.recv().await
    }

    /// Collect all transitions recorded so far without waiting.
    pub fn drain_transitions(&mut self) -> Vec<LockState> {
        let mut transitions = Vec::new();
        while let Ok(state) = self.transition_rx.try_recv() {
            transitions.push(state);
        }
        transitions
    }

    /// Make the next `count` drive operations fail with a disconnect.
    pub fn fail_next(&self, count: usize) {
        self.fail_budget.store(count, Ordering::SeqCst);
    }
}
