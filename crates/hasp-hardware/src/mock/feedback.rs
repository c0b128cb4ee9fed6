//! Mock latch feedback sensor for testing and development.

use crate::{Result, traits::FeedbackSense};
use hasp_core::types::FeedbackState;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::watch;

/// Mock latch feedback sensor.
///
/// Behaves like a level sensor, not an event queue: every read reports the
/// level most recently set through the handle, however many times it is
/// polled. Starts at [`FeedbackState::Closed`].
///
/// # Examples
///
/// ```
/// use hasp_hardware::mock::MockFeedback;
/// use hasp_hardware::traits::FeedbackSense;
/// use hasp_core::types::FeedbackState;
///
/// #[tokio::main]
/// async fn main() -> hasp_hardware::Result<()> {
///     let (mut sensor, handle) = MockFeedback::new();
///     assert_eq!(sensor.read().await?, FeedbackState::Closed);
///
///     handle.set(FeedbackState::Open);
///     assert_eq!(sensor.read().await?, FeedbackState::Open);
///     assert_eq!(sensor.read().await?, FeedbackState::Open);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockFeedback {
    level_rx: watch::Receiver<FeedbackState>,
    fail_budget: Arc<AtomicUsize>,
    name: String,
}

impl MockFeedback {
    /// Create a new mock sensor with the default name.
    pub fn new() -> (Self, MockFeedbackHandle) {
        Self::with_name("Mock Feedback".to_string())
    }

    /// Create a new mock sensor with a custom name.
    pub fn with_name(name: String) -> (Self, MockFeedbackHandle) {
        let (level_tx, level_rx) = watch::channel(FeedbackState::Closed);
        let fail_budget = Arc::new(AtomicUsize::new(0));

        let sensor = Self {
            level_rx,
            fail_budget: Arc::clone(&fail_budget),
            name,
        };

        let handle = MockFeedbackHandle {
            level_tx,
            fail_budget,
        };

        (sensor, handle)
    }

    fn consume_fault(&self) -> bool {
        self.fail_budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl FeedbackSense for MockFeedback {
    async fn read(&mut self) -> Result<FeedbackState> {
        if self.consume_fault() {
            return Err(crate::HardwareError::disconnected(self.name.clone()));
        }
        Ok(*self.level_rx.borrow())
    }
}

/// Handle for driving the level of a [`MockFeedback`].
#[derive(Debug)]
pub struct MockFeedbackHandle {
    level_tx: watch::Sender<FeedbackState>,
    fail_budget: Arc<AtomicUsize>,
}

impl MockFeedbackHandle {
    /// Set the sensed level.
    pub fn set(&self, state: FeedbackState) {
        // send_replace works even after the sensor side is dropped.
        self.level_tx.send_replace(state);
    }

    /// Make the next `count` reads fail with a disconnect.
    pub fn fail_next(&self, count: usize) {
        self.fail_budget.store(count, Ordering::SeqCst);
    }
}
