//! Mock alert output for testing and development.

use crate::{Result, traits::AlertOutput};
use std::time::Duration;
use tokio::sync::mpsc;

/// Mock alert output (buzzer or lamp).
///
/// Records every pulse it is asked to drive and returns immediately
/// instead of sleeping for the pulse duration, so controller tests run at
/// full speed.
#[derive(Debug)]
pub struct MockAlert {
    pulse_tx: mpsc::UnboundedSender<Duration>,
}

impl MockAlert {
    /// Create a new mock alert output.
    pub fn new() -> (Self, MockAlertHandle) {
        let (pulse_tx, pulse_rx) = mpsc::unbounded_channel();
        (Self { pulse_tx }, MockAlertHandle { pulse_rx })
    }
}

impl AlertOutput for MockAlert {
    async fn pulse(&mut self, duration: Duration) -> Result<()> {
        // Observation only; a dropped handle must not fail the output.
        let _ = self.pulse_tx.send(duration);
        Ok(())
    }
}

/// Handle for observing the pulses a [`MockAlert`] was driven with.
#[derive(Debug)]
pub struct MockAlertHandle {
    pulse_rx: mpsc::UnboundedReceiver<Duration>,
}

impl MockAlertHandle {
    /// Wait for the next recorded pulse.
    pub async fn next_pulse(&mut self) -> Option<Duration> {
        self.pulse_rx.recv().await
    }

    /// Collect all pulses recorded so far without waiting.
    pub fn drain_pulses(&mut self) -> Vec<Duration> {
        let mut pulses = Vec::new();
        while let Ok(duration) = self.pulse_rx.try_recv() {
            pulses.push(duration);
        }
        pulses
    }
}
