//! Mock badge scanner for testing and development.

use crate::{
    Result,
    traits::{ScanEvent, ScanSource},
};
use tokio::sync::mpsc;

/// Mock badge scanner.
///
/// Delivers the scans its handle queues, in order, to whoever awaits
/// [`ScanSource::next_scan`].
///
/// # Examples
///
/// ```
/// use hasp_hardware::mock::MockScanner;
/// use hasp_hardware::traits::ScanSource;
///
/// #[tokio::main]
/// async fn main() -> hasp_hardware::Result<()> {
///     let (mut scanner, handle) = MockScanner::new();
///
///     handle.scan("aabbccdd").await?;
///
///     let event = scanner.next_scan().await?;
///     assert_eq!(event.payload, "aabbccdd");
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockScanner {
    event_rx: mpsc::Receiver<ScanEvent>,
    name: String,
}

impl MockScanner {
    /// Create a new mock scanner with the default name.
    pub fn new() -> (Self, MockScannerHandle) {
        Self::with_name("Mock Scanner".to_string())
    }

    /// Create a new mock scanner with a custom name.
    pub fn with_name(name: String) -> (Self, MockScannerHandle) {
        let (event_tx, event_rx) = mpsc::channel(32);

        let scanner = Self {
            event_rx,
            name: name.clone(),
        };

        let handle = MockScannerHandle { event_tx, name };

        (scanner, handle)
    }
}

impl ScanSource for MockScanner {
    async fn next_scan(&mut self) -> Result<ScanEvent> {
        self.event_rx
            .recv()
            .await
            .ok_or_else(|| crate::HardwareError::disconnected(format!("{}: channel closed", self.name)))
    }
}

/// Handle for feeding scans into a [`MockScanner`].
#[derive(Debug, Clone)]
pub struct MockScannerHandle {
    event_tx: mpsc::Sender<ScanEvent>,
    name: String,
}

impl MockScannerHandle {
    /// Queue a scan of the given payload, timestamped now.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not a valid scan or the scanner
    /// has been dropped.
    pub async fn scan(&self, payload: impl Into<String>) -> Result<()> {
        self.scan_event(ScanEvent::new(payload)?).await
    }

    /// Queue a prepared scan event.
    ///
    /// Lets tests control the capture timestamp, which matters when
    /// exercising time-based logic like scan debouncing.
    ///
    /// # Errors
    ///
    /// Returns an error if the scanner has been dropped.
    pub async fn scan_event(&self, event: ScanEvent) -> Result<()> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_| crate::HardwareError::disconnected(format!("{}: channel closed", self.name)))
    }
}
