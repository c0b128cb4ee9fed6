//! Simulated half-duplex bus line for testing and development.
//!
//! [`MockBusLine::pair`] produces the two ends of a wire. Bytes sent into
//! one end become available at the other, so a master transport and a
//! device transport can be exercised against each other in-process, the
//! same way they would share a physical twisted pair.

use crate::{
    Result,
    traits::{BusLine, LineDirection},
};
use bytes::BytesMut;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// One end of a simulated half-duplex wire.
///
/// The mock enforces direction discipline: sending while the end is in
/// receive mode, or reading while it is in transmit mode, is an error.
/// A transport bug that forgets to switch therefore fails a test loudly
/// instead of producing a silent garble the way real hardware would.
///
/// Each end starts in [`LineDirection::Receive`], the idle state of a bus
/// node.
#[derive(Debug)]
pub struct MockBusLine {
    label: String,
    wire_tx: mpsc::UnboundedSender<Vec<u8>>,
    wire_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    direction: LineDirection,
    shared: Arc<LineShared>,
}

#[derive(Debug, Default)]
struct LineShared {
    read_faults: AtomicUsize,
    reopen_count: AtomicUsize,
    switch_log: Mutex<Vec<LineDirection>>,
}

impl MockBusLine {
    /// Create the two connected ends of a wire.
    pub fn pair() -> (MockBusLine, MockBusLine) {
        let (a_tx, b_rx) = mpsc::unbounded_channel();
        let (b_tx, a_rx) = mpsc::unbounded_channel();

        let a = MockBusLine {
            label: "mock-line-a".to_string(),
            wire_tx: a_tx,
            wire_rx: a_rx,
            direction: LineDirection::Receive,
            shared: Arc::new(LineShared::default()),
        };
        let b = MockBusLine {
            label: "mock-line-b".to_string(),
            wire_tx: b_tx,
            wire_rx: b_rx,
            direction: LineDirection::Receive,
            shared: Arc::new(LineShared::default()),
        };

        (a, b)
    }

    /// Get an observation and fault-injection handle for this end.
    ///
    /// Take the handle before moving the line into a transport; it stays
    /// valid afterwards.
    pub fn handle(&self) -> MockLineHandle {
        MockLineHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    fn consume_read_fault(&self) -> bool {
        self.shared
            .read_faults
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl BusLine for MockBusLine {
    async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        if self.direction != LineDirection::Transmit {
            return Err(crate::HardwareError::invalid_data(format!(
                "{}: send while line is in {}",
                self.label, self.direction
            )));
        }

        self.wire_tx
            .send(bytes.to_vec())
            .map_err(|_| crate::HardwareError::disconnected(self.label.clone()))
    }

    async fn recv_available(&mut self, buf: &mut BytesMut) -> Result<usize> {
        if self.consume_read_fault() {
            return Err(io::Error::other("injected read fault").into());
        }
        if self.direction != LineDirection::Receive {
            return Err(crate::HardwareError::invalid_data(format!(
                "{}: read while line is in {}",
                self.label, self.direction
            )));
        }

        let mut total = 0;
        while let Ok(chunk) = self.wire_rx.try_recv() {
            total += chunk.len();
            buf.extend_from_slice(&chunk);
        }
        Ok(total)
    }

    async fn set_direction(&mut self, direction: LineDirection) -> Result<()> {
        self.direction = direction;
        if let Ok(mut log) = self.shared.switch_log.lock() {
            log.push(direction);
        }
        Ok(())
    }

    async fn reopen(&mut self) -> Result<()> {
        // A closing port drops whatever the OS had buffered for it.
        while self.wire_rx.try_recv().is_ok() {}
        self.shared.read_faults.store(0, Ordering::SeqCst);
        self.shared.reopen_count.fetch_add(1, Ordering::SeqCst);
        self.direction = LineDirection::Receive;
        Ok(())
    }

    fn descriptor(&self) -> String {
        self.label.clone()
    }
}

/// Handle for observing and fault-injecting one [`MockBusLine`] end.
#[derive(Debug, Clone)]
pub struct MockLineHandle {
    shared: Arc<LineShared>,
}

impl MockLineHandle {
    /// Make the next `count` reads on this end fail with an I/O error.
    pub fn inject_read_errors(&self, count: usize) {
        self.shared.read_faults.store(count, Ordering::SeqCst);
    }

    /// Number of injected read errors not yet consumed.
    pub fn pending_read_errors(&self) -> usize {
        self.shared.read_faults.load(Ordering::SeqCst)
    }

    /// How many times this end has been reopened.
    pub fn reopen_count(&self) -> usize {
        self.shared.reopen_count.load(Ordering::SeqCst)
    }

    /// Every direction switch this end has performed, in order.
    pub fn switch_log(&self) -> Vec<LineDirection> {
        self.shared
            .switch_log
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }
}
