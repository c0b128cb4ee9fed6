//! Mock device implementations for testing and development.
//!
//! This module provides simulated peripherals that can be controlled
//! programmatically without requiring physical hardware. Each mock comes
//! paired with a handle: the mock is handed to the control logic, the
//! handle stays with the test to drive inputs and observe outputs.

pub mod alert;
pub mod feedback;
pub mod latch;
pub mod line;
pub mod scanner;

// Re-export commonly used types
pub use alert::{MockAlert, MockAlertHandle};
pub use feedback::{MockFeedback, MockFeedbackHandle};
pub use latch::{MockSolenoid, MockSolenoidHandle};
pub use line::{MockBusLine, MockLineHandle};
pub use scanner::{MockScanner, MockScannerHandle};
