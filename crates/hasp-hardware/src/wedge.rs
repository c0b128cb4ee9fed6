//! Keyboard-wedge scanner adapter.
//!
//! Most commodity badge and QR scanners present themselves as keyboards:
//! every scan arrives as a line of text terminated by Enter. This module
//! adapts any line-oriented byte stream into a [`ScanSource`], with
//! standard input as the ready-made case.

use crate::{
    HardwareError, Result,
    traits::{ScanEvent, ScanSource},
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

/// A [`ScanSource`] that reads newline-terminated scans from a reader.
///
/// Blank lines are skipped silently (an operator leaning on Enter is not
/// a scan). Lines that fail scan validation are reported as errors and
/// left to the caller to log; the scanner itself stays usable.
///
/// # Examples
///
/// ```
/// use hasp_hardware::wedge::LineScanner;
/// use hasp_hardware::traits::ScanSource;
///
/// #[tokio::main]
/// async fn main() -> hasp_hardware::Result<()> {
///     let input: &[u8] = b"deadbeef\n";
///     let mut scanner = LineScanner::new(input, "test");
///
///     let event = scanner.next_scan().await?;
///     assert_eq!(event.payload, "deadbeef");
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct LineScanner<R> {
    lines: Lines<R>,
    label: String,
}

impl<R> LineScanner<R>
where
    R: AsyncBufRead + Unpin + Send + Sync,
{
    /// Wrap a line-oriented reader.
    pub fn new(reader: R, label: impl Into<String>) -> Self {
        Self {
            lines: reader.lines(),
            label: label.into(),
        }
    }
}

impl LineScanner<BufReader<Stdin>> {
    /// A scanner reading from this process's standard input.
    #[must_use]
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), "stdin")
    }
}

impl<R> ScanSource for LineScanner<R>
where
    R: AsyncBufRead + Unpin + Send + Sync,
{
    async fn next_scan(&mut self) -> Result<ScanEvent> {
        loop {
            let line = self
                .lines
                .next_line()
                .await?
                .ok_or_else(|| HardwareError::disconnected(self.label.clone()))?;

            if line.trim().is_empty() {
                continue;
            }

            return ScanEvent::new(line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_line_scanner_reads_scans_in_order() {
        let input: &[u8] = b"11aa\n22bb\r\n";
        let mut scanner = LineScanner::new(input, "test");

        assert_eq!(scanner.next_scan().await.unwrap().payload, "11aa");
        assert_eq!(scanner.next_scan().await.unwrap().payload, "22bb");
    }

    #[tokio::test]
    async fn test_line_scanner_skips_blank_lines() {
        let input: &[u8] = b"\n\n11aa\n";
        let mut scanner = LineScanner::new(input, "test");

        assert_eq!(scanner.next_scan().await.unwrap().payload, "11aa");
    }

    #[tokio::test]
    async fn test_line_scanner_disconnects_at_end_of_input() {
        let input: &[u8] = b"11aa\n";
        let mut scanner = LineScanner::new(input, "test");

        scanner.next_scan().await.unwrap();
        let err = scanner.next_scan().await.unwrap_err();
        assert!(matches!(err, HardwareError::Disconnected { .. }));
    }

    #[tokio::test]
    async fn test_line_scanner_surfaces_invalid_scan() {
        let oversized = format!("{}\n11aa\n", "f".repeat(2000));
        let mut scanner = LineScanner::new(oversized.as_bytes(), "test");

        assert!(scanner.next_scan().await.is_err());
        // The scanner stays usable after a bad read.
        assert_eq!(scanner.next_scan().await.unwrap().payload, "11aa");
    }
}
