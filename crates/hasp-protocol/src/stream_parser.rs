//! Stream parser for delimiter-framed bus messages.
//!
//! The bus delivers bytes with no message boundaries: a single read may
//! contain a partial frame, a complete frame, several frames, or noise.
//! This module provides a stateful parser that accumulates bytes in an
//! internal buffer and extracts complete frames by pairing `;;;`
//! delimiters in arrival order.
//!
//! # Protocol Framing
//!
//! The same 3-byte delimiter opens and closes every frame:
//!
//! ```text
//! ;;;  <payload>  ;;;  \n
//! open            close gap
//! ```
//!
//! Because the delimiter is multi-byte it can be split across reads; the
//! parser keeps a possible delimiter prefix at the buffer tail while
//! discarding everything else it cannot use.
//!
//! # Usage
//!
//! ```
//! use hasp_protocol::StreamParser;
//!
//! let mut parser = StreamParser::new();
//!
//! // Feed partial data as it arrives from the line
//! parser.feed(b";;;{\"k\"");
//! parser.feed(b":1};;");
//! parser.feed(b";\n");
//!
//! let frame = parser.next_frame().unwrap();
//! assert_eq!(frame.to_payload().unwrap(), "{\"k\":1}");
//! ```
//!
//! # Noise Handling
//!
//! Everything outside a delimiter pair is noise and is discarded: bytes
//! before an opening delimiter, the inter-frame gap byte, and partial
//! frames that outgrow the buffer cap. Payloads that are not valid UTF-8
//! are dropped silently as line corruption. The buffer therefore never
//! retains data that cannot still become part of a frame.

use bytes::BytesMut;
use hasp_core::constants::{FRAME_DELIMITER, FRAME_DELIMITER_LEN, MAX_BUFFER_SIZE};
use std::collections::VecDeque;

use crate::frame::Frame;

/// Initial buffer capacity for incoming line data.
const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Recommended initial capacity for the frame queue.
///
/// Receivers usually drain one frame at a time, but burst traffic after a
/// direction switch can deliver several frames in one read.
const INITIAL_FRAME_QUEUE_CAPACITY: usize = 4;

/// State machine states for pairing frame delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    /// Discarding noise while looking for an opening delimiter.
    ///
    /// Bytes that cannot be the start of a delimiter are dropped. Only a
    /// trailing prefix of the delimiter (at most 2 bytes) is retained, in
    /// case the rest of it arrives in the next read.
    Scanning,

    /// An opening delimiter was consumed; collecting payload bytes until
    /// the closing delimiter appears.
    Collecting,
}

/// Stateful accumulation parser for `;;;`-delimited frames.
///
/// # State Machine
///
/// ```text
/// ┌──────────┐  ";;;" found   ┌────────────┐  ";;;" found  ┌─────────────┐
/// │ Scanning │───────────────>│ Collecting │──────────────>│ Frame ready │
/// └──────────┘                └────────────┘               └─────────────┘
///      ^  │                         │                             │
///      │  │ noise discarded         │ buffer > cap                │
///      │  └───────────────────┐     │ (cleared, frame dropped)    │
///      │                      v     v                             │
///      └──────────────────────────────────────────────────────────┘
/// ```
///
/// A complete frame's payload is queued; [`next_frame`] pops in arrival
/// order.
///
/// [`next_frame`]: StreamParser::next_frame
#[derive(Debug)]
pub struct StreamParser {
    /// Accumulation buffer for incoming bytes.
    buffer: BytesMut,

    /// Current state of the delimiter-pairing state machine.
    state: ParserState,

    /// Queue of complete frames ready for extraction.
    frames: VecDeque<Frame>,
}

impl StreamParser {
    /// Create a new stream parser.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            state: ParserState::Scanning,
            frames: VecDeque::with_capacity(INITIAL_FRAME_QUEUE_CAPACITY),
        }
    }

    /// Feed bytes from the line into the parser.
    ///
    /// Appends to the internal buffer and extracts as many complete
    /// frames as the data allows. Multiple frames may become available
    /// from a single `feed()`.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);

        while self.try_extract_frame() {
            // Keep extracting while complete frames remain
        }
    }

    /// Pop the next complete frame, if any.
    ///
    /// Returns `None` when no complete frame is buffered; feed more bytes
    /// and try again.
    pub fn next_frame(&mut self) -> Option<Frame> {
        self.frames.pop_front()
    }

    /// Current parser state.
    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Number of complete frames ready for extraction.
    pub fn frames_available(&self) -> usize {
        self.frames.len()
    }

    /// Discard all buffered bytes and queued frames and reset the state
    /// machine.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.frames.clear();
        self.state = ParserState::Scanning;
    }

    /// Iterator draining all currently available frames.
    ///
    /// Does not consume new bytes; call [`feed()`] first.
    ///
    /// [`feed()`]: StreamParser::feed
    pub fn drain_frames(&mut self) -> DrainFrames<'_> {
        DrainFrames { parser: self }
    }

    /// Try to extract one complete frame from the buffer.
    ///
    /// Returns `true` if a delimiter was paired (a frame was queued or a
    /// corrupt payload dropped), `false` when more bytes are needed.
    fn try_extract_frame(&mut self) -> bool {
        if self.buffer.len() > MAX_BUFFER_SIZE {
            // A frame this large cannot be a command; drop it wholesale.
            self.clear();
            return false;
        }

        loop {
            match self.state {
                ParserState::Scanning => {
                    if !self.consume_opening_delimiter() {
                        return false;
                    }
                }
                ParserState::Collecting => {
                    return self.consume_payload_and_close();
                }
            }
        }
    }

    /// Scanning state: locate and consume an opening delimiter.
    ///
    /// Returns `true` if the state advanced to `Collecting`.
    fn consume_opening_delimiter(&mut self) -> bool {
        if let Some(pos) = find_delimiter(&self.buffer) {
            let _ = self.buffer.split_to(pos + FRAME_DELIMITER_LEN);
            self.state = ParserState::Collecting;
            true
        } else {
            self.discard_noise();
            false
        }
    }

    /// Collecting state: locate the closing delimiter and queue the
    /// payload between the pair.
    ///
    /// Returns `true` if a closing delimiter was consumed.
    fn consume_payload_and_close(&mut self) -> bool {
        if let Some(pos) = find_delimiter(&self.buffer) {
            let payload = self.buffer.split_to(pos);
            let _ = self.buffer.split_to(FRAME_DELIMITER_LEN);

            if std::str::from_utf8(&payload).is_ok() {
                self.frames.push_back(Frame::from_bytes(&payload, false));
            }
            // Non-UTF-8 payloads are line corruption, dropped silently

            self.state = ParserState::Scanning;
            true
        } else {
            false
        }
    }

    /// Drop scanning noise, retaining only a trailing delimiter prefix
    /// that the next read might complete.
    fn discard_noise(&mut self) {
        let keep = self.delimiter_prefix_tail();
        let drop = self.buffer.len() - keep;
        if drop > 0 {
            let _ = self.buffer.split_to(drop);
        }
    }

    /// Length of the longest proper delimiter prefix ending the buffer.
    fn delimiter_prefix_tail(&self) -> usize {
        let buf: &[u8] = &self.buffer;
        for keep in (1..FRAME_DELIMITER_LEN).rev() {
            if buf.len() >= keep && buf[buf.len() - keep..] == FRAME_DELIMITER[..keep] {
                return keep;
            }
        }
        0
    }
}

impl Default for StreamParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Find the first complete delimiter in `buf`.
fn find_delimiter(buf: &[u8]) -> Option<usize> {
    buf.windows(FRAME_DELIMITER_LEN)
        .position(|window| window == FRAME_DELIMITER)
}

/// Iterator that drains frames from a [`StreamParser`].
///
/// Created by [`StreamParser::drain_frames`]; yields frames in arrival
/// order until the queue is empty.
pub struct DrainFrames<'a> {
    parser: &'a mut StreamParser,
}

impl<'a> Iterator for DrainFrames<'a> {
    type Item = Frame;

    fn next(&mut self) -> Option<Self::Item> {
        self.parser.next_frame()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.parser.frames_available();
        (len, Some(len))
    }
}

impl<'a> ExactSizeIterator for DrainFrames<'a> {
    fn len(&self) -> usize {
        self.parser.frames_available()
    }
}
