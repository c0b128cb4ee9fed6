//! Tokio codec for delimiter-framed command streams.
//!
//! Integrates the bus protocol with async byte streams through Tokio's
//! codec traits:
//! - [`Decoder`]: extracts complete [`Command`]s from a byte stream
//! - [`Encoder<Command>`]: writes commands in wire format with delimiters
//!
//! The half-duplex serial transport drives [`StreamParser`] directly
//! because it owns line-direction state; this codec serves the places
//! with a plain bidirectional byte stream, such as wiring a master and a
//! device together over an in-process duplex pipe in tests and tooling.
//!
//! # Usage with Tokio Framed
//!
//! ```rust,no_run
//! use tokio_util::codec::Framed;
//! use hasp_protocol::{Command, CommandCodec};
//! use hasp_core::LockerAddress;
//! use futures::{SinkExt, StreamExt};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (wire, _peer) = tokio::io::duplex(1024);
//! let mut framed = Framed::new(wire, CommandCodec::new());
//!
//! framed
//!     .send(Command::unlock(LockerAddress::new("A1")?, "alice"))
//!     .await?;
//!
//! if let Some(Ok(response)) = framed.next().await {
//!     println!("received {response}");
//! }
//! # Ok(())
//! # }
//! ```

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::{Command, Frame, FrameError, Result, StreamParser};
use hasp_core::constants::MAX_BUFFER_SIZE;

/// Tokio codec for bus commands over a byte stream.
#[derive(Debug)]
pub struct CommandCodec {
    /// Stream parser handling buffering and delimiter pairing.
    parser: StreamParser,

    /// Maximum allowed frame size in bytes.
    max_frame_size: usize,
}

impl CommandCodec {
    /// Create a codec with the default frame size limit.
    pub fn new() -> Self {
        Self {
            parser: StreamParser::new(),
            max_frame_size: MAX_BUFFER_SIZE,
        }
    }

    /// Create a codec with a custom frame size limit.
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            parser: StreamParser::new(),
            max_frame_size,
        }
    }

    /// The configured frame size limit.
    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }
}

impl Default for CommandCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for CommandCodec {
    type Item = Command;
    type Error = FrameError;

    /// Decode one command from the byte stream.
    ///
    /// # Returns
    /// - `Ok(Some(Command))`: a complete, valid command
    /// - `Ok(None)`: need more bytes
    /// - `Err(FrameError)`: a complete frame that is oversized, malformed
    ///   or carries an unknown action. The stream remains usable; callers
    ///   on a shared bus typically log and keep polling.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if !src.is_empty() {
            // All bytes move into the parser's accumulation buffer.
            self.parser.feed(src);
            src.clear();
        }

        match self.parser.next_frame() {
            Some(frame) => {
                if frame.size() > self.max_frame_size {
                    return Err(FrameError::Oversized {
                        size: frame.size(),
                        max_size: self.max_frame_size,
                    });
                }
                Ok(Some(Command::try_from(frame)?))
            }
            None => Ok(None),
        }
    }
}

impl Encoder<Command> for CommandCodec {
    type Error = FrameError;

    /// Encode one command in wire format with delimiters and gap byte.
    fn encode(&mut self, item: Command, dst: &mut BytesMut) -> Result<()> {
        let framed = Frame::from(&item).with_delimiters();

        if framed.size() > self.max_frame_size {
            return Err(FrameError::Oversized {
                size: framed.size(),
                max_size: self.max_frame_size,
            });
        }

        dst.extend_from_slice(framed.as_bytes());
        Ok(())
    }
}
