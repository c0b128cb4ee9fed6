use crate::command::Command;
use crate::error::{FrameError, Result};
use bytes::{BufMut, Bytes, BytesMut};
use hasp_core::constants::{FRAME_DELIMITER, FRAME_DELIMITER_LEN, FRAME_GAP, FRAME_OVERHEAD};
use std::fmt;

/// Byte-level wire form of a single bus message.
///
/// A frame is the JSON payload of one [`Command`] wrapped by the same
/// 3-byte delimiter on both ends, with a newline appended as an
/// inter-frame gap:
///
/// ```text
/// ;;;{"assign_to":"A1","action":"UNLOCK","actor":"alice","timestamp":"..."};;;\n
/// ```
///
/// The gap byte is transmitted but never required on receive; receivers
/// treat anything between a closing and the next opening delimiter as
/// noise.
///
/// # Basic Usage
/// ```
/// use hasp_protocol::{Command, Frame};
/// use hasp_core::LockerAddress;
///
/// let cmd = Command::unlock(LockerAddress::new("A1").unwrap(), "alice");
/// let frame = Frame::from(&cmd).with_delimiters();
///
/// assert!(frame.as_bytes().starts_with(b";;;"));
/// assert!(frame.as_bytes().ends_with(b";;;\n"));
/// ```
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw bytes of the frame.
    data: Bytes,

    /// Size of the frame in bytes.
    size: usize,

    /// Whether `data` includes the wrapping delimiters.
    has_delimiters: bool,
}

impl Frame {
    /// Create a new frame from raw bytes.
    pub fn new(data: Bytes, has_delimiters: bool) -> Self {
        let size = data.len();
        Frame {
            data,
            size,
            has_delimiters,
        }
    }

    /// Create a frame from a byte slice.
    pub fn from_bytes(bytes: &[u8], has_delimiters: bool) -> Self {
        Self::new(Bytes::copy_from_slice(bytes), has_delimiters)
    }

    /// Create an undelimited frame from a payload string.
    pub fn from_payload_str(payload: &str) -> Self {
        Self::from_bytes(payload.as_bytes(), false)
    }

    /// Raw bytes of the frame.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Frame size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether the frame carries its wrapping delimiters.
    pub fn has_delimiters(&self) -> bool {
        self.has_delimiters
    }

    /// The payload bytes, with delimiters and the trailing gap stripped
    /// when present.
    fn payload_bytes(&self) -> &[u8] {
        if !self.has_delimiters {
            return &self.data;
        }

        let mut inner: &[u8] = &self.data;
        if inner.last() == Some(&FRAME_GAP) {
            inner = &inner[..inner.len() - 1];
        }
        if inner.len() >= FRAME_OVERHEAD
            && inner.starts_with(FRAME_DELIMITER)
            && inner.ends_with(FRAME_DELIMITER)
        {
            &inner[FRAME_DELIMITER_LEN..inner.len() - FRAME_DELIMITER_LEN]
        } else {
            &self.data
        }
    }

    /// Wrap the payload in delimiters plus the trailing gap byte.
    ///
    /// Returns a new frame; if delimiters are already present, returns
    /// self unchanged.
    pub fn with_delimiters(self) -> Self {
        if self.has_delimiters {
            return self;
        }

        let mut buf = BytesMut::with_capacity(self.size + FRAME_OVERHEAD + 1);
        buf.put_slice(FRAME_DELIMITER);
        buf.put_slice(&self.data);
        buf.put_slice(FRAME_DELIMITER);
        buf.put_u8(FRAME_GAP);

        let size = buf.len();
        Frame {
            data: buf.freeze(),
            size,
            has_delimiters: true,
        }
    }

    /// Strip delimiters (and the trailing gap) from the frame.
    ///
    /// Returns a new frame; if no delimiters are present, or the bytes do
    /// not actually start and end with the delimiter, returns self
    /// unchanged.
    pub fn without_delimiters(self) -> Self {
        if !self.has_delimiters {
            return self;
        }

        let payload = self.payload_bytes();
        if payload.len() == self.size {
            // Marked as delimited but the bytes disagree; leave untouched.
            return self;
        }

        Frame {
            data: Bytes::copy_from_slice(payload),
            size: payload.len(),
            has_delimiters: false,
        }
    }

    /// The payload as a UTF-8 string.
    ///
    /// # Errors
    /// Returns `FrameError::MalformedBody` if the payload is not valid
    /// UTF-8.
    pub fn to_payload(&self) -> Result<String> {
        String::from_utf8(self.payload_bytes().to_vec())
            .map_err(|e| FrameError::malformed(format!("invalid UTF-8: {e}")))
    }
}

/// Serialize a command into its undelimited wire payload.
impl From<&Command> for Frame {
    fn from(cmd: &Command) -> Self {
        Frame::from_payload_str(&cmd.to_payload())
    }
}

impl From<Command> for Frame {
    fn from(cmd: Command) -> Self {
        Frame::from(&cmd)
    }
}

/// Parse and validate a frame's payload as a command.
impl TryFrom<Frame> for Command {
    type Error = FrameError;

    fn try_from(frame: Frame) -> Result<Self> {
        let payload = frame.to_payload()?;
        Command::from_payload(&payload)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let payload = match self.to_payload() {
            Ok(s) => s,
            Err(_) => {
                let hex: String = self
                    .payload_bytes()
                    .iter()
                    .map(|b| format!("{b:02X}"))
                    .collect::<Vec<_>>()
                    .join(" ");
                format!("<invalid UTF-8: {hex}>")
            }
        };
        write!(
            f,
            "Frame[size={}, delimited={}, payload='{}']",
            self.size, self.has_delimiters, payload
        )
    }
}
