pub mod codec;
pub mod command;
pub mod error;
pub mod frame;
pub mod stream_parser;

pub use codec::CommandCodec;
pub use command::Command;
pub use error::{FrameError, Result};
pub use frame::Frame;
pub use stream_parser::{DrainFrames, ParserState, StreamParser};
