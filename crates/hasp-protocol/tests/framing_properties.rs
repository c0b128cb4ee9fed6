//! Property-based tests for frame extraction and command round trips.
//!
//! These tests use proptest to generate random commands, chunk sizes and
//! line noise and verify that the wire representation survives arbitrary
//! delivery patterns.

use hasp_core::{Action, LockerAddress, WireTimestamp};
use hasp_protocol::{Command, Frame, StreamParser};
use proptest::prelude::*;

/// Strategy for valid locker addresses.
fn valid_address() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9_-]{1,32}")
        .expect("Failed to create address regex strategy")
}

/// Strategy for actor names without JSON-hostile characters.
fn valid_actor() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9 ._@-]{0,64}")
        .expect("Failed to create actor regex strategy")
}

/// Strategy for the three recognized actions.
fn valid_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        Just(Action::Unlock),
        Just(Action::Lock),
        Just(Action::Ack),
    ]
}

/// Strategy for whole-second timestamps between 2020 and 2030.
fn valid_timestamp() -> impl Strategy<Value = WireTimestamp> {
    (1_577_836_800i64..1_893_456_000i64).prop_map(|secs| {
        let dt = chrono::DateTime::from_timestamp(secs, 0).expect("in range");
        WireTimestamp::from_datetime(dt)
    })
}

/// Strategy for a complete command.
fn valid_command() -> impl Strategy<Value = Command> {
    (
        valid_address(),
        valid_action(),
        valid_actor(),
        valid_timestamp(),
    )
        .prop_map(|(address, action, actor, timestamp)| {
            let address = LockerAddress::new(&address).expect("strategy produces valid addresses");
            Command::new(address, action, actor).with_timestamp(timestamp)
        })
}

/// Strategy for line noise free of delimiter bytes.
///
/// Noise containing the delimiter sequence legitimately forms (garbage)
/// frames, so this strategy models electrical noise rather than
/// adversarial framing.
fn delimiter_free_noise() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(
        (0u8..=255).prop_filter("no delimiter bytes", |b| *b != b';'),
        0..64,
    )
}

fn wire_bytes(cmd: &Command) -> Vec<u8> {
    Frame::from(cmd).with_delimiters().as_bytes().to_vec()
}

proptest! {
    /// Property: A command survives the full wire round trip whatever its
    /// contents.
    #[test]
    fn prop_command_wire_round_trip(cmd in valid_command()) {
        let mut parser = StreamParser::new();
        parser.feed(&wire_bytes(&cmd));

        prop_assert_eq!(parser.frames_available(), 1);
        let frame = parser.next_frame().expect("frame available");
        let recovered = Command::try_from(frame).expect("round trip parses");
        prop_assert_eq!(recovered, cmd);
    }

    /// Property: Splitting the wire bytes at any point, including inside
    /// a delimiter, never changes the extracted command.
    #[test]
    fn prop_any_split_point_reassembles(cmd in valid_command(), split in any::<prop::sample::Index>()) {
        let bytes = wire_bytes(&cmd);
        let at = split.index(bytes.len());

        let mut parser = StreamParser::new();
        parser.feed(&bytes[..at]);
        parser.feed(&bytes[at..]);

        prop_assert_eq!(parser.frames_available(), 1);
        let recovered = Command::try_from(parser.next_frame().expect("frame available"))
            .expect("reassembled frame parses");
        prop_assert_eq!(recovered, cmd);
    }

    /// Property: Feeding byte by byte is equivalent to feeding at once.
    #[test]
    fn prop_byte_by_byte_equivalent(cmds in prop::collection::vec(valid_command(), 1..4)) {
        let mut all_bytes = Vec::new();
        for cmd in &cmds {
            all_bytes.extend_from_slice(&wire_bytes(cmd));
        }

        let mut parser = StreamParser::new();
        for &byte in &all_bytes {
            parser.feed(&[byte]);
        }

        prop_assert_eq!(parser.frames_available(), cmds.len());
        for cmd in &cmds {
            let recovered = Command::try_from(parser.next_frame().expect("frame available"))
                .expect("frame parses");
            prop_assert_eq!(&recovered, cmd);
        }
    }

    /// Property: Delimiter-free noise before, between and after frames is
    /// discarded without corrupting any frame.
    #[test]
    fn prop_noise_does_not_corrupt_frames(
        cmds in prop::collection::vec(valid_command(), 1..4),
        noise in prop::collection::vec(delimiter_free_noise(), 4),
    ) {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&noise[0]);
        for (i, cmd) in cmds.iter().enumerate() {
            bytes.extend_from_slice(&wire_bytes(cmd));
            bytes.extend_from_slice(&noise[(i + 1).min(3)]);
        }

        let mut parser = StreamParser::new();
        parser.feed(&bytes);

        prop_assert_eq!(parser.frames_available(), cmds.len());
        for cmd in &cmds {
            let recovered = Command::try_from(parser.next_frame().expect("frame available"))
                .expect("frame parses");
            prop_assert_eq!(&recovered, cmd);
        }
    }

    /// Property: Whatever bytes arrive, the parser never panics and never
    /// buffers past its cap.
    #[test]
    fn prop_arbitrary_bytes_never_panic(chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..512), 0..16)) {
        let mut parser = StreamParser::new();
        for chunk in &chunks {
            parser.feed(chunk);
        }
        // Drain whatever the noise happened to form
        for frame in parser.drain_frames() {
            let _ = Command::try_from(frame);
        }
    }
}
