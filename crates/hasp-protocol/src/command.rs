//! Command model for locker bus frames.
//!
//! Every frame on the bus carries exactly one command: a JSON object with
//! the target address, the action, the human actor on whose behalf the
//! command runs, and a timestamp.
//!
//! # Wire Format
//!
//! ```text
//! {"assign_to":"A1","action":"UNLOCK","actor":"alice","timestamp":"2025-06-01T12:00:00+00:00"}
//! ```
//!
//! The same shape flows in both directions. A command from the master is a
//! request; a command from a device with `assign_to` set to the device's
//! OWN address is a confirmation or an audit event. `ACK` closes the
//! exchange and is never dispatched to an actuator.
//!
//! # Parsing
//!
//! [`Command::from_payload`] validates in two phases: first the JSON
//! structure (anything broken is [`FrameError::MalformedBody`], which
//! receivers treat as line noise), then the action spelling, so that a
//! well-formed frame with an unrecognized action surfaces as
//! [`FrameError::UnknownAction`] together with its target address. Unknown
//! extra fields are ignored, older firmware revisions append diagnostic
//! fields.

use crate::error::{FrameError, Result};
use hasp_core::constants::MAX_FIELD_LENGTH;
use hasp_core::{Action, LockerAddress, WireTimestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single command exchanged on the locker bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command {
    /// Address of the node this command is for.
    pub assign_to: LockerAddress,

    /// What the addressed node should do (or did, for confirmations).
    pub action: Action,

    /// Human actor this command runs on behalf of.
    pub actor: String,

    /// When the sender issued the command.
    pub timestamp: WireTimestamp,
}

/// Untyped mirror of the wire object, used as the first parsing phase.
#[derive(Deserialize)]
struct RawCommand {
    assign_to: String,
    action: String,
    actor: String,
    timestamp: String,
}

impl Command {
    /// Create a command stamped with the current time.
    pub fn new(assign_to: LockerAddress, action: Action, actor: impl Into<String>) -> Self {
        Self {
            assign_to,
            action,
            actor: actor.into(),
            timestamp: WireTimestamp::now(),
        }
    }

    /// Shorthand for an `UNLOCK` command.
    pub fn unlock(assign_to: LockerAddress, actor: impl Into<String>) -> Self {
        Self::new(assign_to, Action::Unlock, actor)
    }

    /// Shorthand for a `LOCK` command.
    pub fn lock(assign_to: LockerAddress, actor: impl Into<String>) -> Self {
        Self::new(assign_to, Action::Lock, actor)
    }

    /// Shorthand for an `ACK` closing an exchange.
    pub fn ack(assign_to: LockerAddress, actor: impl Into<String>) -> Self {
        Self::new(assign_to, Action::Ack, actor)
    }

    /// Replace the timestamp (builder style, used when relaying).
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: WireTimestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Returns `true` if this command is addressed to `address`.
    #[must_use]
    pub fn is_for(&self, address: &LockerAddress) -> bool {
        self.assign_to == *address
    }

    /// Returns `true` for protocol acknowledgments.
    #[must_use]
    pub fn is_ack(&self) -> bool {
        self.action.is_ack()
    }

    /// Parse a command from the JSON payload of a frame.
    ///
    /// # Errors
    /// - `MalformedBody`: broken JSON, missing or mistyped fields, invalid
    ///   address or timestamp, or a field over the length limit;
    /// - `UnknownAction`: well-formed object whose `action` is not a
    ///   recognized spelling. Carries the target address so the receiver
    ///   can decide whether to warn.
    pub fn from_payload(payload: &str) -> Result<Self> {
        let raw: RawCommand = serde_json::from_str(payload)
            .map_err(|e| FrameError::malformed(format!("invalid command JSON: {e}")))?;

        // Length checks before anything else. A field this long is not a
        // command from a compliant node, whatever else it contains.
        for (name, value) in [("action", &raw.action), ("actor", &raw.actor)] {
            if value.len() > MAX_FIELD_LENGTH {
                return Err(FrameError::malformed(format!(
                    "{name} exceeds {MAX_FIELD_LENGTH} bytes"
                )));
            }
        }

        let assign_to = LockerAddress::new(&raw.assign_to)
            .map_err(|e| FrameError::malformed(format!("assign_to: {e}")))?;

        let action = match Action::from_wire(&raw.action) {
            Ok(action) => action,
            Err(_) => {
                return Err(FrameError::UnknownAction {
                    action: raw.action,
                    assign_to: assign_to.as_str().to_string(),
                });
            }
        };

        let timestamp = WireTimestamp::parse(&raw.timestamp)
            .map_err(|e| FrameError::malformed(format!("timestamp: {e}")))?;

        Ok(Command {
            assign_to,
            action,
            actor: raw.actor,
            timestamp,
        })
    }

    /// Serialize to the JSON payload of a frame.
    #[must_use]
    pub fn to_payload(&self) -> String {
        serde_json::json!({
            "assign_to": self.assign_to.as_str(),
            "action": self.action.as_wire(),
            "actor": self.actor,
            "timestamp": self.timestamp.format(),
        })
        .to_string()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} (actor: {})",
            self.action, self.assign_to, self.actor
        )
    }
}
