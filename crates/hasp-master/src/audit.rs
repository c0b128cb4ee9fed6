//! Audit trail for everything the master decides or observes.
//!
//! Every settled exchange produces one [`AuditEvent`]: a confirmed
//! unlock, a device that never answered, or an unsolicited report a
//! device pushed on its own (a manual re-lock). The orchestrator hands
//! events to an [`AuditSink`] and carries on; a sink that fails gets a
//! warning in the log, never a crash, because the lockers must keep
//! working when the disk does not.
//!
//! Two sinks ship with the crate: [`MemorySink`] for tests and
//! embedding, and [`FileSink`], an append-only JSON-lines log that
//! queues events in memory and drops each one only after its line is
//! on disk, so nothing is lost across a transient write failure.

use crate::proxy::Confirmation;
use hasp_core::types::{Action, LockerAddress, WireTimestamp};
use hasp_protocol::Command;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// How an audited exchange ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// The device confirmed the commanded action.
    Confirmed,
    /// The device never confirmed within the retransmission schedule.
    FailedToOpen,
    /// The device reported the action on its own initiative.
    Reported,
}

impl AuditOutcome {
    /// The label used in serialized events and diagnostics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AuditOutcome::Confirmed => "confirmed",
            AuditOutcome::FailedToOpen => "failed_to_open",
            AuditOutcome::Reported => "reported",
        }
    }
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry in the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Who the action is attributed to.
    pub actor: String,
    /// The locker involved.
    pub locker_id: LockerAddress,
    /// What was commanded or reported.
    pub action: Action,
    /// When it happened, as the device or master stamped it.
    pub timestamp: WireTimestamp,
    /// How the exchange ended.
    pub outcome: AuditOutcome,
}

impl AuditEvent {
    /// Event for a device-confirmed control exchange.
    #[must_use]
    pub fn confirmed(confirmation: &Confirmation) -> Self {
        Self {
            actor: confirmation.actor.clone(),
            locker_id: confirmation.locker_id.clone(),
            action: confirmation.action,
            timestamp: confirmation.timestamp,
            outcome: AuditOutcome::Confirmed,
        }
    }

    /// Event for a device that never confirmed an unlock, stamped now.
    #[must_use]
    pub fn failed_to_open(locker_id: LockerAddress, actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            locker_id,
            action: Action::Unlock,
            timestamp: WireTimestamp::now(),
            outcome: AuditOutcome::FailedToOpen,
        }
    }

    /// Event for an unsolicited device-originated report frame.
    #[must_use]
    pub fn reported(frame: &Command) -> Self {
        Self {
            actor: frame.actor.clone(),
            locker_id: frame.assign_to.clone(),
            action: frame.action,
            timestamp: frame.timestamp,
            outcome: AuditOutcome::Reported,
        }
    }
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} by {}: {}",
            self.action, self.locker_id, self.actor, self.outcome
        )
    }
}

/// Errors a sink can report back to the orchestrator.
///
/// The orchestrator logs these and moves on; they never stop the loop.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// The backing file could not be opened or written.
    #[error("Audit write failed: {0}")]
    Io(#[from] std::io::Error),

    /// An event could not be serialized.
    #[error("Audit serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Destination for audit events.
pub trait AuditSink: Send {
    /// Record one event.
    ///
    /// # Errors
    ///
    /// Implementations report write failures; the caller decides what
    /// a lost event means. The provided [`FileSink`] retains failed
    /// events for the next attempt.
    fn record(&mut self, event: &AuditEvent) -> Result<(), AuditError>;
}

/// In-process audit buffer.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Vec<AuditEvent>,
}

impl MemorySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All events recorded so far, oldest first.
    #[must_use]
    pub fn events(&self) -> &[AuditEvent] {
        &self.events
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl AuditSink for MemorySink {
    fn record(&mut self, event: &AuditEvent) -> Result<(), AuditError> {
        self.events.push(event.clone());
        Ok(())
    }
}

/// Append-only JSON-lines audit log.
///
/// Events queue in memory and each is popped only after its line has
/// been written, so a record that fails leaves the event (and any
/// behind it) queued for the next [`record`](AuditSink::record) call.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    pending: VecDeque<AuditEvent>,
}

impl FileSink {
    /// Create a sink appending to the given path.
    ///
    /// The file is created on first write, not here, so a sink can be
    /// constructed before its directory exists.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pending: VecDeque::new(),
        }
    }

    /// Events still waiting to reach the file.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn flush(&mut self) -> Result<(), AuditError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        while let Some(event) = self.pending.front() {
            let line = serde_json::to_string(event)?;
            writeln!(file, "{line}")?;
            self.pending.pop_front();
        }
        Ok(())
    }
}

impl AuditSink for FileSink {
    fn record(&mut self, event: &AuditEvent) -> Result<(), AuditError> {
        self.pending.push_back(event.clone());
        self.flush()
    }
}
