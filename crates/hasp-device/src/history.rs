//! Bounded transition history for one locker.
//!
//! The controller keeps a short, timestamped record of how the lock
//! position changed and why: commanded over the bus, closed by hand, or
//! merely observed on the latch sensor. The record exists for diagnostics
//! (a technician asking "what happened to locker A1 in the last minute"),
//! not for persistence; it lives in memory and is capped.
//!
//! # Examples
//!
//! ```
//! use hasp_device::history::{TransitionHistory, TransitionSource};
//! use hasp_core::types::LockState;
//!
//! let mut history = TransitionHistory::new();
//! history.record(
//!     LockState::Closed,
//!     LockState::Open,
//!     TransitionSource::Command { actor: "alice".to_string() },
//! );
//!
//! let last = history.latest().unwrap();
//! assert_eq!(last.to, LockState::Open);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use hasp_core::types::LockState;
use tokio::time::Instant;

/// Maximum number of transitions kept in history.
///
/// A locker sees a handful of transitions per access (unlock, open
/// observed, manual close), so 32 entries cover roughly ten complete
/// accesses while keeping the per-device footprint small.
pub const HISTORY_CAPACITY: usize = 32;

/// What caused a recorded transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionSource {
    /// Commanded over the bus on behalf of an actor.
    Command { actor: String },

    /// Latch closed by hand; the controller re-locked in response.
    Manual,

    /// Sensed change with no actuation, such as the door opening after an
    /// unlock.
    Observation,
}

impl fmt::Display for TransitionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionSource::Command { actor } => write!(f, "commanded by {actor}"),
            TransitionSource::Manual => write!(f, "manual"),
            TransitionSource::Observation => write!(f, "observed"),
        }
    }
}

/// A single recorded lock transition.
#[derive(Debug, Clone)]
pub struct TransitionRecord {
    /// Position before the transition.
    pub from: LockState,

    /// Position after the transition.
    pub to: LockState,

    /// What caused it.
    pub source: TransitionSource,

    /// When it was recorded.
    pub timestamp: Instant,
}

impl TransitionRecord {
    /// Create a record stamped with the current time.
    pub fn new(from: LockState, to: LockState, source: TransitionSource) -> Self {
        Self {
            from,
            to,
            source,
            timestamp: Instant::now(),
        }
    }

    /// Time elapsed since this transition was recorded.
    pub fn elapsed(&self) -> Duration {
        self.timestamp.elapsed()
    }
}

impl fmt::Display for TransitionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({})", self.from, self.to, self.source)
    }
}

/// Ring of recent transitions, oldest first.
#[derive(Debug, Default)]
pub struct TransitionHistory {
    records: VecDeque<TransitionRecord>,
}

impl TransitionHistory {
    /// Create an empty history.
    pub fn new() -> Self {
        Self {
            records: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    /// Record a transition, dropping the oldest entry once full.
    pub fn record(&mut self, from: LockState, to: LockState, source: TransitionSource) {
        self.records
            .push_back(TransitionRecord::new(from, to, source));
        if self.records.len() > HISTORY_CAPACITY {
            self.records.pop_front();
        }
    }

    /// Number of retained transitions.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The most recent transition, if any.
    pub fn latest(&self) -> Option<&TransitionRecord> {
        self.records.back()
    }

    /// Iterate over retained transitions, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.records.iter()
    }

    /// The most recent `count` transitions, oldest first.
    pub fn last(&self, count: usize) -> Vec<&TransitionRecord> {
        self.records
            .iter()
            .rev()
            .take(count)
            .rev()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commanded(actor: &str) -> TransitionSource {
        TransitionSource::Command {
            actor: actor.to_string(),
        }
    }

    #[test]
    fn test_new_history_is_empty() {
        let history = TransitionHistory::new();
        assert!(history.is_empty());
        assert!(history.latest().is_none());
    }

    #[test]
    fn test_records_in_order() {
        let mut history = TransitionHistory::new();
        history.record(LockState::Closed, LockState::Open, commanded("alice"));
        history.record(LockState::Open, LockState::Closed, TransitionSource::Manual);

        assert_eq!(history.len(), 2);
        let entries: Vec<_> = history.iter().collect();
        assert_eq!(entries[0].to, LockState::Open);
        assert_eq!(entries[1].to, LockState::Closed);
        assert_eq!(history.latest().unwrap().source, TransitionSource::Manual);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut history = TransitionHistory::new();
        for _ in 0..HISTORY_CAPACITY {
            history.record(LockState::Closed, LockState::Open, commanded("alice"));
        }
        history.record(LockState::Open, LockState::Closed, TransitionSource::Manual);

        assert_eq!(history.len(), HISTORY_CAPACITY);
        // The oldest commanded entry fell off; the newest manual one is
        // retained.
        assert_eq!(history.latest().unwrap().source, TransitionSource::Manual);
    }

    #[test]
    fn test_last_returns_most_recent() {
        let mut history = TransitionHistory::new();
        history.record(LockState::Closed, LockState::Open, commanded("alice"));
        history.record(
            LockState::Closed,
            LockState::Open,
            TransitionSource::Observation,
        );
        history.record(LockState::Open, LockState::Closed, TransitionSource::Manual);

        let last_two = history.last(2);
        assert_eq!(last_two.len(), 2);
        assert_eq!(last_two[0].source, TransitionSource::Observation);
        assert_eq!(last_two[1].source, TransitionSource::Manual);
    }

    #[test]
    fn test_display_formats() {
        let record = TransitionRecord::new(LockState::Closed, LockState::Open, commanded("alice"));
        assert_eq!(format!("{record}"), "CLOSED -> OPEN (commanded by alice)");

        let record =
            TransitionRecord::new(LockState::Open, LockState::Closed, TransitionSource::Manual);
        assert_eq!(format!("{record}"), "OPEN -> CLOSED (manual)");
    }
}
