use crate::{
    Result,
    constants::{MAX_ADDRESS_LENGTH, MIN_ADDRESS_LENGTH},
    error::Error,
};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Locker address on the shared bus (1-32 characters).
///
/// Addresses identify exactly one device node. The character set is
/// restricted to ASCII alphanumerics plus `-` and `_` so an address can
/// never collide with the frame delimiter or JSON syntax.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LockerAddress(String);

impl LockerAddress {
    /// Create a new locker address with validation.
    ///
    /// The input is trimmed before validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidAddress` if the trimmed input is not 1-32
    /// characters or contains anything outside `[A-Za-z0-9_-]`.
    pub fn new(address: &str) -> Result<Self> {
        let address = address.trim();

        let len = address.len();
        if !(MIN_ADDRESS_LENGTH..=MAX_ADDRESS_LENGTH).contains(&len) {
            return Err(Error::InvalidAddress {
                message: format!(
                    "address must be {MIN_ADDRESS_LENGTH}-{MAX_ADDRESS_LENGTH} chars, got {len}"
                ),
            });
        }

        if !address
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(Error::InvalidAddress {
                message: format!("address {address:?} contains invalid characters"),
            });
        }

        Ok(LockerAddress(address.to_string()))
    }

    /// Get the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockerAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for LockerAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        LockerAddress::new(s)
    }
}

/// Deserialization goes through [`LockerAddress::new`] so an address read
/// from a config file or wire payload is always validated.
impl<'de> Deserialize<'de> for LockerAddress {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        LockerAddress::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Command action carried in a bus frame.
///
/// `Unlock` and `Lock` are control actions dispatched to a device's
/// actuator; `Ack` is a protocol-level acknowledgment that carries no
/// locker-control semantics and must never reach the actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Unlock,
    Lock,
    Ack,
}

impl Action {
    /// Parse an action from its wire spelling.
    ///
    /// # Errors
    /// Returns `Error::InvalidAction` for anything other than `"UNLOCK"`,
    /// `"LOCK"` or `"ACK"`. The spelling is case-sensitive, matching what
    /// compliant nodes transmit.
    pub fn from_wire(s: &str) -> Result<Self> {
        match s {
            "UNLOCK" => Ok(Action::Unlock),
            "LOCK" => Ok(Action::Lock),
            "ACK" => Ok(Action::Ack),
            other => Err(Error::InvalidAction(other.to_string())),
        }
    }

    /// The wire spelling of this action.
    #[inline]
    #[must_use]
    pub fn as_wire(self) -> &'static str {
        match self {
            Action::Unlock => "UNLOCK",
            Action::Lock => "LOCK",
            Action::Ack => "ACK",
        }
    }

    /// Returns `true` for actions that drive the actuator.
    #[inline]
    #[must_use]
    pub fn is_control(self) -> bool {
        matches!(self, Action::Unlock | Action::Lock)
    }

    /// Returns `true` for the acknowledgment action.
    #[inline]
    #[must_use]
    pub fn is_ack(self) -> bool {
        matches!(self, Action::Ack)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_wire())
    }
}

/// Commanded actuator state of a locker's solenoid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockState {
    Closed,
    Open,
}

impl LockState {
    /// Create a lock state from a logic level (0 = closed, 1 = open).
    ///
    /// # Errors
    /// Returns `Error::Config` for levels other than 0 or 1.
    #[inline]
    pub fn from_level(level: u8) -> Result<Self> {
        match level {
            0 => Ok(LockState::Closed),
            1 => Ok(LockState::Open),
            other => Err(Error::Config(format!("invalid lock level: {other}"))),
        }
    }

    /// The logic level driven onto the solenoid pin.
    #[inline]
    #[must_use]
    pub fn as_level(self) -> u8 {
        match self {
            LockState::Closed => 0,
            LockState::Open => 1,
        }
    }

    /// Returns `true` if the state is `Open`.
    #[inline]
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, LockState::Open)
    }

    /// Returns `true` if the state is `Closed`.
    #[inline]
    #[must_use]
    pub fn is_closed(self) -> bool {
        matches!(self, LockState::Closed)
    }
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LockState::Closed => write!(f, "CLOSED"),
            LockState::Open => write!(f, "OPEN"),
        }
    }
}

/// Debounced position reported by the latch feedback sensor.
///
/// Deliberately a separate type from [`LockState`]: feedback reflects
/// observed reality while the actuator state reflects commanded intent, and
/// the two can legitimately disagree (a user holding the door, a manual
/// re-lock).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackState {
    Closed,
    Open,
}

impl FeedbackState {
    /// Create a feedback state from a sensor logic level (0 = closed,
    /// 1 = open).
    ///
    /// # Errors
    /// Returns `Error::Config` for levels other than 0 or 1.
    #[inline]
    pub fn from_level(level: u8) -> Result<Self> {
        match level {
            0 => Ok(FeedbackState::Closed),
            1 => Ok(FeedbackState::Open),
            other => Err(Error::Config(format!("invalid feedback level: {other}"))),
        }
    }

    /// The raw sensor logic level for this state.
    #[inline]
    #[must_use]
    pub fn as_level(self) -> u8 {
        match self {
            FeedbackState::Closed => 0,
            FeedbackState::Open => 1,
        }
    }

    /// Returns `true` if the latch is sensed open.
    #[inline]
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, FeedbackState::Open)
    }

    /// Returns `true` if the latch is sensed closed.
    #[inline]
    #[must_use]
    pub fn is_closed(self) -> bool {
        matches!(self, FeedbackState::Closed)
    }
}

impl fmt::Display for FeedbackState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FeedbackState::Closed => write!(f, "CLOSED"),
            FeedbackState::Open => write!(f, "OPEN"),
        }
    }
}

/// ISO-8601 timestamp carried on the wire.
///
/// Stored in UTC at whole-second precision so a value always compares equal
/// to its own wire round-trip. Parsing is liberal: RFC-3339 with any offset
/// is accepted, as is a bare `YYYY-MM-DDTHH:MM:SS[.frac]` (assumed UTC),
/// which is what the token issuing authority emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireTimestamp(DateTime<Utc>);

impl WireTimestamp {
    /// Current time, truncated to whole seconds.
    #[must_use]
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Create a timestamp from a DateTime, truncating to whole seconds.
    #[must_use]
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        let truncated = DateTime::<Utc>::from_timestamp(dt.timestamp(), 0).unwrap_or(dt);
        WireTimestamp(truncated)
    }

    /// Parse from RFC-3339 or bare ISO-8601 (assumed UTC).
    ///
    /// # Errors
    /// Returns `Error::InvalidTimestamp` if neither form matches.
    pub fn parse(s: &str) -> Result<Self> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(WireTimestamp(dt.with_timezone(&Utc)));
        }

        let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").map_err(|e| {
            Error::InvalidTimestamp {
                message: format!("'{s}' is not ISO-8601: {e}"),
            }
        })?;

        Ok(WireTimestamp(Utc.from_utc_datetime(&naive)))
    }

    /// Format as RFC-3339 with second precision (`2025-06-01T12:00:00+00:00`).
    #[must_use]
    pub fn format(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Secs, false)
    }

    /// Get the inner DateTime.
    #[must_use]
    pub fn inner(&self) -> DateTime<Utc> {
        self.0
    }
}

impl fmt::Display for WireTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.format())
    }
}

impl std::str::FromStr for WireTimestamp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        WireTimestamp::parse(s)
    }
}

impl Serialize for WireTimestamp {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.format())
    }
}

impl<'de> Deserialize<'de> for WireTimestamp {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        WireTimestamp::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("A1", "A1")]
    #[case("locker_07", "locker_07")]
    #[case("  B2  ", "B2")] // trimmed
    #[case("X-9", "X-9")]
    fn test_locker_address_valid(#[case] input: &str, #[case] expected: &str) {
        let addr = LockerAddress::new(input).unwrap();
        assert_eq!(addr.as_str(), expected);
    }

    #[rstest]
    #[case("")] // empty
    #[case("   ")] // whitespace only
    #[case("a;;;b")] // delimiter characters
    #[case("has space")]
    #[case("áéí")] // non-ASCII
    fn test_locker_address_invalid(#[case] input: &str) {
        assert!(LockerAddress::new(input).is_err());
    }

    #[test]
    fn test_locker_address_max_length() {
        let max = "A".repeat(32);
        assert!(LockerAddress::new(&max).is_ok());
        let over = "A".repeat(33);
        assert!(LockerAddress::new(&over).is_err());
    }

    #[test]
    fn test_locker_address_serde_transparent() {
        let addr = LockerAddress::new("A1").unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"A1\"");
        let back: LockerAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn test_locker_address_deserialize_validates() {
        let result: std::result::Result<LockerAddress, _> = serde_json::from_str("\"a;;;b\"");
        assert!(result.is_err());
        let result: std::result::Result<LockerAddress, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[rstest]
    #[case("UNLOCK", Action::Unlock)]
    #[case("LOCK", Action::Lock)]
    #[case("ACK", Action::Ack)]
    fn test_action_from_wire(#[case] input: &str, #[case] expected: Action) {
        assert_eq!(Action::from_wire(input).unwrap(), expected);
        assert_eq!(expected.as_wire(), input);
    }

    #[rstest]
    #[case("unlock")] // lower-case is not compliant
    #[case("REBOOT")]
    #[case("")]
    fn test_action_from_wire_invalid(#[case] input: &str) {
        assert!(Action::from_wire(input).is_err());
    }

    #[test]
    fn test_action_predicates() {
        assert!(Action::Unlock.is_control());
        assert!(Action::Lock.is_control());
        assert!(!Action::Ack.is_control());
        assert!(Action::Ack.is_ack());
    }

    #[test]
    fn test_action_serde_uppercase() {
        let json = serde_json::to_string(&Action::Unlock).unwrap();
        assert_eq!(json, "\"UNLOCK\"");
        let back: Action = serde_json::from_str("\"ACK\"").unwrap();
        assert_eq!(back, Action::Ack);
    }

    #[test]
    fn test_lock_state_levels() {
        assert_eq!(LockState::from_level(0).unwrap(), LockState::Closed);
        assert_eq!(LockState::from_level(1).unwrap(), LockState::Open);
        assert!(LockState::from_level(2).is_err());
        assert_eq!(LockState::Open.as_level(), 1);
        assert_eq!(LockState::Closed.as_level(), 0);
    }

    #[test]
    fn test_feedback_state_levels() {
        assert_eq!(FeedbackState::from_level(0).unwrap(), FeedbackState::Closed);
        assert_eq!(FeedbackState::from_level(1).unwrap(), FeedbackState::Open);
        assert!(FeedbackState::from_level(9).is_err());
    }

    #[test]
    fn test_wire_timestamp_rfc3339_round_trip() {
        let ts = WireTimestamp::parse("2025-06-01T12:00:00+00:00").unwrap();
        let formatted = ts.format();
        let back = WireTimestamp::parse(&formatted).unwrap();
        assert_eq!(back, ts);
    }

    #[test]
    fn test_wire_timestamp_naive_assumed_utc() {
        let naive = WireTimestamp::parse("2025-06-01T12:00:00").unwrap();
        let explicit = WireTimestamp::parse("2025-06-01T12:00:00+00:00").unwrap();
        assert_eq!(naive, explicit);
    }

    #[test]
    fn test_wire_timestamp_fractional_input() {
        // The issuing authority emits microseconds; parsing keeps them,
        // equality at the type level is by instant.
        let ts = WireTimestamp::parse("2025-06-01T12:00:00.123456").unwrap();
        assert_eq!(ts.inner().timestamp(), 1748779200);
    }

    #[rstest]
    #[case("yesterday")]
    #[case("2025-13-01T00:00:00")]
    #[case("")]
    fn test_wire_timestamp_invalid(#[case] input: &str) {
        assert!(WireTimestamp::parse(input).is_err());
    }

    #[test]
    fn test_wire_timestamp_now_round_trips() {
        let now = WireTimestamp::now();
        let back = WireTimestamp::parse(&now.format()).unwrap();
        assert_eq!(back, now);
    }

    #[test]
    fn test_wire_timestamp_offset_normalized_to_utc() {
        let ts = WireTimestamp::parse("2025-06-01T09:00:00-03:00").unwrap();
        let utc = WireTimestamp::parse("2025-06-01T12:00:00+00:00").unwrap();
        assert_eq!(ts, utc);
    }
}
