//! Validated access grants and the claims used to issue them.

use chrono::{DateTime, Utc};
use hasp_core::LockerAddress;
use uuid::Uuid;

/// A decoded, validated access token.
///
/// Only the codec constructs this type, and only after every identifying
/// field was present and the current time fell inside
/// `[valid_from, valid_until]`. Holding an `AccessGrant` therefore proves
/// the token was authentic and live at validation time.
///
/// Grants are created transiently per scan and consumed immediately by the
/// orchestrator; nothing in the core persists them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGrant {
    locker_id: LockerAddress,
    actor: String,
    request_id: String,
    valid_from: DateTime<Utc>,
    valid_until: DateTime<Utc>,
}

impl AccessGrant {
    pub(crate) fn new(
        locker_id: LockerAddress,
        actor: String,
        request_id: String,
        valid_from: DateTime<Utc>,
        valid_until: DateTime<Utc>,
    ) -> Self {
        Self {
            locker_id,
            actor,
            request_id,
            valid_from,
            valid_until,
        }
    }

    /// Address of the locker this grant unlocks.
    #[must_use]
    pub fn locker_id(&self) -> &LockerAddress {
        &self.locker_id
    }

    /// Identity the token was issued to.
    #[must_use]
    pub fn actor(&self) -> &str {
        &self.actor
    }

    /// Opaque issuing-side key for deduplication and tracing.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Start of the validity window (inclusive).
    #[must_use]
    pub fn valid_from(&self) -> DateTime<Utc> {
        self.valid_from
    }

    /// End of the validity window (inclusive).
    #[must_use]
    pub fn valid_until(&self) -> DateTime<Utc> {
        self.valid_until
    }
}

/// Claims sealed into a token on the issuing side.
///
/// The plaintext counterpart of [`AccessGrant`], before any validation
/// against a clock. Produced by whoever issues tokens (the CLI subcommand
/// or a test) and consumed by [`crate::TokenCodec::encode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantClaims {
    /// Address of the locker the token unlocks.
    pub locker_id: LockerAddress,
    /// Identity the token is issued to.
    pub actor: String,
    /// Opaque deduplication/trace key.
    pub request_id: String,
    /// Start of the validity window (inclusive).
    pub valid_from: DateTime<Utc>,
    /// End of the validity window (inclusive).
    pub valid_until: DateTime<Utc>,
}

impl GrantClaims {
    /// Create claims with a freshly generated request id.
    #[must_use]
    pub fn new(
        locker_id: LockerAddress,
        actor: impl Into<String>,
        valid_from: DateTime<Utc>,
        valid_until: DateTime<Utc>,
    ) -> Self {
        Self {
            locker_id,
            actor: actor.into(),
            request_id: Uuid::new_v4().to_string(),
            valid_from,
            valid_until,
        }
    }

    /// Replace the generated request id with a caller-supplied one.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn addr(s: &str) -> LockerAddress {
        LockerAddress::new(s).unwrap()
    }

    #[test]
    fn test_claims_generate_request_id() {
        let from = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        let until = Utc.with_ymd_and_hms(2025, 6, 1, 11, 0, 0).unwrap();

        let a = GrantClaims::new(addr("A1"), "alice", from, until);
        let b = GrantClaims::new(addr("A1"), "alice", from, until);
        assert_ne!(a.request_id, b.request_id);
        assert!(!a.request_id.is_empty());
    }

    #[test]
    fn test_claims_with_request_id() {
        let from = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        let until = Utc.with_ymd_and_hms(2025, 6, 1, 11, 0, 0).unwrap();

        let claims =
            GrantClaims::new(addr("A1"), "alice", from, until).with_request_id("req-0042");
        assert_eq!(claims.request_id, "req-0042");
    }

    #[test]
    fn test_grant_accessors() {
        let from = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        let until = Utc.with_ymd_and_hms(2025, 6, 1, 11, 0, 0).unwrap();

        let grant = AccessGrant::new(addr("B2"), "bob".into(), "r1".into(), from, until);
        assert_eq!(grant.locker_id().as_str(), "B2");
        assert_eq!(grant.actor(), "bob");
        assert_eq!(grant.request_id(), "r1");
        assert_eq!(grant.valid_from(), from);
        assert_eq!(grant.valid_until(), until);
    }
}
