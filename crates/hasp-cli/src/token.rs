//! The `hasp issue-token` and `hasp decode-token` subcommands.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Duration, Utc};
use hasp_core::types::LockerAddress;
use hasp_token::{GrantClaims, TokenCodec};
use std::path::Path;

/// Seal a token and print it on stdout.
pub fn issue(
    key_file: &Path,
    locker: &str,
    actor: &str,
    valid_for: i64,
    from: Option<String>,
    until: Option<String>,
) -> Result<()> {
    let codec = TokenCodec::from_key_file(key_file)
        .with_context(|| format!("loading key material {}", key_file.display()))?;
    let address = LockerAddress::new(locker).context("invalid locker address")?;
    let (valid_from, valid_until) = resolve_window(valid_for, from.as_deref(), until.as_deref())?;

    let claims = GrantClaims::new(address, actor, valid_from, valid_until);
    let token = codec.encode(&claims).context("sealing token")?;

    println!("{token}");
    Ok(())
}

/// Decode a token against the wall clock and print the verdict.
///
/// A rejection is this diagnostic's answer, not a failure: the
/// category and message go to stdout and the command exits cleanly.
pub fn decode(key_file: &Path, token: &str) -> Result<()> {
    let codec = TokenCodec::from_key_file(key_file)
        .with_context(|| format!("loading key material {}", key_file.display()))?;

    match codec.decode(token, Utc::now()) {
        Ok(grant) => {
            println!("accepted");
            println!("  locker:      {}", grant.locker_id());
            println!("  actor:       {}", grant.actor());
            println!("  request_id:  {}", grant.request_id());
            println!("  valid_from:  {}", grant.valid_from().to_rfc3339());
            println!("  valid_until: {}", grant.valid_until().to_rfc3339());
        }
        Err(error) => {
            println!("rejected ({})", error.category());
            println!("  {error}");
        }
    }
    Ok(())
}

/// The validity window: explicit RFC 3339 bounds when given, otherwise
/// `valid_for` seconds starting now.
fn resolve_window(
    valid_for: i64,
    from: Option<&str>,
    until: Option<&str>,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let window = match (from, until) {
        (Some(from), Some(until)) => {
            let from = DateTime::parse_from_rfc3339(from)
                .context("parsing --from")?
                .with_timezone(&Utc);
            let until = DateTime::parse_from_rfc3339(until)
                .context("parsing --until")?
                .with_timezone(&Utc);
            (from, until)
        }
        _ => {
            if valid_for <= 0 {
                bail!("--valid-for must be positive, got {valid_for}");
            }
            let now = Utc::now();
            (now, now + Duration::seconds(valid_for))
        }
    };

    if window.1 <= window.0 {
        bail!("validity window ends before it starts");
    }
    Ok(window)
}
