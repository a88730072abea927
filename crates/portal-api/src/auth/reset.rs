//! Password-reset tokens
//!
//! Tokens carry 256 bits from the OS random source, encoded url-safe so
//! they survive a query string untouched. Expiry is a fixed one hour from
//! issue. An unexpired stored token is reused rather than replaced, so
//! repeated forgot-password requests cannot spam fresh tokens, while an
//! expired one always yields a new link.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use portal_core::Student;
use rand::rngs::OsRng;
use rand::RngCore;

/// Token lifetime, fixed policy
pub fn token_ttl() -> Duration {
    Duration::hours(1)
}

/// A reset token with its bound expiry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issue a fresh token expiring one hour after `now`
pub fn issue(now: DateTime<Utc>) -> ResetToken {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);

    ResetToken {
        token: URL_SAFE_NO_PAD.encode(bytes),
        expires_at: now + token_ttl(),
    }
}

/// Reuse the student's stored token when it is still live, otherwise issue
/// a fresh one. The boolean reports whether the returned token is new and
/// needs persisting.
pub fn reuse_or_issue(student: &Student, now: DateTime<Utc>) -> (ResetToken, bool) {
    match (&student.reset_token, student.reset_token_expiry) {
        (Some(token), Some(expires_at)) if now < expires_at => (
            ResetToken {
                token: token.clone(),
                expires_at,
            },
            false,
        ),
        _ => (issue(now), true),
    }
}

/// Build the reset link the email carries; consumed back by ResetPassword
pub fn reset_link(base: &str, email: &str, token: &str) -> String {
    format!(
        "{base}?email={}&token={}",
        urlencoding::encode(email),
        urlencoding::encode(token)
    )
}
