//! One-time passcode lifecycle.
//!
//! A user has at most one active code: issuing overwrites the previous code
//! and timestamp in a single UPDATE, so concurrent logins are last-writer-wins
//! and the store never holds a half-written pair. Verification reads one row
//! and checks freshness against the wall clock in whole seconds.
//!
//! A successfully verified code stays valid for repeat verification until it
//! expires or is reissued; verification reads, it never consumes.

use chrono::{DateTime, Utc};
use rand::Rng;
use sqlx::{PgPool, Row};
use tracing::{info_span, Instrument};

/// Freshness window measured from `otp_created_at`.
pub const OTP_TTL_SECONDS: i64 = 120;

#[derive(Debug)]
pub enum OtpError {
    /// No user owns this code.
    NotFound,
    /// The code exists but is older than the freshness window.
    Expired,
    /// The store failed or timed out.
    Store(sqlx::Error),
}

/// Generate a uniformly random 6-digit code.
#[must_use]
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

/// Issue a fresh code for the identity key, overwriting any prior one.
///
/// Returns the code for delivery through the notifier. The caller must
/// guarantee the user exists; issuing for an unknown id is a no-op that
/// still returns the generated code.
///
/// # Errors
/// Returns the store error if the UPDATE fails.
pub async fn issue(pool: &PgPool, national_id: &str) -> Result<String, sqlx::Error> {
    let code = generate_code();

    let query = "UPDATE users SET otp_code = $1, otp_created_at = NOW() WHERE national_id = $2";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(&code)
        .bind(national_id)
        .execute(pool)
        .instrument(span)
        .await?;

    Ok(code)
}

/// Resolve a code to the identity key that owns it.
///
/// # Errors
/// `NotFound` when no user holds the code, `Expired` when the code is older
/// than [`OTP_TTL_SECONDS`], `Store` on database failure.
pub async fn verify(pool: &PgPool, code: &str) -> Result<String, OtpError> {
    let query = "SELECT national_id, otp_created_at FROM users WHERE otp_code = $1";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(code)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .map_err(OtpError::Store)?
        .ok_or(OtpError::NotFound)?;

    let national_id: String = row.get("national_id");
    let issued_at: Option<DateTime<Utc>> = row.get("otp_created_at");

    // A code without a timestamp cannot be proven fresh.
    let issued_at = issued_at.ok_or(OtpError::Expired)?;
    if is_expired(issued_at, Utc::now()) {
        return Err(OtpError::Expired);
    }

    Ok(national_id)
}

/// Whole-second freshness check.
fn is_expired(issued_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    (now - issued_at).num_seconds() > OTP_TTL_SECONDS
}
