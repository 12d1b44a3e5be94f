//! Credential store.
//!
//! Owns the `users` table and the password digest. Handlers never see the
//! digest: registration hashes inside [`create`] and login compares inside
//! [`authenticate`].

use sqlx::{PgPool, Row};
use tracing::{info_span, Instrument};

use crate::password;

/// Result of a credential check.
#[derive(Debug, PartialEq, Eq)]
pub enum AuthOutcome {
    /// No account exists for the identity key.
    UnknownUser,
    /// Account exists but the password does not match.
    BadPassword,
    /// Credentials are valid.
    Ok,
}

/// Whether an account already exists for the identity key.
///
/// # Errors
/// Returns the store error if the query fails.
pub async fn exists(pool: &PgPool, national_id: &str) -> Result<bool, sqlx::Error> {
    let query = "SELECT EXISTS(SELECT 1 FROM users WHERE national_id = $1) AS exists";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(national_id)
        .fetch_one(pool)
        .instrument(span)
        .await?;

    Ok(row.get("exists"))
}

/// Outcome when attempting to create a new account.
#[derive(Debug)]
pub enum SignupOutcome {
    Created,
    /// An account for this identity key already exists (caught either by the
    /// pre-check in the handler or by the unique constraint on insert).
    Conflict,
}

/// Create the account: hash the password and insert the row.
///
/// # Errors
/// Returns an error if hashing or the INSERT fails for any reason other than
/// a duplicate identity key.
pub async fn create(
    pool: &PgPool,
    national_id: &str,
    secret: &str,
) -> anyhow::Result<SignupOutcome> {
    let digest = password::hash(secret)?;

    let query = "INSERT INTO users (national_id, password_hash) VALUES ($1, $2)";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    match sqlx::query(query)
        .bind(national_id)
        .bind(&digest)
        .execute(pool)
        .instrument(span)
        .await
    {
        Ok(_) => Ok(SignupOutcome::Created),
        Err(err) if is_unique_violation(&err) => Ok(SignupOutcome::Conflict),
        Err(err) => Err(err.into()),
    }
}

/// Check a login attempt without exposing the stored digest.
///
/// # Errors
/// Returns the store error if the lookup fails.
pub async fn authenticate(
    pool: &PgPool,
    national_id: &str,
    secret: &str,
) -> Result<AuthOutcome, sqlx::Error> {
    let query = "SELECT password_hash FROM users WHERE national_id = $1";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(national_id)
        .fetch_optional(pool)
        .instrument(span)
        .await?;

    let Some(row) = row else {
        return Ok(AuthOutcome::UnknownUser);
    };

    let digest: String = row.get("password_hash");
    if password::verify(secret, &digest) {
        Ok(AuthOutcome::Ok)
    } else {
        Ok(AuthOutcome::BadPassword)
    }
}

/// Postgres unique-violation check, used to map registration races to 409.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_ignores_non_database_errors() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
        assert!(!is_unique_violation(&sqlx::Error::Protocol(
            "boom".to_string()
        )));
    }
}
