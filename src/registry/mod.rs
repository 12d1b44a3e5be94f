//! Identity verification against the external registries.
//!
//! Read-only cross-checks over the civil registry (`person_card`) and the
//! telecom ownership table (`telecom_company`). Registration may not create
//! an account until both checks pass.

use sqlx::{PgPool, Row};
use tracing::{info_span, Instrument};

#[derive(Debug)]
pub enum VerifyError {
    /// The identity key is absent from the civil registry (404).
    UnknownCitizen,
    /// The phone number is not registered to this identity key (403).
    PhoneMismatch,
    /// The store failed or timed out (500).
    Store(sqlx::Error),
}

/// Confirm that the citizen exists and owns the claimed phone number.
///
/// # Errors
/// See [`VerifyError`].
pub async fn verify_claim(
    pool: &PgPool,
    national_id: &str,
    phone: &str,
) -> Result<(), VerifyError> {
    if !citizen_exists(pool, national_id)
        .await
        .map_err(VerifyError::Store)?
    {
        return Err(VerifyError::UnknownCitizen);
    }

    if !phone_belongs_to(pool, phone, national_id)
        .await
        .map_err(VerifyError::Store)?
    {
        return Err(VerifyError::PhoneMismatch);
    }

    Ok(())
}

async fn citizen_exists(pool: &PgPool, national_id: &str) -> Result<bool, sqlx::Error> {
    let query = "SELECT EXISTS(SELECT 1 FROM person_card WHERE national_id = $1) AS exists";
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

async fn phone_belongs_to(
    pool: &PgPool,
    phone: &str,
    national_id: &str,
) -> Result<bool, sqlx::Error> {
    let query = "SELECT EXISTS(\
                 SELECT 1 FROM telecom_company WHERE phone_number = $1 AND national_id = $2\
                 ) AS exists";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(phone)
        .bind(national_id)
        .fetch_one(pool)
        .instrument(span)
        .await?;

    Ok(row.get("exists"))
}
