//! Stateless session tokens.
//!
//! The issuer is constructed once with the signing key and handed to the
//! router as an extension; nothing else in the crate touches the key. Tokens
//! are HS256 JWTs carrying the citizen's national id and an absolute expiry.
//! There is no revocation list: a token stays valid until it expires.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Session lifetime: one hour from issuance.
pub const SESSION_TTL_SECONDS: i64 = 3600;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Validation failure, kept separate for observability. Both variants
/// surface to the caller as 401.
#[derive(Debug, PartialEq, Eq)]
pub enum SessionError {
    Expired,
    Invalid,
}

pub struct SessionIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionIssuer {
    #[must_use]
    pub fn new(key: &SecretString) -> Self {
        Self::with_ttl(key, Duration::seconds(SESSION_TTL_SECONDS))
    }

    /// Issuer with a custom lifetime, used by tests with fixture keys.
    #[must_use]
    pub fn with_ttl(key: &SecretString, ttl: Duration) -> Self {
        let secret = key.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Mint a signed token for the given identity key.
    ///
    /// # Errors
    /// Returns an error if JWT encoding fails.
    pub fn issue(&self, national_id: &str) -> anyhow::Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: national_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Verify signature and expiry, returning the embedded identity key.
    ///
    /// # Errors
    /// `SessionError::Expired` when the token is past its expiry,
    /// `SessionError::Invalid` for every other failure.
    pub fn validate(&self, token: &str) -> Result<String, SessionError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact to the second; skew tolerance stays at zero.
        validation.leeway = 0;

        match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => Ok(data.claims.sub),
            Err(err) => match err.kind() {
                ErrorKind::ExpiredSignature => Err(SessionError::Expired),
                _ => Err(SessionError::Invalid),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn fixture_issuer() -> SessionIssuer {
        SessionIssuer::new(&SecretString::from("fixture-signing-key"))
    }

    #[test]
    fn issue_then_validate_round_trips() -> Result<()> {
        let issuer = fixture_issuer();
        let token = issuer.issue("12345")?;
        assert_eq!(issuer.validate(&token), Ok("12345".to_string()));
        Ok(())
    }

    #[test]
    fn validate_rejects_expired_token() -> Result<()> {
        let key = SecretString::from("fixture-signing-key");
        let issuer = SessionIssuer::with_ttl(&key, Duration::seconds(-120));
        let token = issuer.issue("12345")?;
        assert_eq!(issuer.validate(&token), Err(SessionError::Expired));
        Ok(())
    }

    #[test]
    fn validate_rejects_tampered_token() -> Result<()> {
        let issuer = fixture_issuer();
        let token = issuer.issue("12345")?;
        // Corrupt the signature segment.
        let mut tampered = token.clone();
        tampered.pop();
        tampered.push(if token.ends_with('A') { 'B' } else { 'A' });
        assert_eq!(issuer.validate(&tampered), Err(SessionError::Invalid));
        Ok(())
    }

    #[test]
    fn validate_rejects_token_from_other_key() -> Result<()> {
        let other = SessionIssuer::new(&SecretString::from("some-other-key"));
        let token = other.issue("12345")?;
        assert_eq!(fixture_issuer().validate(&token), Err(SessionError::Invalid));
        Ok(())
    }

    #[test]
    fn validate_rejects_garbage() {
        assert_eq!(
            fixture_issuer().validate("not-a-jwt"),
            Err(SessionError::Invalid)
        );
    }
}
