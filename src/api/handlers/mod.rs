pub mod auth;
pub mod documents;
pub mod export;
pub mod health;

// common functions for the handlers
use axum::{
    http::{header::AUTHORIZATION, header::HOST, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use regex::Regex;
use serde_json::json;
use tracing::error;

use crate::session::{SessionError, SessionIssuer};

/// JSON `{"message": ...}` reply, the shape every endpoint uses for
/// non-payload responses. Internal error detail never goes through here.
pub(crate) fn reply(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

pub(crate) fn valid_national_id(value: &str) -> bool {
    Regex::new(r"^[0-9]{4,20}$").is_ok_and(|re| re.is_match(value))
}

pub(crate) fn valid_phone(value: &str) -> bool {
    Regex::new(r"^[0-9]{7,15}$").is_ok_and(|re| re.is_match(value))
}

/// Pull the session token out of the authorization header, accepting both a
/// raw token and the `Bearer <token>` form.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|raw| {
            let raw = raw.trim();
            raw.strip_prefix("Bearer ").unwrap_or(raw).trim().to_string()
        })
        .filter(|token| !token.is_empty())
}

/// Authorization chokepoint for every protected read.
///
/// Missing header → 400, invalid or expired token → 401. Expired and invalid
/// tokens are told apart in the logs only; the caller sees the same reply.
pub(crate) fn require_identity(
    headers: &HeaderMap,
    issuer: &SessionIssuer,
) -> Result<String, Response> {
    let Some(token) = bearer_token(headers) else {
        return Err(reply(
            StatusCode::BAD_REQUEST,
            "Session token is required",
        ));
    };

    match issuer.validate(&token) {
        Ok(national_id) => Ok(national_id),
        Err(SessionError::Expired) => {
            error!("Rejected expired session token");
            Err(reply(StatusCode::UNAUTHORIZED, "Invalid session token"))
        }
        Err(SessionError::Invalid) => {
            error!("Rejected invalid session token");
            Err(reply(StatusCode::UNAUTHORIZED, "Invalid session token"))
        }
    }
}

/// Base URL for image links: scheme from the proxy header, host from the
/// request. The upload host serves the bytes; we only build the URL.
pub(crate) fn request_base_url(headers: &HeaderMap) -> String {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("http");
    let host = headers
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("localhost");

    format!("{scheme}://{host}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use secrecy::SecretString;

    fn headers_with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).expect("ascii"));
        headers
    }

    #[test]
    fn bearer_token_accepts_both_forms() {
        assert_eq!(
            bearer_token(&headers_with_auth("Bearer abc.def.ghi")),
            Some("abc.def.ghi".to_string())
        );
        assert_eq!(
            bearer_token(&headers_with_auth("abc.def.ghi")),
            Some("abc.def.ghi".to_string())
        );
    }

    #[test]
    fn bearer_token_rejects_missing_or_empty() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
        assert_eq!(bearer_token(&headers_with_auth("Bearer ")), None);
        assert_eq!(bearer_token(&headers_with_auth("   ")), None);
    }

    #[test]
    fn require_identity_resolves_a_valid_token() {
        let issuer = SessionIssuer::new(&SecretString::from("fixture-signing-key"));
        let token = issuer.issue("12345").expect("token");
        let headers = headers_with_auth(&format!("Bearer {token}"));
        assert_eq!(
            require_identity(&headers, &issuer).ok(),
            Some("12345".to_string())
        );
    }

    #[test]
    fn require_identity_maps_missing_header_to_400() {
        let issuer = SessionIssuer::new(&SecretString::from("fixture-signing-key"));
        let response = require_identity(&HeaderMap::new(), &issuer).unwrap_err();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn require_identity_maps_bad_token_to_401() {
        let issuer = SessionIssuer::new(&SecretString::from("fixture-signing-key"));
        let response =
            require_identity(&headers_with_auth("Bearer garbage"), &issuer).unwrap_err();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn national_id_and_phone_validators() {
        assert!(valid_national_id("12345"));
        assert!(!valid_national_id("12a45"));
        assert!(!valid_national_id("123"));
        assert!(valid_phone("0991112233"));
        assert!(!valid_phone("099-111"));
    }

    #[test]
    fn base_url_prefers_forwarded_proto() {
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static("id.example:8080"));
        assert_eq!(request_base_url(&headers), "http://id.example:8080");

        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        assert_eq!(request_base_url(&headers), "https://id.example:8080");
    }
}
