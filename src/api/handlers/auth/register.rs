use axum::{extract::Extension, http::StatusCode, response::Response, Json};
use sqlx::PgPool;
use tracing::{debug, error, instrument};

use crate::{
    api::handlers::{reply, valid_national_id, valid_phone},
    registry::{self, VerifyError},
    users::{self, SignupOutcome},
};

use super::types::RegisterRequest;

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created"),
        (status = 400, description = "Missing or malformed fields, or password mismatch"),
        (status = 403, description = "Phone number is not registered to this citizen"),
        (status = 404, description = "Citizen is absent from the civil registry"),
        (status = 409, description = "Account already exists"),
    ),
    tag = "auth"
)]
#[instrument(skip(pool, payload))]
pub async fn register(
    pool: Extension<PgPool>,
    payload: Option<Json<RegisterRequest>>,
) -> Response {
    let Some(Json(claim)) = payload else {
        return reply(StatusCode::BAD_REQUEST, "All fields are required");
    };

    if let Some(response) = validate_claim(&claim) {
        return response;
    }

    let national_id = claim.national_id.trim();

    // Registry gate: both checks must pass before an account may exist.
    if let Err(err) = registry::verify_claim(&pool, national_id, claim.phone.trim()).await {
        return claim_rejection(&err);
    }

    match users::exists(&pool, national_id).await {
        Ok(true) => {
            debug!("Account already exists");
            return reply(StatusCode::CONFLICT, "Account already exists");
        }
        Ok(false) => (),
        Err(err) => {
            error!("Account lookup failed: {err}");
            return reply(StatusCode::INTERNAL_SERVER_ERROR, "Server error");
        }
    }

    if claim.password != claim.confirm_password {
        return reply(StatusCode::BAD_REQUEST, "Passwords do not match");
    }

    signup_reply(users::create(&pool, national_id, &claim.password).await)
}

/// Field-level checks, run before any store access. `None` means the claim
/// is well formed.
fn validate_claim(claim: &RegisterRequest) -> Option<Response> {
    if !valid_national_id(claim.national_id.trim()) {
        return Some(reply(StatusCode::BAD_REQUEST, "Invalid national id"));
    }
    if !valid_phone(claim.phone.trim()) {
        return Some(reply(StatusCode::BAD_REQUEST, "Invalid phone number"));
    }
    if claim.password.is_empty() || claim.confirm_password.is_empty() {
        return Some(reply(StatusCode::BAD_REQUEST, "All fields are required"));
    }
    None
}

/// Registry failures: absent citizen → 404, foreign phone → 403.
fn claim_rejection(err: &VerifyError) -> Response {
    match err {
        VerifyError::UnknownCitizen => reply(
            StatusCode::NOT_FOUND,
            "Citizen not found in the civil registry",
        ),
        VerifyError::PhoneMismatch => reply(
            StatusCode::FORBIDDEN,
            "This phone number is not registered in your name",
        ),
        VerifyError::Store(err) => {
            error!("Registry check failed: {err}");
            reply(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
        }
    }
}

fn signup_reply(outcome: anyhow::Result<SignupOutcome>) -> Response {
    match outcome {
        Ok(SignupOutcome::Created) => reply(
            StatusCode::OK,
            "Account created successfully, you can now sign in",
        ),
        // Concurrent registration for the same id loses the race here.
        Ok(SignupOutcome::Conflict) => reply(StatusCode::CONFLICT, "Account already exists"),
        Err(err) => {
            error!("Account creation failed: {err}");
            reply(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn lazy_pool() -> PgPool {
        // Never connects; the paths under test return before any query.
        PgPool::connect_lazy("postgres://postgres@localhost:5432/hawiya").expect("pool options")
    }

    fn claim(national_id: &str, phone: &str, password: &str, confirm: &str) -> RegisterRequest {
        RegisterRequest {
            national_id: national_id.to_string(),
            phone: phone.to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    #[tokio::test]
    async fn missing_body_is_a_400() {
        let response = register(Extension(lazy_pool()), None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_claims_are_rejected_before_any_lookup() {
        for request in [
            claim("12a45", "0991112233", "pass1", "pass1"),
            claim("123", "0991112233", "pass1", "pass1"),
            claim("12345", "099-111", "pass1", "pass1"),
            claim("12345", "0991112233", "", ""),
        ] {
            let response = register(Extension(lazy_pool()), Some(Json(request))).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn well_formed_claim_passes_validation() {
        assert!(validate_claim(&claim("12345", "0991112233", "pass1", "pass2")).is_none());
    }

    #[test]
    fn registry_rejections_map_to_404_403_500() {
        assert_eq!(
            claim_rejection(&VerifyError::UnknownCitizen).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            claim_rejection(&VerifyError::PhoneMismatch).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            claim_rejection(&VerifyError::Store(sqlx::Error::RowNotFound)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn signup_outcomes_map_to_200_409_500() {
        assert_eq!(
            signup_reply(Ok(SignupOutcome::Created)).status(),
            StatusCode::OK
        );
        assert_eq!(
            signup_reply(Ok(SignupOutcome::Conflict)).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            signup_reply(Err(anyhow!("boom"))).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
