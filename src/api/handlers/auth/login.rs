use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, instrument};

use crate::{
    api::handlers::reply,
    cli::globals::GlobalArgs,
    notify::OtpNotifier,
    otp,
    session::SessionIssuer,
    users::{self, AuthOutcome},
};

use super::types::{LoginRequest, LoginResponse};

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted, OTP sent", body = LoginResponse),
        (status = 400, description = "Missing fields"),
        (status = 401, description = "Wrong password"),
        (status = 404, description = "No account for this national id"),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn login(
    pool: Extension<PgPool>,
    issuer: Extension<Arc<SessionIssuer>>,
    notifier: Extension<Arc<dyn OtpNotifier>>,
    globals: Extension<GlobalArgs>,
    payload: Option<Json<LoginRequest>>,
) -> Response {
    let Some(Json(credentials)) = payload else {
        return reply(
            StatusCode::BAD_REQUEST,
            "National id and password are required",
        );
    };

    let national_id = credentials.national_id.trim();
    if national_id.is_empty() || credentials.password.is_empty() {
        return reply(
            StatusCode::BAD_REQUEST,
            "National id and password are required",
        );
    }

    match users::authenticate(&pool, national_id, &credentials.password).await {
        Ok(outcome) => {
            if let Some(response) = credential_rejection(&outcome) {
                return response;
            }
        }
        Err(err) => {
            error!("Credential check failed: {err}");
            return reply(StatusCode::INTERNAL_SERVER_ERROR, "Server error");
        }
    }

    let code = match otp::issue(&pool, national_id).await {
        Ok(code) => code,
        Err(err) => {
            error!("OTP issuance failed: {err}");
            return reply(StatusCode::INTERNAL_SERVER_ERROR, "Server error");
        }
    };

    // Delivery failures are logged, not fatal: the citizen can ask for a
    // resend once they hold the session token.
    if let Err(err) = notifier.deliver(national_id, &code) {
        error!("OTP delivery failed: {err}");
    }

    let token = match issuer.issue(national_id) {
        Ok(token) => token,
        Err(err) => {
            error!("Session issuance failed: {err}");
            return reply(StatusCode::INTERNAL_SERVER_ERROR, "Server error");
        }
    };

    let body = LoginResponse {
        message: "Signed in, a verification code has been sent".to_string(),
        token,
        otp: globals.expose_otp.then_some(code),
    };

    (StatusCode::OK, Json(body)).into_response()
}

/// Credential outcomes that end the login: unknown account → 404, wrong
/// password → 401. `None` lets the flow continue.
fn credential_rejection(outcome: &AuthOutcome) -> Option<Response> {
    match outcome {
        AuthOutcome::UnknownUser => Some(reply(StatusCode::NOT_FOUND, "Account not found")),
        AuthOutcome::BadPassword => Some(reply(StatusCode::UNAUTHORIZED, "Wrong password")),
        AuthOutcome::Ok => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::LogOtpNotifier;
    use secrecy::SecretString;

    fn lazy_pool() -> PgPool {
        PgPool::connect_lazy("postgres://postgres@localhost:5432/hawiya").expect("pool options")
    }

    fn fixture_extensions() -> (
        Extension<Arc<SessionIssuer>>,
        Extension<Arc<dyn OtpNotifier>>,
        Extension<GlobalArgs>,
    ) {
        let key = SecretString::from("fixture-signing-key");
        (
            Extension(Arc::new(SessionIssuer::new(&key))),
            Extension(Arc::new(LogOtpNotifier) as Arc<dyn OtpNotifier>),
            Extension(GlobalArgs::new(key)),
        )
    }

    #[tokio::test]
    async fn missing_body_is_a_400() {
        let (issuer, notifier, globals) = fixture_extensions();
        let response = login(Extension(lazy_pool()), issuer, notifier, globals, None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn blank_credentials_are_rejected_before_any_lookup() {
        for (national_id, password) in [("  ", "pass1"), ("12345", "")] {
            let (issuer, notifier, globals) = fixture_extensions();
            let request = LoginRequest {
                national_id: national_id.to_string(),
                password: password.to_string(),
            };
            let response = login(
                Extension(lazy_pool()),
                issuer,
                notifier,
                globals,
                Some(Json(request)),
            )
            .await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn credential_outcomes_map_to_404_401() {
        assert_eq!(
            credential_rejection(&AuthOutcome::UnknownUser).map(|r| r.status()),
            Some(StatusCode::NOT_FOUND)
        );
        assert_eq!(
            credential_rejection(&AuthOutcome::BadPassword).map(|r| r.status()),
            Some(StatusCode::UNAUTHORIZED)
        );
        assert!(credential_rejection(&AuthOutcome::Ok).is_none());
    }
}
