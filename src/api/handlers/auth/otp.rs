use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, error, instrument};

use crate::{
    api::handlers::reply,
    cli::globals::GlobalArgs,
    notify::OtpNotifier,
    otp::{self, OtpError},
    session::{SessionError, SessionIssuer},
};

use super::types::{ResendOtpRequest, ResendOtpResponse, VerifyOtpRequest, VerifyOtpResponse};

#[utoipa::path(
    post,
    path = "/auth/verify-otp",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Code accepted", body = VerifyOtpResponse),
        (status = 400, description = "Missing, unknown or expired code"),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn verify_otp(
    pool: Extension<PgPool>,
    payload: Option<Json<VerifyOtpRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return reply(StatusCode::BAD_REQUEST, "Verification code is required");
    };

    let code = request.otp.trim();
    if code.is_empty() {
        return reply(StatusCode::BAD_REQUEST, "Verification code is required");
    }

    match otp::verify(&pool, code).await {
        Ok(national_id) => {
            debug!("OTP verified");
            let body = VerifyOtpResponse {
                message: "Verification successful".to_string(),
                national_id,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => code_rejection(&err),
    }
}

/// Verification failures: unknown and stale codes are both client errors,
/// with distinct messages so the citizen knows whether to retype or resend.
fn code_rejection(err: &OtpError) -> Response {
    match err {
        OtpError::NotFound => reply(
            StatusCode::BAD_REQUEST,
            "Verification code is wrong or expired",
        ),
        OtpError::Expired => reply(
            StatusCode::BAD_REQUEST,
            "Verification code expired, please request a new one",
        ),
        OtpError::Store(err) => {
            error!("OTP verification failed: {err}");
            reply(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
        }
    }
}

#[utoipa::path(
    post,
    path = "/auth/resend-otp",
    request_body = ResendOtpRequest,
    responses(
        (status = 200, description = "Fresh code issued", body = ResendOtpResponse),
        (status = 400, description = "Missing session token"),
        (status = 401, description = "Invalid or expired session token"),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn resend_otp(
    pool: Extension<PgPool>,
    issuer: Extension<Arc<SessionIssuer>>,
    notifier: Extension<Arc<dyn OtpNotifier>>,
    globals: Extension<GlobalArgs>,
    payload: Option<Json<ResendOtpRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return reply(StatusCode::BAD_REQUEST, "Session token is required");
    };

    // A blank token is a missing token, not an invalid one.
    let token = request.token.trim();
    if token.is_empty() {
        return reply(StatusCode::BAD_REQUEST, "Session token is required");
    }

    let national_id = match issuer.validate(token) {
        Ok(national_id) => national_id,
        Err(SessionError::Expired) => {
            error!("Resend rejected: session token expired");
            return reply(StatusCode::UNAUTHORIZED, "Invalid session token");
        }
        Err(SessionError::Invalid) => {
            error!("Resend rejected: session token invalid");
            return reply(StatusCode::UNAUTHORIZED, "Invalid session token");
        }
    };

    let code = match otp::issue(&pool, &national_id).await {
        Ok(code) => code,
        Err(err) => {
            error!("OTP reissue failed: {err}");
            return reply(StatusCode::INTERNAL_SERVER_ERROR, "Server error");
        }
    };

    if let Err(err) = notifier.deliver(&national_id, &code) {
        error!("OTP delivery failed: {err}");
    }

    let body = ResendOtpResponse {
        message: "A new verification code has been sent".to_string(),
        otp: globals.expose_otp.then_some(code),
    };

    (StatusCode::OK, Json(body)).into_response()
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

    async fn resend_with_token(token: &str) -> Response {
        let (issuer, notifier, globals) = fixture_extensions();
        let request = ResendOtpRequest {
            token: token.to_string(),
        };
        resend_otp(
            Extension(lazy_pool()),
            issuer,
            notifier,
            globals,
            Some(Json(request)),
        )
        .await
    }

    #[tokio::test]
    async fn verify_requires_a_code() {
        let response = verify_otp(Extension(lazy_pool()), None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let request = VerifyOtpRequest {
            otp: "   ".to_string(),
        };
        let response = verify_otp(Extension(lazy_pool()), Some(Json(request))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn code_failures_map_to_400_400_500() {
        assert_eq!(
            code_rejection(&OtpError::NotFound).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            code_rejection(&OtpError::Expired).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            code_rejection(&OtpError::Store(sqlx::Error::RowNotFound)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn resend_treats_a_blank_token_as_missing() {
        let (issuer, notifier, globals) = fixture_extensions();
        let response = resend_otp(Extension(lazy_pool()), issuer, notifier, globals, None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        assert_eq!(
            resend_with_token("").await.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            resend_with_token("   ").await.status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn resend_rejects_a_garbage_token() {
        assert_eq!(
            resend_with_token("not-a-jwt").await.status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
