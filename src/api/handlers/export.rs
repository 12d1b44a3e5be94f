//! PDF and QR exports of the authenticated citizen's identity.

use axum::{
    extract::Extension,
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        HeaderMap, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, instrument};

use crate::{
    api::handlers::{reply, require_identity},
    documents,
    render::{pdf, qr},
    session::SessionIssuer,
};

#[utoipa::path(
    get,
    path = "/export/person-card/pdf",
    responses(
        (status = 200, description = "Person card as a downloadable PDF", content_type = "application/pdf"),
        (status = 400, description = "Missing session token"),
        (status = 401, description = "Invalid or expired session token"),
        (status = 404, description = "No person card on record"),
    ),
    security(("bearer" = [])),
    tag = "export"
)]
#[instrument(skip_all)]
pub async fn person_card_pdf(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    issuer: Extension<Arc<SessionIssuer>>,
) -> Response {
    let national_id = match require_identity(&headers, &issuer) {
        Ok(national_id) => national_id,
        Err(response) => return response,
    };

    let card = match documents::person_card(&pool, &national_id).await {
        Ok(Some(card)) => card,
        Ok(None) => return reply(StatusCode::NOT_FOUND, "No identity record was found"),
        Err(err) => {
            error!("Person card lookup failed: {err}");
            return reply(StatusCode::INTERNAL_SERVER_ERROR, "Server error");
        }
    };

    let bytes = match pdf::person_card_pdf(&card) {
        Ok(bytes) => bytes,
        Err(err) => {
            error!("PDF rendering failed: {err}");
            return reply(StatusCode::INTERNAL_SERVER_ERROR, "Failed to build PDF");
        }
    };

    let disposition = format!(
        "attachment; filename=\"person_card_{}.pdf\"",
        card.national_id
    );

    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, "application/pdf".to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response()
}

#[utoipa::path(
    get,
    path = "/generate-qr",
    responses(
        (status = 200, description = "Identity QR as a base64 data URL"),
        (status = 400, description = "Missing session token"),
        (status = 401, description = "Invalid or expired session token"),
    ),
    security(("bearer" = [])),
    tag = "export"
)]
#[instrument(skip_all)]
pub async fn generate_qr(headers: HeaderMap, issuer: Extension<Arc<SessionIssuer>>) -> Response {
    let national_id = match require_identity(&headers, &issuer) {
        Ok(national_id) => national_id,
        Err(response) => return response,
    };

    match qr::identity_qr_data_url(&national_id) {
        Ok(data_url) => {
            (StatusCode::OK, Json(json!({ "qrCode": data_url }))).into_response()
        }
        Err(err) => {
            error!("QR rendering failed: {err}");
            reply(StatusCode::INTERNAL_SERVER_ERROR, "Failed to build QR code")
        }
    }
}
