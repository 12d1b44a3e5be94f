//! Protected document reads.
//!
//! Every handler goes through `require_identity` and reads rows for the
//! authenticated national id only; the id in the token is the sole lookup
//! key, nothing is taken from the query string.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{Map, Value};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, instrument};

use crate::{
    api::handlers::{reply, request_base_url, require_identity},
    documents::{
        self, DocumentKind, ImageField, CITIZEN_DOCUMENT_IMAGES, DRIVING_LICENSE_IMAGES,
        PASSPORT_IMAGES, PERSON_CARD_IMAGES,
    },
    session::SessionIssuer,
};

#[utoipa::path(
    get,
    path = "/person-card",
    responses(
        (status = 200, description = "Person card with image URLs"),
        (status = 400, description = "Missing session token"),
        (status = 401, description = "Invalid or expired session token"),
        (status = 404, description = "No person card on record"),
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
#[instrument(skip_all)]
pub async fn person_card(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    issuer: Extension<Arc<SessionIssuer>>,
) -> Response {
    let national_id = match require_identity(&headers, &issuer) {
        Ok(national_id) => national_id,
        Err(response) => return response,
    };

    let result = documents::person_card(&pool, &national_id).await;
    lookup_reply(
        &headers,
        result,
        "card",
        "Your person card",
        "No identity record was found",
        PERSON_CARD_IMAGES,
    )
}

#[utoipa::path(
    get,
    path = "/driving-license",
    responses(
        (status = 200, description = "Driving license with image URLs"),
        (status = 400, description = "Missing session token"),
        (status = 401, description = "Invalid or expired session token"),
        (status = 404, description = "No driving license on record"),
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
#[instrument(skip_all)]
pub async fn driving_license(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    issuer: Extension<Arc<SessionIssuer>>,
) -> Response {
    let national_id = match require_identity(&headers, &issuer) {
        Ok(national_id) => national_id,
        Err(response) => return response,
    };

    let result = documents::driving_license(&pool, &national_id).await;
    lookup_reply(
        &headers,
        result,
        "license",
        "Your driving license",
        "No license record was found",
        DRIVING_LICENSE_IMAGES,
    )
}

#[utoipa::path(
    get,
    path = "/passport",
    responses(
        (status = 200, description = "Passport record"),
        (status = 400, description = "Missing session token"),
        (status = 401, description = "Invalid or expired session token"),
        (status = 404, description = "No passport on record"),
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
#[instrument(skip_all)]
pub async fn passport(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    issuer: Extension<Arc<SessionIssuer>>,
) -> Response {
    let national_id = match require_identity(&headers, &issuer) {
        Ok(national_id) => national_id,
        Err(response) => return response,
    };

    let result = documents::passport(&pool, &national_id).await;
    lookup_reply(
        &headers,
        result,
        "passport",
        "Your passport",
        "No passport record was found",
        PASSPORT_IMAGES,
    )
}

#[utoipa::path(
    get,
    path = "/citizen/cards",
    responses(
        (status = 200, description = "All card-type documents for the citizen"),
        (status = 400, description = "Missing session token"),
        (status = 401, description = "Invalid or expired session token"),
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
#[instrument(skip_all)]
pub async fn citizen_cards(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    issuer: Extension<Arc<SessionIssuer>>,
) -> Response {
    citizen_document_list(&headers, &pool, &issuer, DocumentKind::Card, "cards").await
}

#[utoipa::path(
    get,
    path = "/citizen/documents",
    responses(
        (status = 200, description = "All generic documents for the citizen"),
        (status = 400, description = "Missing session token"),
        (status = 401, description = "Invalid or expired session token"),
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
#[instrument(skip_all)]
pub async fn citizen_documents(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    issuer: Extension<Arc<SessionIssuer>>,
) -> Response {
    citizen_document_list(&headers, &pool, &issuer, DocumentKind::Document, "documents").await
}

async fn citizen_document_list(
    headers: &HeaderMap,
    pool: &PgPool,
    issuer: &SessionIssuer,
    kind: DocumentKind,
    list_key: &str,
) -> Response {
    let national_id = match require_identity(headers, issuer) {
        Ok(national_id) => national_id,
        Err(response) => return response,
    };

    let rows = match documents::citizen_documents(pool, &national_id, kind).await {
        Ok(rows) => rows,
        Err(err) => {
            error!("Citizen document lookup failed: {err}");
            return reply(StatusCode::INTERNAL_SERVER_ERROR, "Server error");
        }
    };

    let base_url = request_base_url(headers);
    let mut mapped = Vec::with_capacity(rows.len());
    for row in &rows {
        match documents::with_image_urls(row, CITIZEN_DOCUMENT_IMAGES, &base_url) {
            Ok(value) => mapped.push(value),
            Err(err) => {
                error!("Image URL mapping failed: {err}");
                return reply(StatusCode::INTERNAL_SERVER_ERROR, "Server error");
            }
        }
    }

    let mut body = Map::new();
    body.insert(
        "message".to_string(),
        Value::String("Documents retrieved".to_string()),
    );
    body.insert(list_key.to_string(), Value::Array(mapped));

    (StatusCode::OK, Json(Value::Object(body))).into_response()
}

/// Map a single-row lookup to its reply: found → 200 with the record (image
/// URLs added) under `body_key`, absent → 404, store failure → 500.
fn lookup_reply<T: serde::Serialize>(
    headers: &HeaderMap,
    result: Result<Option<T>, sqlx::Error>,
    body_key: &str,
    message: &str,
    missing: &str,
    images: &[ImageField],
) -> Response {
    match result {
        Ok(Some(record)) => {
            let base_url = request_base_url(headers);
            match documents::with_image_urls(&record, images, &base_url) {
                Ok(value) => {
                    let mut body = Map::new();
                    body.insert("message".to_string(), Value::String(message.to_string()));
                    body.insert(body_key.to_string(), value);
                    (StatusCode::OK, Json(Value::Object(body))).into_response()
                }
                Err(err) => {
                    error!("Image URL mapping failed: {err}");
                    reply(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
                }
            }
        }
        Ok(None) => reply(StatusCode::NOT_FOUND, missing),
        Err(err) => {
            error!("Document lookup failed: {err}");
            reply(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
        }
    }
}
