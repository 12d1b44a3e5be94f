use crate::{
    cli::globals::GlobalArgs,
    notify::{LogOtpNotifier, OtpNotifier},
    session::SessionIssuer,
};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Request,
    },
    routing::{get, post},
    Extension, Router,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

pub(crate) mod handlers;

use handlers::{auth, documents, export, health};

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::auth::register::register,
        handlers::auth::login::login,
        handlers::auth::otp::verify_otp,
        handlers::auth::otp::resend_otp,
        handlers::documents::person_card,
        handlers::documents::driving_license,
        handlers::documents::passport,
        handlers::documents::citizen_cards,
        handlers::documents::citizen_documents,
        handlers::export::person_card_pdf,
        handlers::export::generate_qr,
    ),
    components(schemas(
        handlers::health::Health,
        handlers::auth::types::RegisterRequest,
        handlers::auth::types::LoginRequest,
        handlers::auth::types::LoginResponse,
        handlers::auth::types::VerifyOtpRequest,
        handlers::auth::types::VerifyOtpResponse,
        handlers::auth::types::ResendOtpRequest,
        handlers::auth::types::ResendOtpResponse,
        crate::documents::PersonCard,
        crate::documents::DrivingLicense,
        crate::documents::Passport,
        crate::documents::CitizenDocument,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "hawiya", description = "Citizen identity and document lookup API")
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

/// Build the application router. One authoritative handler per route.
fn app_router() -> Router {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/verify-otp", post(auth::verify_otp))
        .route("/auth/resend-otp", post(auth::resend_otp))
        .route("/person-card", get(documents::person_card))
        .route("/driving-license", get(documents::driving_license))
        .route("/passport", get(documents::passport))
        .route("/citizen/cards", get(documents::citizen_cards))
        .route("/citizen/documents", get(documents::citizen_documents))
        .route("/export/person-card/pdf", get(export::person_card_pdf))
        .route("/generate-qr", get(export::generate_qr))
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, dsn: String, globals: GlobalArgs) -> Result<()> {
    // Connect to database. The acquire timeout bounds every store call so no
    // request blocks indefinitely on a stuck pool.
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .acquire_timeout(Duration::from_secs(5))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    // Signing key is injected here once; nothing else reads it.
    let issuer = Arc::new(SessionIssuer::new(&globals.jwt_secret));
    let notifier: Arc<dyn OtpNotifier> = Arc::new(LogOtpNotifier);

    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(Any);

    let app = app_router()
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(issuer))
                .layer(Extension(notifier))
                .layer(Extension(globals))
                .layer(Extension(pool.clone())),
        )
        .route("/health", get(health::health).options(health::health))
        .layer(Extension(pool));

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
