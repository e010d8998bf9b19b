//! HTTP surface: router, middleware stack and server startup. The handlers
//! are thin glue over [`AuthService`](crate::auth::AuthService); everything
//! interesting lives in the core.

use crate::{
    auth::{AuthConfig, AuthService, CredentialHasher, FixedWindowGuard, TokenSigner},
    cli::globals::GlobalArgs,
    store::PgDirectory,
};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    routing::{get, post},
    Extension, Router,
};
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod handlers;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::create::create,
        handlers::verify::verify,
        handlers::info::info,
        handlers::health::health,
    ),
    components(schemas(
        handlers::create::CreateRequest,
        handlers::create::CreateResponse,
        handlers::verify::VerifyRequest,
        handlers::verify::VerifyResponse,
        handlers::info::InfoResponse,
    )),
    tags(
        (name = "auth", description = "Credential issuance and verification"),
        (name = "health", description = "Service health")
    )
)]
struct ApiDoc;

/// Build the application router around an already-wired auth core.
#[must_use]
pub fn router(auth: Arc<AuthService>) -> Router {
    Router::new()
        .route("/api/auth/create", post(handlers::create))
        .route("/api/auth/verify", post(handlers::verify))
        .route("/api/auth/info", get(handlers::info))
        .route("/health", get(handlers::health))
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
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
                .layer(Extension(auth)),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, dsn: String, globals: &GlobalArgs, config: AuthConfig) -> Result<()> {
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    let signer = TokenSigner::new(&globals.token_secret, config.token_ttl_seconds());
    let guard = FixedWindowGuard::new(
        Duration::from_secs(config.rate_limit_window_seconds()),
        config.rate_limit_max_attempts(),
    );
    let auth = Arc::new(AuthService::new(
        Arc::new(PgDirectory::new(pool)),
        CredentialHasher::new(),
        signer,
        Arc::new(guard),
    ));

    let app = router(auth);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;
    info!(port, "listening");

    // ConnectInfo keeps the peer address available as the rate-limit key
    // when no proxy header is present.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map(MatchedPath::as_str);
    info_span!(
        "http.request",
        method = %request.method(),
        uri = %request.uri(),
        matched_path
    )
}
