//! Router assembly.
//!
//! Shared by the binary and the integration tests so both serve exactly the
//! same stack.

use std::time::Duration;

use axum::{
    Router,
    http::{HeaderValue, Request, Response, header::CACHE_CONTROL},
    middleware::from_fn,
    routing::get,
};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeader;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::{
    create_session_layer, request_id_middleware, security_headers_middleware,
};
use crate::routes;
use crate::state::AppState;

/// Directory served under `/static`.
const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Content-hashed copies written by the build script.
const DERIVED_CSS_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static/css/derived");

/// Build the storefront router with all middleware applied.
///
/// Serve it with `into_make_service_with_connect_info::<SocketAddr>()`: the
/// rate limiters fall back to the peer address.
pub fn router(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .merge(routes::routes())
        .nest_service(
            "/static/css/derived",
            SetResponseHeader::overriding(
                ServeDir::new(DERIVED_CSS_DIR),
                CACHE_CONTROL,
                HeaderValue::from_static("public, max-age=31536000, immutable"),
            ),
        )
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(session_layer)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(|response: &Response<_>, latency: Duration, span: &Span| {
                    span.record("status", response.status().as_u16());
                    span.record(
                        "latency_ms",
                        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    );
                    DefaultOnResponse::default().on_response(response, latency, span);
                }),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// The storefront holds no local state, so being up is being ready.
async fn health() -> &'static str {
    "ok"
}
