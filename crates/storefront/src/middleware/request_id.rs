//! Request correlation ids.
//!
//! Every request carries an `x-request-id`. A value set by an upstream proxy
//! is kept when it looks sane; otherwise a UUID v4 is minted. The id ends up
//! on the `http_request` span, as a Sentry tag, in the request extensions and
//! echoed on the response.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest upstream id we accept.
const MAX_UPSTREAM_LEN: usize = 128;

/// The id assigned to the current request, available as an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Reuse the upstream id if it is short printable ASCII.
fn upstream_id(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(REQUEST_ID_HEADER)?.to_str().ok()?.trim();
    let acceptable = !value.is_empty()
        && value.len() <= MAX_UPSTREAM_LEN
        && value.bytes().all(|b| b.is_ascii_graphic());
    acceptable.then(|| value.to_string())
}

/// Assign a request id and propagate it to logs, Sentry and the response.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let id = upstream_id(request.headers()).unwrap_or_else(|| Uuid::new_v4().to_string());

    Span::current().record("request_id", id.as_str());
    sentry::configure_scope(|scope| scope.set_tag("request_id", &id));
    request.extensions_mut().insert(RequestId(id.clone()));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{Router, body::Body, http::Request, middleware, routing::get};
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(middleware::from_fn(request_id_middleware))
    }

    #[tokio::test]
    async fn test_generates_id_when_missing() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let id = response.headers().get(REQUEST_ID_HEADER).unwrap();
        assert!(Uuid::parse_str(id.to_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_keeps_upstream_id() {
        let request = Request::builder()
            .uri("/")
            .header(REQUEST_ID_HEADER, "cf-ray-1234")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();

        assert_eq!(
            response.headers().get(REQUEST_ID_HEADER).unwrap(),
            "cf-ray-1234"
        );
    }

    #[test]
    fn test_rejects_oversized_upstream_id() {
        let mut headers = HeaderMap::new();
        headers.insert(
            REQUEST_ID_HEADER,
            HeaderValue::from_str(&"a".repeat(MAX_UPSTREAM_LEN + 1)).unwrap(),
        );
        assert_eq!(upstream_id(&headers), None);

        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("abc 123"));
        assert_eq!(upstream_id(&headers), None);
    }
}
