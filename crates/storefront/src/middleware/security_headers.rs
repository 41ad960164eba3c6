//! Security headers for every response.
//!
//! Checkout pages carry customer and payment data: they are never cached and
//! never framed. Content-hashed stylesheets under `/static/css/derived/` are
//! the one exception to the no-cache rule.

use axum::{
    extract::Request,
    http::{
        HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

/// Pages are server-rendered forms with no scripts. Catalog images come from
/// the commerce platform's CDN. The only cross-origin navigation is the
/// redirect to Google sign-in, which `form-action` does not cover.
const CONTENT_SECURITY: &str = "default-src 'none'; \
     style-src 'self'; \
     img-src 'self' https: data:; \
     font-src 'self'; \
     connect-src 'self'; \
     object-src 'none'; \
     base-uri 'self'; \
     form-action 'self'; \
     frame-ancestors 'none'";

/// Browser features a checkout never needs.
const PERMISSIONS: &str = "camera=(), microphone=(), geolocation=(), usb=(), \
     payment=(), interest-cohort=(), browsing-topics=()";

const NO_STORE: &str = "no-store, max-age=0";
const IMMUTABLE: &str = "public, max-age=31536000, immutable";

/// Headers set on every response, regardless of path.
const COMMON: [(&str, &str); 4] = [
    ("cross-origin-opener-policy", "same-origin"),
    // CDN images do not send CORP headers
    ("cross-origin-embedder-policy", "credentialless"),
    ("cross-origin-resource-policy", "same-origin"),
    ("x-dns-prefetch-control", "off"),
];

/// Cache policy for a request path.
fn cache_policy(path: &str) -> &'static str {
    if path.starts_with("/static/css/derived/") {
        IMMUTABLE
    } else {
        NO_STORE
    }
}

/// Add security and cache headers to the response.
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let cache = cache_policy(request.uri().path());
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    headers.insert(
        CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(CONTENT_SECURITY),
    );
    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(PERMISSIONS),
    );
    headers.insert(CACHE_CONTROL, HeaderValue::from_static(cache));

    for (name, value) in COMMON {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
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
            .route("/carrinho", get(|| async { "ok" }))
            .route("/static/css/derived/main.abcd1234.css", get(|| async { "" }))
            .layer(middleware::from_fn(security_headers_middleware))
    }

    async fn get_headers(uri: &str) -> axum::http::HeaderMap {
        app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .headers()
            .clone()
    }

    #[tokio::test]
    async fn test_pages_are_not_cached_or_framed() {
        let headers = get_headers("/carrinho").await;
        assert_eq!(headers.get(X_FRAME_OPTIONS).unwrap(), "DENY");
        assert_eq!(headers.get(CACHE_CONTROL).unwrap(), NO_STORE);
        assert_eq!(
            headers.get("cross-origin-embedder-policy").unwrap(),
            "credentialless"
        );
        let csp = headers.get(CONTENT_SECURITY_POLICY).unwrap().to_str().unwrap();
        assert!(csp.contains("img-src 'self' https: data:"));
        assert!(csp.contains("frame-ancestors 'none'"));
    }

    #[tokio::test]
    async fn test_hashed_stylesheets_are_immutable() {
        let headers = get_headers("/static/css/derived/main.abcd1234.css").await;
        assert_eq!(headers.get(CACHE_CONTROL).unwrap(), IMMUTABLE);
        assert_eq!(headers.get(X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
    }
}
