//! Rate limiting middleware.
//!
//! Runs before every handler. The client key is the TCP peer's IP address;
//! `X-Forwarded-For` and friends are ignored, since any client can set them.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderName, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::observability::metrics;
use crate::security::rate_limit::{Decision, RateLimiter};

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Rate limit key for a connection.
pub fn client_key(addr: &SocketAddr) -> String {
    addr.ip().to_string()
}

pub async fn rate_limit_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(limiter): State<Arc<RateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let key = client_key(&addr);
    let decision = limiter.admit(&key);

    let mut response = if decision.allowed {
        next.run(request).await
    } else {
        tracing::warn!(
            client = %key,
            retry_after_secs = decision.retry_after_secs(),
            "Rate limit exceeded"
        );
        metrics::record_rate_limited();
        too_many_requests(&decision)
    };

    metrics::record_request(response.status().as_u16(), start);
    insert_limit_headers(response.headers_mut(), &decision);
    response
}

fn too_many_requests(decision: &Decision) -> Response {
    let wait = decision.retry_after_secs();
    let body = serde_json::json!({
        "error": "Too many requests",
        "message": format!("Rate limit exceeded. Please try again in {wait} seconds."),
    });

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    let reset = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
        + wait;
    let headers = response.headers_mut();
    headers.insert(X_RATELIMIT_RESET, HeaderValue::from(reset));
    headers.insert(axum::http::header::RETRY_AFTER, HeaderValue::from(wait));
    response
}

fn insert_limit_headers(headers: &mut HeaderMap, decision: &Decision) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
}
