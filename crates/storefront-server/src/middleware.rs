use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{
        header::{AUTHORIZATION, COOKIE},
        HeaderValue, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use storefront_core::auth::{verify_token, Identity};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Name of the HTTP-only cookie carrying the signed credential.
pub const AUTH_COOKIE: &str = "auth_token";

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// The caller resolved for this request, stored as a request extension.
///
/// `None` means anonymous; resolution never rejects a request. Each
/// endpoint decides what its own authorization policy is.
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Option<Identity>);

/// Token-verification settings used by the identity middleware.
#[derive(Debug, Clone)]
pub struct IdentityState {
    jwt_secret: Arc<String>,
}

impl IdentityState {
    #[must_use]
    pub fn new(jwt_secret: &str) -> Self {
        Self {
            jwt_secret: Arc::new(jwt_secret.to_owned()),
        }
    }
}

#[derive(Debug, Clone)]
struct RateLimitWindow {
    started_at: Instant,
    count: usize,
}

/// Sliding fixed-window limiter for simple API protection.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    state: Arc<Mutex<RateLimitWindow>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Arc::new(Mutex::new(RateLimitWindow {
                started_at: Instant::now(),
                count: 0,
            })),
        }
    }
}

#[derive(Debug, Serialize)]
struct MiddlewareErrorBody {
    error: MiddlewareError,
}

#[derive(Debug, Serialize)]
struct MiddlewareError {
    code: &'static str,
    message: &'static str,
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware resolving the caller identity from the signed credential.
///
/// The `auth_token` cookie is tried first, then an `Authorization: Bearer`
/// header. A missing, malformed, or expired credential resolves to an
/// anonymous [`CurrentIdentity`] — authorization failures surface later,
/// at the endpoints that require a role.
pub async fn resolve_identity(
    State(identity): State<IdentityState>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = extract_cookie_token(req.headers().get(COOKIE))
        .or_else(|| extract_bearer_token(req.headers().get(AUTHORIZATION)));
    let resolved = token.and_then(|t| verify_token(&identity.jwt_secret, t));

    req.extensions_mut().insert(CurrentIdentity(resolved));
    next.run(req).await
}

/// Middleware enforcing a fixed request-per-window limit.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let mut window = rate_limit.state.lock().await;
    let elapsed = window.started_at.elapsed();

    if elapsed >= rate_limit.window {
        window.started_at = Instant::now();
        window.count = 0;
    }

    if window.count >= rate_limit.max_requests {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(MiddlewareErrorBody {
                error: MiddlewareError {
                    code: "rate_limited",
                    message: "rate limit exceeded",
                },
            }),
        )
            .into_response();
    }

    window.count += 1;
    drop(window);

    next.run(req).await
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|s| !s.trim().is_empty())
}

fn extract_cookie_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|raw| {
            raw.split(';')
                .map(str::trim)
                .find_map(|pair| pair.strip_prefix("auth_token="))
        })
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_bearer_token_accepts_valid_header() {
        let header = HeaderValue::from_static("Bearer test-token");
        assert_eq!(extract_bearer_token(Some(&header)), Some("test-token"));
    }

    #[test]
    fn extract_bearer_token_rejects_non_bearer_header() {
        let header = HeaderValue::from_static("Basic abc123");
        assert_eq!(extract_bearer_token(Some(&header)), None);
    }

    #[test]
    fn extract_cookie_token_finds_auth_cookie() {
        let header = HeaderValue::from_static("theme=dark; auth_token=abc.def.ghi; lang=en");
        assert_eq!(extract_cookie_token(Some(&header)), Some("abc.def.ghi"));
    }

    #[test]
    fn extract_cookie_token_ignores_other_cookies() {
        let header = HeaderValue::from_static("theme=dark; lang=en");
        assert_eq!(extract_cookie_token(Some(&header)), None);
    }

    #[test]
    fn extract_cookie_token_rejects_empty_value() {
        let header = HeaderValue::from_static("auth_token=");
        assert_eq!(extract_cookie_token(Some(&header)), None);
    }
}
