//! Rate limiting and request logging middleware.

use crate::error::FormError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{num::NonZeroU32, sync::Arc, time::Instant};
use tracing::{debug, warn};

/// Global rate limiter (not keyed by IP).
pub type GlobalLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Rate limiter state shared across requests.
#[derive(Clone)]
pub struct RateLimitState {
    pub global: Arc<GlobalLimiter>,
}

impl RateLimitState {
    /// Allow `requests_per_minute` requests across all clients. Zero is treated as one.
    pub fn new(requests_per_minute: u32) -> Self {
        let per_minute = NonZeroU32::new(requests_per_minute.max(1)).unwrap_or(NonZeroU32::MIN);

        Self {
            global: Arc::new(RateLimiter::direct(Quota::per_minute(per_minute))),
        }
    }

    /// Create a permissive rate limiter for testing.
    pub fn permissive() -> Self {
        Self::new(10_000)
    }
}

/// Reject the request with 429 once the global quota is spent.
pub async fn rate_limit_middleware(
    State(rate_limit): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Result<Response, FormError> {
    if rate_limit.global.check().is_err() {
        warn!(uri = %request.uri(), "Global rate limit exceeded");
        return Err(FormError::RateLimitExceeded);
    }

    Ok(next.run(request).await)
}

/// Logging middleware for requests.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    if status.is_server_error() {
        warn!(%method, %uri, %status, ?duration, "Request failed");
    } else if status.is_client_error() {
        debug!(%method, %uri, %status, ?duration, "Request rejected");
    } else {
        debug!(%method, %uri, %status, ?duration, "Request completed");
    }

    response
}
