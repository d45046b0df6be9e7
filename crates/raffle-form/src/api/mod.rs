//! HTTP API for the raffle form.

mod handlers;
mod middleware;
mod types;

pub use handlers::*;
pub use middleware::{logging_middleware, rate_limit_middleware, RateLimitState};
pub use types::*;

use crate::config::RaffleConfig;
use crate::form::FormController;
use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use secrecy::SecretString;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<FormController>,
    /// Raffle details shown to participants
    pub raffle: Arc<RaffleConfig>,
    /// Operator token for the registration listing
    pub admin_token: Option<SecretString>,
    /// Largest accepted request body
    pub upload_limit: usize,
}

impl AppState {
    pub fn new(controller: FormController, raffle: RaffleConfig) -> Self {
        Self {
            controller: Arc::new(controller),
            raffle: Arc::new(raffle),
            admin_token: None,
            upload_limit: 10 * 1024 * 1024,
        }
    }

    pub fn with_admin_token(mut self, token: Option<SecretString>) -> Self {
        self.admin_token = token;
        self
    }

    pub fn with_upload_limit(mut self, bytes: usize) -> Self {
        self.upload_limit = bytes;
        self
    }
}

/// Create the API router with the default rate limit.
pub fn create_router(state: AppState) -> Router {
    create_router_with_rate_limit(state, RateLimitState::new(60))
}

/// Create the API router with custom rate limiting.
pub fn create_router_with_rate_limit(state: AppState, rate_limit: RateLimitState) -> Router {
    let upload_limit = state.upload_limit;

    let limited = Router::new()
        .route("/v1/raffle", get(handlers::raffle_info))
        .route("/v1/numbers", get(handlers::list_numbers))
        .route(
            "/v1/registrations",
            post(handlers::submit_registration).get(handlers::list_registrations),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            rate_limit,
            rate_limit_middleware,
        ));

    Router::new()
        // Health check (no rate limiting)
        .route("/health", get(handlers::health))
        .merge(limited)
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
