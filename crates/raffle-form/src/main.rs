//! Raffle Form - Entry point.

use raffle_form::{
    api::{create_router_with_rate_limit, RateLimitState},
    build_state,
    config::{Config, LogConfig, LogFormat},
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_logging(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let registry = tracing_subscriber::registry().with(filter);

    match log.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config.log);

    info!(title = %config.raffle.title, "Starting raffle form");

    let state = match build_state(&config).await {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to initialize storage: {:#}", e);
            std::process::exit(1);
        }
    };

    let rate_limit = RateLimitState::new(config.rate_limit.global_per_minute);
    let app = create_router_with_rate_limit(state, rate_limit);

    let addr = SocketAddr::new(
        config
            .server
            .listen_addr
            .parse()
            .unwrap_or([0, 0, 0, 0].into()),
        config.server.port,
    );

    info!("Listening on {}", addr);

    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
