#![cfg_attr(test, allow(clippy::disallowed_methods))]
// Forbid unwrap() in production code to prevent panics from corrupt data.
// Test code is allowed to use unwrap() for convenience.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use server::api::{self, AppState};
use server::auth::{Argon2Scheme, SessionService, TokenIssuer};
use server::config::ServerConfig;
use server::store::{
    InMemoryBookStore, InMemoryQuoteStore, InMemoryRefreshTokenStore, InMemoryUserStore,
};
use server::time::SystemTimeSource;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "server=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment variables
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Loaded configuration: issuer={}, audience={}, access_token_minutes={}, refresh_token_days={}, listen_port={}",
        config.jwt_issuer,
        config.jwt_audience,
        config.access_token_minutes,
        config.refresh_token_days,
        config.listen_port
    );

    // The CORS layer needs the allowed origin as a header value; a value
    // that cannot be one is a configuration error.
    let allowed_origin = match config.allowed_origin.parse::<HeaderValue>() {
        Ok(origin) => origin,
        Err(e) => {
            tracing::error!("Invalid QUILL_ALLOWED_ORIGIN '{}': {e}", config.allowed_origin);
            std::process::exit(1);
        }
    };

    // A missing or empty signing secret is fatal at startup, never a
    // per-request condition.
    let clock = Arc::new(SystemTimeSource);
    let issuer = match TokenIssuer::new(&config, clock.clone()) {
        Ok(issuer) => issuer,
        Err(e) => {
            tracing::error!("Failed to build token issuer: {e}");
            std::process::exit(1);
        }
    };

    // Stores are constructed once here and injected; nothing in the crate
    // reaches them as globals.
    let sessions = Arc::new(SessionService::new(
        Arc::new(InMemoryUserStore::new()),
        Arc::new(InMemoryRefreshTokenStore::new()),
        issuer,
        Arc::new(Argon2Scheme),
        clock,
    ));

    let state = AppState {
        sessions,
        books: Arc::new(InMemoryBookStore::new()),
        quotes: Arc::new(InMemoryQuoteStore::new()),
    };

    let app = api::router(state, allowed_origin);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.listen_port));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to bind: {e}");
            std::process::exit(1);
        });

    // ConnectInfo feeds each session call the caller's network origin.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap_or_else(|e| {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    });
}
