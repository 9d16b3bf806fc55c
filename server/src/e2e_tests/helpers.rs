//! Common helpers for end-to-end tests.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::auth::{Argon2Scheme, SessionService, TokenIssuer};
use crate::config::ServerConfig;
use crate::model::RefreshToken;
use crate::store::{
    InMemoryBookStore, InMemoryQuoteStore, InMemoryRefreshTokenStore, InMemoryUserStore,
    RefreshTokenStore as _,
};
use crate::time::{ManualTimeSource, TimeSource};

/// Network origin used by most test requests.
pub const CLIENT_IP: &str = "198.51.100.5";
/// A second origin, for requests that should look like another machine.
pub const ATTACKER_IP: &str = "203.0.113.66";

/// A fully wired in-process instance: session protocol, stores, and a
/// manually advanced clock.
pub struct TestApp {
    pub users: Arc<InMemoryUserStore>,
    pub tokens: Arc<InMemoryRefreshTokenStore>,
    pub books: Arc<InMemoryBookStore>,
    pub quotes: Arc<InMemoryQuoteStore>,
    pub clock: Arc<ManualTimeSource>,
    pub sessions: SessionService,
}

impl TestApp {
    /// Create a fresh instance with empty stores.
    #[must_use]
    pub fn new() -> Self {
        let config = ServerConfig {
            jwt_secret: "e2e-test-secret-key-that-is-long-enough".to_string(),
            jwt_issuer: "quill".to_string(),
            jwt_audience: "quill-clients".to_string(),
            access_token_minutes: 15,
            refresh_token_days: 7,
            allowed_origin: "http://localhost:4200".to_string(),
            listen_port: 3000,
        };

        let users = Arc::new(InMemoryUserStore::new());
        let tokens = Arc::new(InMemoryRefreshTokenStore::new());
        let clock = Arc::new(ManualTimeSource::new(Utc::now()));

        let clock_source: Arc<dyn TimeSource> = clock.clone();
        let issuer = TokenIssuer::new(&config, clock_source).expect("test config is valid");
        let sessions = SessionService::new(
            users.clone(),
            tokens.clone(),
            issuer,
            Arc::new(Argon2Scheme),
            clock.clone(),
        );

        Self {
            users,
            tokens,
            books: Arc::new(InMemoryBookStore::new()),
            quotes: Arc::new(InMemoryQuoteStore::new()),
            clock,
            sessions,
        }
    }

    /// All refresh tokens of the given user that are active right now.
    pub fn active_tokens(&self, user_id: Uuid) -> Vec<RefreshToken> {
        let now = self.clock.now();
        self.tokens
            .get_by_user(user_id)
            .into_iter()
            .filter(|t| t.is_active(now))
            .collect()
    }
}
