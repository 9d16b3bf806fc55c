//! The session protocol: register, login, refresh, logout.
//!
//! Each refresh token is a node in a per-user rotation chain; at most one
//! chain tip is active at a time. Refresh rotates the tip (revoking the
//! predecessor and linking its successor), login starts a new chain after
//! revoking the old one, and presenting a token that was once valid but is
//! no longer active is treated as a theft signal that revokes the owner's
//! entire lineage.
//!
//! # Invariants
//! - A username maps to at most one user (checked here before insert; the
//!   directory itself does not enforce it).
//! - In normal operation a user has at most one active refresh token.
//! - A revoked token always records how it was revoked: a successor
//!   reference when rotated, a bare revocation timestamp otherwise.

use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

use crate::model::{PublicUser, RefreshToken, User};
use crate::store::{RefreshTokenStore, UserStore};
use crate::time::TimeSource;

use super::password::{CredentialScheme, PasswordError};
use super::token::{AccessClaims, TokenError, TokenIssuer};

/// Error returned when a session operation fails.
///
/// All failures are terminal for the request; clients re-enter via login
/// or refresh.
#[derive(Debug)]
pub enum AuthError {
    /// The username is already registered.
    UsernameTaken,
    /// Unknown username or wrong password.
    InvalidCredentials,
    /// No refresh token was presented.
    MissingRefreshToken,
    /// The presented refresh token is unknown, revoked, or expired.
    RefreshTokenRejected,
    /// The user behind the refresh token no longer exists.
    UnknownUser,
    /// Token issuance failed.
    Token(TokenError),
    /// Credential hashing failed.
    Credential(PasswordError),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UsernameTaken => write!(f, "username already exists"),
            Self::InvalidCredentials => write!(f, "invalid credentials"),
            Self::MissingRefreshToken => write!(f, "refresh token not found"),
            Self::RefreshTokenRejected => write!(f, "invalid or expired refresh token"),
            Self::UnknownUser => write!(f, "user associated with refresh token not found"),
            Self::Token(e) => write!(f, "token error: {e}"),
            Self::Credential(e) => write!(f, "credential error: {e}"),
        }
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Token(e) => Some(e),
            Self::Credential(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        Self::Token(e)
    }
}

impl From<PasswordError> for AuthError {
    fn from(e: PasswordError) -> Self {
        Self::Credential(e)
    }
}

/// The result of a successful register, login, or refresh.
///
/// The refresh token is handed back so the transport layer can set it as
/// an out-of-band credential (cookie); it never appears in response bodies.
#[derive(Debug)]
pub struct AuthSuccess {
    pub access_token: String,
    pub user: PublicUser,
    pub refresh_token: RefreshToken,
}

/// Orchestrates the session protocol over the directory, the ledger, and
/// the token issuer.
///
/// A single coarse mutex serializes every ledger-mutating operation:
/// two requests racing to rotate the same refresh token must not both
/// succeed (at most one active successor per predecessor). All work under
/// the gate is synchronous in-memory lookups, so the critical section is
/// short.
pub struct SessionService {
    users: Arc<dyn UserStore>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    issuer: TokenIssuer,
    credentials: Arc<dyn CredentialScheme>,
    clock: Arc<dyn TimeSource>,
    gate: Mutex<()>,
}

impl SessionService {
    /// Wire the protocol to its collaborators.
    pub fn new(
        users: Arc<dyn UserStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        issuer: TokenIssuer,
        credentials: Arc<dyn CredentialScheme>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            issuer,
            credentials,
            clock,
            gate: Mutex::new(()),
        }
    }

    /// Register a new account and start its first session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UsernameTaken` if the username is already
    /// present, or a `Token`/`Credential` error if issuance or hashing
    /// fails.
    pub fn register(
        &self,
        username: &str,
        password: &str,
        origin_ip: &str,
    ) -> Result<AuthSuccess, AuthError> {
        let _gate = self.lock_gate();

        if self.users.get_by_username(username).is_some() {
            return Err(AuthError::UsernameTaken);
        }

        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: self.credentials.hash(password)?,
        };
        self.users.insert(user.clone());
        tracing::info!("registered user '{}' ({})", user.username, user.id);

        self.start_session(&user, origin_ip)
    }

    /// Authenticate with a username and password.
    ///
    /// Revokes every refresh token the user still has active before
    /// issuing new credentials, so a fresh login always starts a fresh
    /// chain.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` on an unknown username or a
    /// password mismatch; the two cases are indistinguishable to callers.
    pub fn login(
        &self,
        username: &str,
        password: &str,
        origin_ip: &str,
    ) -> Result<AuthSuccess, AuthError> {
        let _gate = self.lock_gate();

        let Some(user) = self.users.get_by_username(username) else {
            return Err(AuthError::InvalidCredentials);
        };
        if !self.credentials.verify(&user.password_hash, password) {
            return Err(AuthError::InvalidCredentials);
        }

        let now = self.clock.now();
        let mut revoked = 0usize;
        for mut token in self.refresh_tokens.get_by_user(user.id) {
            if token.is_active(now) {
                token.revoked = Some(now);
                token.revoked_by_ip = Some(origin_ip.to_string());
                self.refresh_tokens.update(token);
                revoked += 1;
            }
        }
        if revoked > 0 {
            tracing::debug!(
                "login revoked {revoked} active refresh token(s) for user {}",
                user.id
            );
        }

        self.start_session(&user, origin_ip)
    }

    /// Exchange a refresh token for new credentials, rotating the chain.
    ///
    /// An inactive-but-known token is a reuse signal: the entire lineage
    /// of its owner is revoked before the call fails.
    ///
    /// # Errors
    ///
    /// Returns `MissingRefreshToken` when nothing was presented,
    /// `RefreshTokenRejected` for unknown/revoked/expired tokens, and
    /// `UnknownUser` when the owning user no longer exists.
    pub fn refresh(
        &self,
        presented: Option<&str>,
        origin_ip: &str,
    ) -> Result<AuthSuccess, AuthError> {
        let _gate = self.lock_gate();

        let token_string = match presented {
            Some(s) if !s.is_empty() => s,
            _ => return Err(AuthError::MissingRefreshToken),
        };

        let now = self.clock.now();
        let Some(current) = self.refresh_tokens.get_active_by_token(token_string, now) else {
            // Not active. If the string was ever valid, someone is replaying
            // an old token: revoke the owner's entire lineage.
            if let Some(stale) = self.refresh_tokens.get_by_token(token_string) {
                for mut token in self.refresh_tokens.get_by_user(stale.user_id) {
                    token.revoked = Some(now);
                    token.revoked_by_ip = Some(origin_ip.to_string());
                    self.refresh_tokens.update(token);
                }
                tracing::warn!(
                    "refresh token reuse detected for user {}; all tokens revoked",
                    stale.user_id
                );
            }
            return Err(AuthError::RefreshTokenRejected);
        };

        let Some(user) = self.users.get_by_id(current.user_id) else {
            return Err(AuthError::UnknownUser);
        };

        let access_token = self.issuer.issue_access_token(&user)?;
        let next = self.issuer.issue_refresh_token(&user, origin_ip);

        let mut rotated = current;
        rotated.revoked = Some(now);
        rotated.revoked_by_ip = Some(origin_ip.to_string());
        rotated.replaced_by_token = Some(next.token.clone());
        self.refresh_tokens.update(rotated);
        self.refresh_tokens.insert(next.clone());

        Ok(AuthSuccess {
            access_token,
            user: PublicUser::from(&user),
            refresh_token: next,
        })
    }

    /// Revoke the presented refresh token, if any.
    ///
    /// Never fails and is idempotent: logging out with an absent, unknown,
    /// or already-revoked token succeeds the same way. The transport layer
    /// clears the credential cookie regardless.
    pub fn logout(&self, presented: Option<&str>, origin_ip: &str) {
        let _gate = self.lock_gate();

        let Some(token_string) = presented.filter(|s| !s.is_empty()) else {
            return;
        };
        if let Some(mut token) = self.refresh_tokens.get_by_token(token_string) {
            token.revoked = Some(self.clock.now());
            token.revoked_by_ip = Some(origin_ip.to_string());
            let user_id = token.user_id;
            self.refresh_tokens.update(token);
            tracing::debug!("refresh token for user {user_id} revoked on logout");
        }
    }

    /// Verify an access token and return its identity claims.
    ///
    /// # Errors
    ///
    /// Returns `TokenError` if verification fails for any reason.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        self.issuer.verify_access_token(token)
    }

    /// Issue a fresh access + refresh token pair and persist the refresh
    /// token. Shared tail of register and login.
    fn start_session(&self, user: &User, origin_ip: &str) -> Result<AuthSuccess, AuthError> {
        let access_token = self.issuer.issue_access_token(user)?;
        let refresh_token = self.issuer.issue_refresh_token(user, origin_ip);
        self.refresh_tokens.insert(refresh_token.clone());

        Ok(AuthSuccess {
            access_token,
            user: PublicUser::from(user),
            refresh_token,
        })
    }

    fn lock_gate(&self) -> std::sync::MutexGuard<'_, ()> {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
