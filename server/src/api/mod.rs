//! HTTP layer: routing, state, error mapping, and credential transport.
//!
//! Handlers stay thin: they translate HTTP to session-protocol or store
//! calls and map the error taxonomy onto status codes. Identity enters a
//! resource handler only as verified `AccessClaims`, extracted once from
//! the `Authorization` header; the refresh token travels only in an
//! HTTP-only cookie and never appears in a response body.

pub mod auth;
pub mod books;
pub mod quotes;

use std::sync::Arc;

use axum::Router;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::SessionService;
use crate::auth::session::AuthError;
use crate::auth::token::AccessClaims;
use crate::model::RefreshToken;
use crate::store::{BookStore, QuoteStore};

/// Cookie carrying the refresh token.
const REFRESH_COOKIE: &str = "refreshToken";

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionService>,
    pub books: Arc<dyn BookStore>,
    pub quotes: Arc<dyn QuoteStore>,
}

/// JSON body used for every failure message.
#[derive(Debug, Serialize)]
struct MessageBody {
    message: String,
}

/// HTTP-facing error taxonomy.
///
/// Ownership mismatches surface as `NotFound`, never Forbidden, so a
/// caller cannot confirm the existence of another user's resource.
#[derive(Debug)]
pub enum ApiError {
    /// 401 with a client-facing message.
    Unauthorized(String),
    /// 409 with a client-facing message.
    Conflict(String),
    /// 404 with an empty body.
    NotFound,
    /// 500; the reason is logged, not sent.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized(message) => {
                (StatusCode::UNAUTHORIZED, axum::Json(MessageBody { message })).into_response()
            }
            Self::Conflict(message) => {
                (StatusCode::CONFLICT, axum::Json(MessageBody { message })).into_response()
            }
            Self::NotFound => StatusCode::NOT_FOUND.into_response(),
            Self::Internal(reason) => {
                tracing::error!("internal error: {reason}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    axum::Json(MessageBody {
                        message: "Internal server error.".to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::UsernameTaken => Self::Conflict("Username already exists.".to_string()),
            AuthError::InvalidCredentials => Self::Unauthorized("Invalid credentials.".to_string()),
            AuthError::MissingRefreshToken => {
                Self::Unauthorized("Refresh token not found.".to_string())
            }
            AuthError::RefreshTokenRejected => {
                Self::Unauthorized("Invalid or expired refresh token.".to_string())
            }
            AuthError::UnknownUser => {
                Self::Unauthorized("User associated with refresh token not found.".to_string())
            }
            AuthError::Token(e) => Self::Internal(e.to_string()),
            AuthError::Credential(e) => Self::Internal(e.to_string()),
        }
    }
}

/// Extracts verified identity claims from the `Authorization` header.
///
/// This is the single token-verification step; handlers taking
/// `AccessClaims` never see the raw token.
impl FromRequestParts<AppState> for AccessClaims {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let bearer = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        let Some(token) = bearer else {
            return Err(ApiError::Unauthorized("Missing access token.".to_string()));
        };

        state.sessions.verify_access(token).map_err(|e| {
            tracing::debug!("access token rejected: {e}");
            ApiError::Unauthorized("Invalid or expired access token.".to_string())
        })
    }
}

/// Extract a cookie value from request headers.
fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie = headers.get(header::COOKIE)?;
    let s = cookie.to_str().ok()?;
    for part in s.split(';') {
        let p = part.trim();
        if let Some(eq) = p.find('=') {
            let (k, v) = p.split_at(eq);
            if k == name {
                return Some(v[1..].to_string());
            }
        }
    }
    None
}

/// The refresh token presented by this request, if any.
fn presented_refresh_token(headers: &HeaderMap) -> Option<String> {
    parse_cookie(headers, REFRESH_COOKIE)
}

/// Set the refresh token as an HTTP-only cookie expiring with the record.
///
/// SameSite=None + Secure because the browser client is a cross-site
/// caller.
fn set_refresh_cookie(headers: &mut HeaderMap, token: &RefreshToken) {
    let expires = token.expires.format("%a, %d %b %Y %H:%M:%S GMT");
    let value = format!(
        "{REFRESH_COOKIE}={}; Expires={expires}; HttpOnly; Secure; SameSite=None; Path=/",
        token.token
    );
    // Hex token + formatted date: always a valid header value.
    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(header::SET_COOKIE, value);
    }
}

/// Expire the refresh cookie client-side.
fn clear_refresh_cookie(headers: &mut HeaderMap) {
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_static(
            "refreshToken=; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly; Secure; SameSite=None; Path=/",
        ),
    );
}

/// Mount all routes and middleware onto a router.
///
/// `allowed_origin` is the single cross-origin caller allowed to send
/// credentials; any method and the auth/content-type headers are allowed
/// for it.
pub fn router(state: AppState, allowed_origin: HeaderValue) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allowed_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh-token", post(auth::refresh_token))
        .route("/auth/logout", post(auth::logout))
        .route("/books", get(books::list).post(books::create))
        .route(
            "/books/{id}",
            get(books::get_one).put(books::update).delete(books::remove),
        )
        .route("/quotes", get(quotes::list).post(quotes::create))
        .route("/quotes/{id}", get(quotes::get_one).delete(quotes::remove))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use super::*;

    #[test]
    fn test_parse_cookie_finds_named_value() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("other=1; refreshToken=abc123; theme=dark"),
        );
        assert_eq!(
            presented_refresh_token(&headers).as_deref(),
            Some("abc123")
        );
    }

    #[test]
    fn test_parse_cookie_missing() {
        let headers = HeaderMap::new();
        assert!(presented_refresh_token(&headers).is_none());

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark"));
        assert!(presented_refresh_token(&headers).is_none());
    }

    #[test]
    fn test_set_refresh_cookie_attributes() {
        let token = RefreshToken {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            token: "0123456789abcdef0123456789abcdef".to_string(),
            created: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single().expect("valid date"),
            created_by_ip: "127.0.0.1".to_string(),
            expires: Utc.with_ymd_and_hms(2024, 5, 8, 12, 0, 0).single().expect("valid date"),
            revoked: None,
            revoked_by_ip: None,
            replaced_by_token: None,
        };

        let mut headers = HeaderMap::new();
        set_refresh_cookie(&mut headers, &token);

        let value = headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .expect("cookie set");
        assert!(value.starts_with("refreshToken=0123456789abcdef0123456789abcdef;"));
        assert!(value.contains("Expires=Wed, 08 May 2024 12:00:00 GMT"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("Secure"));
        assert!(value.contains("SameSite=None"));
    }

    #[test]
    fn test_clear_refresh_cookie_expires_in_the_past() {
        let mut headers = HeaderMap::new();
        clear_refresh_cookie(&mut headers);

        let value = headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .expect("cookie set");
        assert!(value.starts_with("refreshToken=;"));
        assert!(value.contains("Expires=Thu, 01 Jan 1970 00:00:00 GMT"));
    }

    #[test]
    fn test_api_error_status_codes() {
        let unauthorized = ApiError::Unauthorized("Invalid credentials.".to_string());
        assert_eq!(
            unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );

        let conflict = ApiError::Conflict("Username already exists.".to_string());
        assert_eq!(conflict.into_response().status(), StatusCode::CONFLICT);

        assert_eq!(
            ApiError::NotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_auth_error_maps_to_original_messages() {
        let conflict = ApiError::from(AuthError::UsernameTaken);
        assert!(
            matches!(conflict, ApiError::Conflict(ref m) if m == "Username already exists.")
        );

        let missing = ApiError::from(AuthError::MissingRefreshToken);
        assert!(
            matches!(missing, ApiError::Unauthorized(ref m) if m == "Refresh token not found.")
        );

        let rejected = ApiError::from(AuthError::RefreshTokenRejected);
        assert!(matches!(
            rejected,
            ApiError::Unauthorized(ref m) if m == "Invalid or expired refresh token."
        ));

        let unknown = ApiError::from(AuthError::UnknownUser);
        assert!(matches!(
            unknown,
            ApiError::Unauthorized(ref m) if m == "User associated with refresh token not found."
        ));
    }
}
