//! Auth endpoints: register, login, refresh, logout.

use std::net::SocketAddr;

use axum::Json;
use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState, clear_refresh_cookie, presented_refresh_token, set_refresh_cookie};
use crate::auth::session::AuthSuccess;
use crate::model::PublicUser;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Body returned by every successful auth call.
///
/// The refresh token is deliberately absent; it travels only in the
/// cookie.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
struct LogoutResponse {
    message: &'static str,
}

/// Build the success response: JSON body plus the refresh cookie.
fn auth_response(success: AuthSuccess) -> (HeaderMap, Json<AuthResponse>) {
    let mut headers = HeaderMap::new();
    set_refresh_cookie(&mut headers, &success.refresh_token);
    (
        headers,
        Json(AuthResponse {
            access_token: success.access_token,
            user: success.user,
        }),
    )
}

/// `POST /auth/register`
pub async fn register(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let success =
        state
            .sessions
            .register(&request.username, &request.password, &addr.ip().to_string())?;
    Ok(auth_response(success))
}

/// `POST /auth/login`
pub async fn login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let success = state
        .sessions
        .login(&request.username, &request.password, &addr.ip().to_string())?;
    Ok(auth_response(success))
}

/// `POST /auth/refresh-token`
///
/// The refresh token arrives in the cookie, never in the body.
pub async fn refresh_token(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let presented = presented_refresh_token(&headers);
    let success = state
        .sessions
        .refresh(presented.as_deref(), &addr.ip().to_string())?;
    Ok(auth_response(success))
}

/// `POST /auth/logout`
///
/// Always succeeds and always expires the cookie, even when no valid
/// token was presented.
pub async fn logout(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let presented = presented_refresh_token(&headers);
    state
        .sessions
        .logout(presented.as_deref(), &addr.ip().to_string());

    let mut response_headers = HeaderMap::new();
    clear_refresh_cookie(&mut response_headers);
    (
        response_headers,
        Json(LogoutResponse {
            message: "Logged out successfully!",
        }),
    )
}
