//! Quote endpoints, scoped to the authenticated caller.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use super::{ApiError, AppState};
use crate::auth::token::AccessClaims;
use crate::model::{Quote, QuoteDraft};

/// `GET /quotes`
pub async fn list(State(state): State<AppState>, claims: AccessClaims) -> Json<Vec<Quote>> {
    Json(state.quotes.list(claims.subject))
}

/// `GET /quotes/{id}`
pub async fn get_one(
    State(state): State<AppState>,
    claims: AccessClaims,
    Path(id): Path<u64>,
) -> Result<Json<Quote>, ApiError> {
    state
        .quotes
        .get(claims.subject, id)
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// `POST /quotes`
pub async fn create(
    State(state): State<AppState>,
    claims: AccessClaims,
    Json(draft): Json<QuoteDraft>,
) -> (StatusCode, Json<Quote>) {
    let quote = state.quotes.insert(claims.subject, draft);
    tracing::debug!("user {} created quote {}", claims.subject, quote.id);
    (StatusCode::CREATED, Json(quote))
}

/// `DELETE /quotes/{id}`
pub async fn remove(
    State(state): State<AppState>,
    claims: AccessClaims,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    if state.quotes.remove(claims.subject, id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}
