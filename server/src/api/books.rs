//! Book endpoints, scoped to the authenticated caller.
//!
//! Every handler receives verified `AccessClaims`; the claim subject is
//! the only owner key ever passed to the store, so one user's ids are
//! invisible to another (missing and unowned both read as 404).

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use super::{ApiError, AppState};
use crate::auth::token::AccessClaims;
use crate::model::{Book, BookDraft};

/// `GET /books`
pub async fn list(State(state): State<AppState>, claims: AccessClaims) -> Json<Vec<Book>> {
    Json(state.books.list(claims.subject))
}

/// `GET /books/{id}`
pub async fn get_one(
    State(state): State<AppState>,
    claims: AccessClaims,
    Path(id): Path<u64>,
) -> Result<Json<Book>, ApiError> {
    state
        .books
        .get(claims.subject, id)
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// `POST /books`
pub async fn create(
    State(state): State<AppState>,
    claims: AccessClaims,
    Json(draft): Json<BookDraft>,
) -> (StatusCode, Json<Book>) {
    let book = state.books.insert(claims.subject, draft);
    tracing::debug!("user {} created book {}", claims.subject, book.id);
    (StatusCode::CREATED, Json(book))
}

/// `PUT /books/{id}`
///
/// Only title and author are editable; the publication date is fixed at
/// creation.
pub async fn update(
    State(state): State<AppState>,
    claims: AccessClaims,
    Path(id): Path<u64>,
    Json(changes): Json<BookDraft>,
) -> Result<StatusCode, ApiError> {
    let Some(mut book) = state.books.get(claims.subject, id) else {
        return Err(ApiError::NotFound);
    };
    book.title = changes.title;
    book.author = changes.author;
    state.books.update(claims.subject, book);
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /books/{id}`
pub async fn remove(
    State(state): State<AppState>,
    claims: AccessClaims,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    if state.books.remove(claims.subject, id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}
