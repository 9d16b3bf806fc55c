//! Storage contracts and in-memory adapters.
//!
//! Each entity type has a plain keyed-collection trait so a persistent
//! backing store is a drop-in replacement for the in-memory adapters used
//! here. Stores are constructed once in `main` and injected behind `Arc`;
//! they are never reachable as globals.
//!
//! # Invariants
//! - Every operation on a resource store is scoped by the owning user id.
//! - Stores enforce no uniqueness beyond their primary key; the session
//!   protocol checks username uniqueness before inserting (a documented
//!   caller responsibility, not an internal invariant of the store).

mod books;
mod quotes;
mod refresh_tokens;
mod users;

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub use books::InMemoryBookStore;
pub use quotes::InMemoryQuoteStore;
pub use refresh_tokens::InMemoryRefreshTokenStore;
pub use users::InMemoryUserStore;

use crate::model::{Book, BookDraft, Quote, QuoteDraft, RefreshToken, User};

/// Acquire a read guard, recovering from a poisoned lock.
///
/// Store data is plain keyed state; a panic in another request must not
/// take the collection down with it.
fn read_guard<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

/// Acquire a write guard, recovering from a poisoned lock.
fn write_guard<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// The user directory: identity records keyed by id and by username.
pub trait UserStore: Send + Sync {
    /// Look up a user by primary key.
    fn get_by_id(&self, id: Uuid) -> Option<User>;
    /// Look up a user by username (case-sensitive).
    fn get_by_username(&self, username: &str) -> Option<User>;
    /// All users in the directory.
    fn all(&self) -> Vec<User>;
    /// Insert a user. Duplicate-username checks are the caller's job.
    fn insert(&self, user: User);
    /// Remove a user by primary key. Removing an absent id is a no-op.
    fn remove(&self, id: Uuid);
}

/// The refresh-token ledger: rotation-chain records keyed by token string
/// and by owning user.
///
/// Records are kept after revocation so replayed strings can be
/// recognized as reuse.
pub trait RefreshTokenStore: Send + Sync {
    /// Look up a record by token string, regardless of state.
    fn get_by_token(&self, token: &str) -> Option<RefreshToken>;
    /// Look up a record by token string, only if active at `now`.
    fn get_active_by_token(&self, token: &str, now: DateTime<Utc>) -> Option<RefreshToken>;
    /// All records owned by the given user, in any state.
    fn get_by_user(&self, user_id: Uuid) -> Vec<RefreshToken>;
    /// Insert a new record.
    fn insert(&self, token: RefreshToken);
    /// Replace the record with the same token string, if present.
    fn update(&self, token: RefreshToken);
    /// Remove the record with the given token string, if present.
    fn remove_by_token(&self, token: &str);
    /// Remove every record owned by the given user.
    fn remove_all_for_user(&self, user_id: Uuid);
}

/// Per-user book collection. The store assigns ids on insert.
pub trait BookStore: Send + Sync {
    /// All books owned by the given user.
    fn list(&self, user_id: Uuid) -> Vec<Book>;
    /// One book by id, if owned by the given user.
    fn get(&self, user_id: Uuid, book_id: u64) -> Option<Book>;
    /// Add a book for the given user, assigning the next id.
    fn insert(&self, user_id: Uuid, draft: BookDraft) -> Book;
    /// Replace the book with the same id. Returns false if absent.
    fn update(&self, user_id: Uuid, book: Book) -> bool;
    /// Remove one book. Returns false if absent.
    fn remove(&self, user_id: Uuid, book_id: u64) -> bool;
    /// Remove every book owned by the given user.
    fn remove_all_for_user(&self, user_id: Uuid);
}

/// Per-user quote collection. The store assigns ids on insert.
pub trait QuoteStore: Send + Sync {
    /// All quotes owned by the given user.
    fn list(&self, user_id: Uuid) -> Vec<Quote>;
    /// One quote by id, if owned by the given user.
    fn get(&self, user_id: Uuid, quote_id: u64) -> Option<Quote>;
    /// Add a quote for the given user, assigning the next id.
    fn insert(&self, user_id: Uuid, draft: QuoteDraft) -> Quote;
    /// Replace the quote with the same id. Returns false if absent.
    fn update(&self, user_id: Uuid, quote: Quote) -> bool;
    /// Remove one quote. Returns false if absent.
    fn remove(&self, user_id: Uuid, quote_id: u64) -> bool;
    /// Remove every quote owned by the given user.
    fn remove_all_for_user(&self, user_id: Uuid);
}
