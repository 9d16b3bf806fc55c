//! Domain records shared across the auth core and the resource stores.
//!
//! # Invariants
//! - `User::password_hash` is always a PHC hash string, never a clear
//!   password.
//! - `RefreshToken::token` strings are unique across the ledger for their
//!   entire lifetime.
//! - Revoked refresh tokens keep their revocation timestamp, origin, and
//!   (when rotated) successor reference for audit and reuse detection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account.
///
/// Created at registration and never mutated afterwards. The password is
/// stored only as a hash produced by the configured credential scheme.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    /// Unique, case-sensitive.
    pub username: String,
    /// PHC string produced by `auth::password::CredentialScheme::hash`.
    pub password_hash: String,
}

/// The public view of a user returned by auth endpoints.
///
/// Deliberately excludes the credential hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

/// One node in a user's refresh-token rotation chain.
///
/// Records are mutated only to set the revocation fields or the successor
/// reference; they are never deleted in normal operation so that replayed
/// token strings can still be recognized.
#[derive(Debug, Clone)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Opaque random token string; 32 lowercase hex characters.
    pub token: String,
    pub created: DateTime<Utc>,
    /// Network origin of the request that created this token.
    pub created_by_ip: String,
    pub expires: DateTime<Utc>,
    pub revoked: Option<DateTime<Utc>>,
    pub revoked_by_ip: Option<String>,
    /// Token string of the successor, set when this token was rotated.
    pub replaced_by_token: Option<String>,
}

impl RefreshToken {
    /// A token is active while it has not been revoked and has not expired.
    ///
    /// Expiry is checked lazily at use time; there is no background sweep.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.revoked.is_none() && self.expires >= now
    }
}

/// A book owned by a single user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: u64,
    pub title: String,
    pub author: String,
    pub date_published: Option<DateTime<Utc>>,
}

/// Fields a caller supplies when creating a book; the store assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub date_published: Option<DateTime<Utc>>,
}

/// A quote owned by a single user, referencing one of their books.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: u64,
    pub text: String,
    pub book_id: u64,
}

/// Fields a caller supplies when creating a quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteDraft {
    pub text: String,
    pub book_id: u64,
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn sample_token(now: DateTime<Utc>) -> RefreshToken {
        RefreshToken {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            token: "0123456789abcdef0123456789abcdef".to_string(),
            created: now,
            created_by_ip: "127.0.0.1".to_string(),
            expires: now + Duration::days(7),
            revoked: None,
            revoked_by_ip: None,
            replaced_by_token: None,
        }
    }

    #[test]
    fn test_fresh_token_is_active() {
        let now = Utc::now();
        let token = sample_token(now);
        assert!(token.is_active(now));
    }

    #[test]
    fn test_revoked_token_is_inactive() {
        let now = Utc::now();
        let mut token = sample_token(now);
        token.revoked = Some(now);
        assert!(!token.is_active(now));
    }

    #[test]
    fn test_expired_token_is_inactive() {
        let now = Utc::now();
        let token = sample_token(now);
        assert!(!token.is_active(now + Duration::days(8)));
    }

    #[test]
    fn test_token_active_at_exact_expiry() {
        // `expires >= now`: the boundary instant still counts as active.
        let now = Utc::now();
        let token = sample_token(now);
        assert!(token.is_active(token.expires));
        assert!(!token.is_active(token.expires + Duration::seconds(1)));
    }

    #[test]
    fn test_public_user_excludes_credential() {
        let user = User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            password_hash: "$argon2id$...".to_string(),
        };
        let public = PublicUser::from(&user);
        assert_eq!(public.id, user.id);
        assert_eq!(public.username, "alice");
    }

    #[test]
    fn test_book_serializes_camel_case() {
        let book = Book {
            id: 1,
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            date_published: None,
        };
        let json = serde_json::to_value(&book).expect("book serializes");
        assert!(json.get("datePublished").is_some());
        assert!(json.get("date_published").is_none());
    }

    #[test]
    fn test_quote_draft_deserializes_camel_case() {
        let draft: QuoteDraft =
            serde_json::from_str(r#"{"text":"Fear is the mind-killer.","bookId":1}"#)
                .expect("quote draft parses");
        assert_eq!(draft.book_id, 1);
    }
}
