//! In-memory refresh-token ledger.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{RefreshTokenStore, read_guard, write_guard};
use crate::model::RefreshToken;

/// In-memory `RefreshTokenStore` keyed on the opaque token string.
///
/// Token strings are unique for their entire lifetime, so they double as
/// the primary key; revoked records stay in the map for reuse detection.
#[derive(Debug, Default)]
pub struct InMemoryRefreshTokenStore {
    tokens: RwLock<HashMap<String, RefreshToken>>,
}

impl InMemoryRefreshTokenStore {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RefreshTokenStore for InMemoryRefreshTokenStore {
    fn get_by_token(&self, token: &str) -> Option<RefreshToken> {
        read_guard(&self.tokens).get(token).cloned()
    }

    fn get_active_by_token(&self, token: &str, now: DateTime<Utc>) -> Option<RefreshToken> {
        read_guard(&self.tokens)
            .get(token)
            .filter(|t| t.is_active(now))
            .cloned()
    }

    fn get_by_user(&self, user_id: Uuid) -> Vec<RefreshToken> {
        read_guard(&self.tokens)
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect()
    }

    fn insert(&self, token: RefreshToken) {
        write_guard(&self.tokens).insert(token.token.clone(), token);
    }

    fn update(&self, token: RefreshToken) {
        let mut tokens = write_guard(&self.tokens);
        if tokens.contains_key(&token.token) {
            tokens.insert(token.token.clone(), token);
        }
    }

    fn remove_by_token(&self, token: &str) {
        write_guard(&self.tokens).remove(token);
    }

    fn remove_all_for_user(&self, user_id: Uuid) {
        write_guard(&self.tokens).retain(|_, t| t.user_id != user_id);
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn token_for(user_id: Uuid, token: &str, now: DateTime<Utc>) -> RefreshToken {
        RefreshToken {
            id: Uuid::new_v4(),
            user_id,
            token: token.to_string(),
            created: now,
            created_by_ip: "127.0.0.1".to_string(),
            expires: now + Duration::days(7),
            revoked: None,
            revoked_by_ip: None,
            replaced_by_token: None,
        }
    }

    #[test]
    fn test_insert_and_get_by_token() {
        let store = InMemoryRefreshTokenStore::new();
        let now = Utc::now();
        let user = Uuid::new_v4();
        store.insert(token_for(user, "tok-1", now));

        let found = store.get_by_token("tok-1").expect("token present");
        assert_eq!(found.user_id, user);
        assert!(store.get_by_token("tok-2").is_none());
    }

    #[test]
    fn test_active_lookup_filters_revoked_and_expired() {
        let store = InMemoryRefreshTokenStore::new();
        let now = Utc::now();
        let user = Uuid::new_v4();

        let mut revoked = token_for(user, "revoked", now);
        revoked.revoked = Some(now);
        store.insert(revoked);
        store.insert(token_for(user, "live", now));

        assert!(store.get_active_by_token("revoked", now).is_none());
        assert!(store.get_active_by_token("live", now).is_some());
        // The revoked record is still visible to the unfiltered lookup.
        assert!(store.get_by_token("revoked").is_some());
        // After expiry the live token stops being active but stays stored.
        let later = now + Duration::days(8);
        assert!(store.get_active_by_token("live", later).is_none());
        assert!(store.get_by_token("live").is_some());
    }

    #[test]
    fn test_get_by_user_returns_all_states() {
        let store = InMemoryRefreshTokenStore::new();
        let now = Utc::now();
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();

        let mut revoked = token_for(user, "old", now);
        revoked.revoked = Some(now);
        store.insert(revoked);
        store.insert(token_for(user, "new", now));
        store.insert(token_for(other, "other", now));

        let mine = store.get_by_user(user);
        assert_eq!(mine.len(), 2);
    }

    #[test]
    fn test_update_replaces_in_place() {
        let store = InMemoryRefreshTokenStore::new();
        let now = Utc::now();
        let user = Uuid::new_v4();
        store.insert(token_for(user, "tok-1", now));

        let mut updated = store.get_by_token("tok-1").expect("token present");
        updated.revoked = Some(now);
        updated.replaced_by_token = Some("tok-2".to_string());
        store.update(updated);

        let found = store.get_by_token("tok-1").expect("token present");
        assert!(found.revoked.is_some());
        assert_eq!(found.replaced_by_token.as_deref(), Some("tok-2"));
    }

    #[test]
    fn test_update_absent_is_noop() {
        let store = InMemoryRefreshTokenStore::new();
        let now = Utc::now();
        store.update(token_for(Uuid::new_v4(), "ghost", now));
        assert!(store.get_by_token("ghost").is_none());
    }

    #[test]
    fn test_remove_all_for_user() {
        let store = InMemoryRefreshTokenStore::new();
        let now = Utc::now();
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();
        store.insert(token_for(user, "a", now));
        store.insert(token_for(user, "b", now));
        store.insert(token_for(other, "c", now));

        store.remove_all_for_user(user);
        assert!(store.get_by_user(user).is_empty());
        assert_eq!(store.get_by_user(other).len(), 1);
    }

    #[test]
    fn test_remove_by_token() {
        let store = InMemoryRefreshTokenStore::new();
        let now = Utc::now();
        store.insert(token_for(Uuid::new_v4(), "a", now));
        store.remove_by_token("a");
        assert!(store.get_by_token("a").is_none());
    }
}
