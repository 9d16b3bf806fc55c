//! In-memory user directory.

use std::collections::HashMap;
use std::sync::RwLock;

use uuid::Uuid;

use super::{UserStore, read_guard, write_guard};
use crate::model::User;

/// In-memory `UserStore` backed by a map keyed on user id.
///
/// Username lookups scan the map; the directory is small and the scan
/// keeps the store free of a second index to maintain.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserStore {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStore for InMemoryUserStore {
    fn get_by_id(&self, id: Uuid) -> Option<User> {
        read_guard(&self.users).get(&id).cloned()
    }

    fn get_by_username(&self, username: &str) -> Option<User> {
        read_guard(&self.users)
            .values()
            .find(|u| u.username == username)
            .cloned()
    }

    fn all(&self) -> Vec<User> {
        read_guard(&self.users).values().cloned().collect()
    }

    fn insert(&self, user: User) {
        write_guard(&self.users).insert(user.id, user);
    }

    fn remove(&self, id: Uuid) {
        write_guard(&self.users).remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(username: &str) -> User {
        User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: "$argon2id$...".to_string(),
        }
    }

    #[test]
    fn test_insert_and_get_by_id() {
        let store = InMemoryUserStore::new();
        let alice = user("alice");
        store.insert(alice.clone());

        let found = store.get_by_id(alice.id).expect("user present");
        assert_eq!(found.username, "alice");
    }

    #[test]
    fn test_get_by_username_is_case_sensitive() {
        let store = InMemoryUserStore::new();
        store.insert(user("alice"));

        assert!(store.get_by_username("alice").is_some());
        assert!(store.get_by_username("Alice").is_none());
    }

    #[test]
    fn test_remove() {
        let store = InMemoryUserStore::new();
        let alice = user("alice");
        store.insert(alice.clone());
        store.remove(alice.id);

        assert!(store.get_by_id(alice.id).is_none());
        assert!(store.all().is_empty());
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let store = InMemoryUserStore::new();
        store.insert(user("alice"));
        store.remove(Uuid::new_v4());
        assert_eq!(store.all().len(), 1);
    }
}
