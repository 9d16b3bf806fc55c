//! In-memory quote collection.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

use super::{QuoteStore, read_guard, write_guard};
use crate::model::{Quote, QuoteDraft};

/// In-memory `QuoteStore` keyed by owning user.
#[derive(Debug, Default)]
pub struct InMemoryQuoteStore {
    quotes: RwLock<HashMap<Uuid, Vec<Quote>>>,
    next_id: AtomicU64,
}

impl InMemoryQuoteStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl QuoteStore for InMemoryQuoteStore {
    fn list(&self, user_id: Uuid) -> Vec<Quote> {
        read_guard(&self.quotes)
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    fn get(&self, user_id: Uuid, quote_id: u64) -> Option<Quote> {
        read_guard(&self.quotes)
            .get(&user_id)
            .and_then(|quotes| quotes.iter().find(|q| q.id == quote_id))
            .cloned()
    }

    fn insert(&self, user_id: Uuid, draft: QuoteDraft) -> Quote {
        let quote = Quote {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            text: draft.text,
            book_id: draft.book_id,
        };
        write_guard(&self.quotes)
            .entry(user_id)
            .or_default()
            .push(quote.clone());
        quote
    }

    fn update(&self, user_id: Uuid, quote: Quote) -> bool {
        let mut quotes = write_guard(&self.quotes);
        let Some(owned) = quotes.get_mut(&user_id) else {
            return false;
        };
        match owned.iter_mut().find(|q| q.id == quote.id) {
            Some(slot) => {
                *slot = quote;
                true
            }
            None => false,
        }
    }

    fn remove(&self, user_id: Uuid, quote_id: u64) -> bool {
        let mut quotes = write_guard(&self.quotes);
        let Some(owned) = quotes.get_mut(&user_id) else {
            return false;
        };
        let before = owned.len();
        owned.retain(|q| q.id != quote_id);
        owned.len() != before
    }

    fn remove_all_for_user(&self, user_id: Uuid) {
        write_guard(&self.quotes).remove(&user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(text: &str) -> QuoteDraft {
        QuoteDraft {
            text: text.to_string(),
            book_id: 1,
        }
    }

    #[test]
    fn test_insert_and_list() {
        let store = InMemoryQuoteStore::new();
        let user = Uuid::new_v4();

        let quote = store.insert(user, draft("fear is the mind-killer"));
        assert_eq!(quote.book_id, 1);
        assert_eq!(store.list(user).len(), 1);
    }

    #[test]
    fn test_get_is_scoped_to_owner() {
        let store = InMemoryQuoteStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let quote = store.insert(alice, draft("a quote"));
        assert!(store.get(alice, quote.id).is_some());
        assert!(store.get(bob, quote.id).is_none());
    }

    #[test]
    fn test_update_in_place() {
        let store = InMemoryQuoteStore::new();
        let user = Uuid::new_v4();
        let mut quote = store.insert(user, draft("a quote"));

        quote.text = "a better quote".to_string();
        assert!(store.update(user, quote.clone()));
        let found = store.get(user, quote.id).expect("quote present");
        assert_eq!(found.text, "a better quote");
    }

    #[test]
    fn test_update_is_owner_scoped() {
        let store = InMemoryQuoteStore::new();
        let user = Uuid::new_v4();
        let quote = store.insert(user, draft("a quote"));

        assert!(!store.update(Uuid::new_v4(), quote.clone()));
        let ghost = Quote {
            id: quote.id + 100,
            ..quote
        };
        assert!(!store.update(user, ghost));
    }

    #[test]
    fn test_remove() {
        let store = InMemoryQuoteStore::new();
        let user = Uuid::new_v4();
        let quote = store.insert(user, draft("a quote"));

        assert!(store.remove(user, quote.id));
        assert!(!store.remove(user, quote.id));
    }

    #[test]
    fn test_remove_all_for_user() {
        let store = InMemoryQuoteStore::new();
        let user = Uuid::new_v4();
        store.insert(user, draft("one"));
        store.insert(user, draft("two"));

        store.remove_all_for_user(user);
        assert!(store.list(user).is_empty());
    }
}
