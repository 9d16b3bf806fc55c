//! In-memory book collection.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

use super::{BookStore, read_guard, write_guard};
use crate::model::{Book, BookDraft};

/// In-memory `BookStore` keyed by owning user.
///
/// Ids come from a store-wide counter, so they are unique across users;
/// ownership scoping happens on lookup, not in the id space.
#[derive(Debug, Default)]
pub struct InMemoryBookStore {
    books: RwLock<HashMap<Uuid, Vec<Book>>>,
    next_id: AtomicU64,
}

impl InMemoryBookStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl BookStore for InMemoryBookStore {
    fn list(&self, user_id: Uuid) -> Vec<Book> {
        read_guard(&self.books)
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    fn get(&self, user_id: Uuid, book_id: u64) -> Option<Book> {
        read_guard(&self.books)
            .get(&user_id)
            .and_then(|books| books.iter().find(|b| b.id == book_id))
            .cloned()
    }

    fn insert(&self, user_id: Uuid, draft: BookDraft) -> Book {
        let book = Book {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            title: draft.title,
            author: draft.author,
            date_published: draft.date_published,
        };
        write_guard(&self.books)
            .entry(user_id)
            .or_default()
            .push(book.clone());
        book
    }

    fn update(&self, user_id: Uuid, book: Book) -> bool {
        let mut books = write_guard(&self.books);
        let Some(owned) = books.get_mut(&user_id) else {
            return false;
        };
        match owned.iter_mut().find(|b| b.id == book.id) {
            Some(slot) => {
                *slot = book;
                true
            }
            None => false,
        }
    }

    fn remove(&self, user_id: Uuid, book_id: u64) -> bool {
        let mut books = write_guard(&self.books);
        let Some(owned) = books.get_mut(&user_id) else {
            return false;
        };
        let before = owned.len();
        owned.retain(|b| b.id != book_id);
        owned.len() != before
    }

    fn remove_all_for_user(&self, user_id: Uuid) {
        write_guard(&self.books).remove(&user_id);
    }
}
