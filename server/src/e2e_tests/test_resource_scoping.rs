//! Per-user scoping: one user's resources read as absent to another.

use crate::e2e_tests::helpers::{CLIENT_IP, TestApp};
use crate::model::{BookDraft, QuoteDraft};
use crate::store::{BookStore as _, QuoteStore as _};

#[test]
fn test_books_invisible_across_users() {
    let app = TestApp::new();
    let alice = app
        .sessions
        .register("alice", "pw1", CLIENT_IP)
        .expect("alice registers");
    let bob = app
        .sessions
        .register("bob", "pw2", CLIENT_IP)
        .expect("bob registers");

    // Create a book while authenticated as alice, the way a handler
    // does: the verified claim subject is the owner key.
    let claims = app
        .sessions
        .verify_access(&alice.access_token)
        .expect("alice's token verifies");
    let book = app.books.insert(
        claims.subject,
        BookDraft {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            date_published: None,
        },
    );

    // Authenticated as bob, the same id reads as absent (a handler turns
    // this into 404, not an empty-but-confirming response).
    let bob_claims = app
        .sessions
        .verify_access(&bob.access_token)
        .expect("bob's token verifies");
    assert!(app.books.get(bob_claims.subject, book.id).is_none());
    assert!(app.books.list(bob_claims.subject).is_empty());

    // The owner still sees it.
    assert_eq!(
        app.books.get(claims.subject, book.id).map(|b| b.title),
        Some("Dune".to_string())
    );
}

#[test]
fn test_quotes_invisible_across_users() {
    let app = TestApp::new();
    let alice = app
        .sessions
        .register("alice", "pw1", CLIENT_IP)
        .expect("alice registers");
    let bob = app
        .sessions
        .register("bob", "pw2", CLIENT_IP)
        .expect("bob registers");

    let quote = app.quotes.insert(
        alice.user.id,
        QuoteDraft {
            text: "Fear is the mind-killer.".to_string(),
            book_id: 1,
        },
    );

    assert!(app.quotes.get(bob.user.id, quote.id).is_none());
    assert!(!app.quotes.remove(bob.user.id, quote.id));
    // Bob's failed delete did not touch alice's quote.
    assert!(app.quotes.get(alice.user.id, quote.id).is_some());
}

#[test]
fn test_update_is_owner_scoped() {
    let app = TestApp::new();
    let alice = app
        .sessions
        .register("alice", "pw1", CLIENT_IP)
        .expect("alice registers");
    let bob = app
        .sessions
        .register("bob", "pw2", CLIENT_IP)
        .expect("bob registers");

    let mut book = app.books.insert(
        alice.user.id,
        BookDraft {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            date_published: None,
        },
    );

    book.title = "Hijacked".to_string();
    assert!(!app.books.update(bob.user.id, book.clone()));
    assert_eq!(
        app.books.get(alice.user.id, book.id).map(|b| b.title),
        Some("Dune".to_string())
    );
}
