//! Access-token claims stay tied to the resolved user across every flow.

use crate::e2e_tests::helpers::{CLIENT_IP, TestApp};

#[test]
fn test_subject_claim_matches_user_across_flows() {
    let app = TestApp::new();

    let registered = app
        .sessions
        .register("alice", "pw1", CLIENT_IP)
        .expect("registration succeeds");
    let claims = app
        .sessions
        .verify_access(&registered.access_token)
        .expect("registration token verifies");
    assert_eq!(claims.subject, registered.user.id);
    assert_eq!(claims.name, "alice");

    let logged_in = app
        .sessions
        .login("alice", "pw1", CLIENT_IP)
        .expect("login succeeds");
    let claims = app
        .sessions
        .verify_access(&logged_in.access_token)
        .expect("login token verifies");
    assert_eq!(claims.subject, registered.user.id);

    let refreshed = app
        .sessions
        .refresh(Some(&logged_in.refresh_token.token), CLIENT_IP)
        .expect("refresh succeeds");
    let claims = app
        .sessions
        .verify_access(&refreshed.access_token)
        .expect("refreshed token verifies");
    assert_eq!(claims.subject, registered.user.id);
}

#[test]
fn test_tampered_access_token_rejected() {
    let app = TestApp::new();
    let registered = app
        .sessions
        .register("alice", "pw1", CLIENT_IP)
        .expect("registration succeeds");

    // Flip the signature tail; the claims no longer verify.
    let mut tampered = registered.access_token.clone();
    let replacement = if tampered.ends_with('A') { "B" } else { "A" };
    tampered.truncate(tampered.len() - 1);
    tampered.push_str(replacement);

    assert!(app.sessions.verify_access(&tampered).is_err());
}

#[test]
fn test_refresh_token_never_verifies_as_access_token() {
    let app = TestApp::new();
    let registered = app
        .sessions
        .register("alice", "pw1", CLIENT_IP)
        .expect("registration succeeds");

    // The opaque refresh string is not a signed token at all.
    assert!(
        app.sessions
            .verify_access(&registered.refresh_token.token)
            .is_err()
    );
}
