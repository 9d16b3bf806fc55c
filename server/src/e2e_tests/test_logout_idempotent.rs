//! Logout always succeeds, no matter what was presented.

use crate::e2e_tests::helpers::{CLIENT_IP, TestApp};
use crate::store::RefreshTokenStore as _;
use crate::time::TimeSource as _;

#[test]
fn test_logout_revokes_and_repeats() {
    let app = TestApp::new();
    let registered = app
        .sessions
        .register("alice", "pw1", CLIENT_IP)
        .expect("registration succeeds");
    let token = registered.refresh_token.token.clone();

    app.sessions.logout(Some(&token), CLIENT_IP);
    let revoked = app.tokens.get_by_token(&token).expect("record kept");
    assert!(!revoked.is_active(app.clock.now()));
    // Logout is a revoke, not a rotation: no successor link.
    assert!(revoked.replaced_by_token.is_none());

    // Calling it again with the same, now-revoked token is the same
    // success; nothing panics and nothing changes shape.
    app.sessions.logout(Some(&token), CLIENT_IP);
    assert!(app.tokens.get_by_token(&token).expect("record kept").revoked.is_some());
}

#[test]
fn test_logout_with_no_or_unknown_token() {
    let app = TestApp::new();
    app.sessions.logout(None, CLIENT_IP);
    app.sessions.logout(Some(""), CLIENT_IP);
    app.sessions.logout(Some("deadbeefdeadbeefdeadbeefdeadbeef"), CLIENT_IP);
}

#[test]
fn test_logout_blocks_future_refresh() {
    let app = TestApp::new();
    let registered = app
        .sessions
        .register("alice", "pw1", CLIENT_IP)
        .expect("registration succeeds");

    app.sessions
        .logout(Some(&registered.refresh_token.token), CLIENT_IP);

    // The revoked token is now a reuse signal like any other.
    let result = app
        .sessions
        .refresh(Some(&registered.refresh_token.token), CLIENT_IP);
    assert!(result.is_err());
}
