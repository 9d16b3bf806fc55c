//! Registration conflicts and the login-revokes-registration-chain rule.

use axum::http::StatusCode;
use axum::response::IntoResponse as _;

use crate::api::ApiError;
use crate::auth::session::AuthError;
use crate::e2e_tests::helpers::{CLIENT_IP, TestApp};
use crate::store::{RefreshTokenStore as _, UserStore as _};
use crate::time::TimeSource as _;

#[test]
fn test_register_then_duplicate_then_login() {
    let app = TestApp::new();

    // Register "alice"/"pw1": success with an access token and user view.
    let registered = app
        .sessions
        .register("alice", "pw1", CLIENT_IP)
        .expect("first registration succeeds");
    assert_eq!(registered.user.username, "alice");
    assert!(!registered.access_token.is_empty());

    // Register "alice"/"pw2" again: Conflict, and no duplicate user.
    let err = app
        .sessions
        .register("alice", "pw2", CLIENT_IP)
        .expect_err("duplicate registration fails");
    assert!(matches!(err, AuthError::UsernameTaken));
    assert_eq!(
        ApiError::from(err).into_response().status(),
        StatusCode::CONFLICT
    );
    assert_eq!(app.users.all().len(), 1);

    // Login "alice"/"pw1": success, and the refresh token issued at
    // registration is no longer active.
    let logged_in = app
        .sessions
        .login("alice", "pw1", CLIENT_IP)
        .expect("login succeeds");
    let old = app
        .tokens
        .get_by_token(&registered.refresh_token.token)
        .expect("registration token is kept for audit");
    assert!(!old.is_active(app.clock.now()));

    let active = app.active_tokens(logged_in.user.id);
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].token, logged_in.refresh_token.token);
}

#[test]
fn test_duplicate_registration_keeps_original_credentials() {
    let app = TestApp::new();
    app.sessions
        .register("alice", "pw1", CLIENT_IP)
        .expect("first registration succeeds");
    let _ = app.sessions.register("alice", "pw2", CLIENT_IP);

    // The original password still works; the rejected one never took.
    assert!(app.sessions.login("alice", "pw1", CLIENT_IP).is_ok());
    assert!(matches!(
        app.sessions.login("alice", "pw2", CLIENT_IP),
        Err(AuthError::InvalidCredentials)
    ));
}
