//! Theft detection: replaying a rotated-out token burns the whole lineage.

use axum::http::StatusCode;
use axum::response::IntoResponse as _;

use crate::api::ApiError;
use crate::auth::session::AuthError;
use crate::e2e_tests::helpers::{ATTACKER_IP, CLIENT_IP, TestApp};
use crate::store::RefreshTokenStore as _;
use crate::time::TimeSource as _;

#[test]
fn test_replayed_predecessor_revokes_lineage() {
    let app = TestApp::new();

    // Login issues R1; refreshing with R1 yields R2.
    let first = app
        .sessions
        .register("alice", "pw1", CLIENT_IP)
        .expect("registration succeeds");
    let second = app
        .sessions
        .refresh(Some(&first.refresh_token.token), CLIENT_IP)
        .expect("refresh with R1 succeeds");

    let r1 = app
        .tokens
        .get_by_token(&first.refresh_token.token)
        .expect("R1 kept");
    assert!(!r1.is_active(app.clock.now()));
    assert_eq!(
        r1.replaced_by_token.as_deref(),
        Some(second.refresh_token.token.as_str())
    );

    // Replaying R1 (from elsewhere) fails with 401 and revokes R2 too.
    let err = app
        .sessions
        .refresh(Some(&first.refresh_token.token), ATTACKER_IP)
        .expect_err("replay is rejected");
    assert!(matches!(err, AuthError::RefreshTokenRejected));
    assert_eq!(
        ApiError::from(err).into_response().status(),
        StatusCode::UNAUTHORIZED
    );

    let r2 = app
        .tokens
        .get_by_token(&second.refresh_token.token)
        .expect("R2 kept");
    assert!(!r2.is_active(app.clock.now()));
    assert_eq!(r2.revoked_by_ip.as_deref(), Some(ATTACKER_IP));

    // The previously valid successor is now dead as well.
    let err = app
        .sessions
        .refresh(Some(&second.refresh_token.token), CLIENT_IP)
        .expect_err("successor is burned");
    assert!(matches!(err, AuthError::RefreshTokenRejected));
    assert!(app.active_tokens(first.user.id).is_empty());
}

#[test]
fn test_unknown_string_is_not_a_reuse_signal() {
    let app = TestApp::new();
    let registered = app
        .sessions
        .register("alice", "pw1", CLIENT_IP)
        .expect("registration succeeds");

    let err = app
        .sessions
        .refresh(Some("deadbeefdeadbeefdeadbeefdeadbeef"), ATTACKER_IP)
        .expect_err("unknown token is rejected");
    assert!(matches!(err, AuthError::RefreshTokenRejected));

    // A string that was never issued must not burn anyone's chain.
    assert_eq!(app.active_tokens(registered.user.id).len(), 1);
}

#[test]
fn test_expired_tip_is_swept_like_a_replay() {
    let app = TestApp::new();
    let registered = app
        .sessions
        .register("alice", "pw1", CLIENT_IP)
        .expect("registration succeeds");

    // Let the whole chain age out, then present the stale tip.
    app.clock.advance(chrono::Duration::days(8));
    let err = app
        .sessions
        .refresh(Some(&registered.refresh_token.token), CLIENT_IP)
        .expect_err("expired token is rejected");
    assert!(matches!(err, AuthError::RefreshTokenRejected));

    let swept = app
        .tokens
        .get_by_token(&registered.refresh_token.token)
        .expect("record kept");
    assert!(swept.revoked.is_some());
}
