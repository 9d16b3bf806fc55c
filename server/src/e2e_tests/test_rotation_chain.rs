//! The rotation invariant: a refresh chain has exactly one active tip.

use crate::e2e_tests::helpers::{CLIENT_IP, TestApp};
use crate::store::RefreshTokenStore as _;
use crate::time::TimeSource as _;

#[test]
fn test_refresh_rotates_and_links_successor() {
    let app = TestApp::new();
    let first = app
        .sessions
        .register("alice", "pw1", CLIENT_IP)
        .expect("registration succeeds");

    let second = app
        .sessions
        .refresh(Some(&first.refresh_token.token), CLIENT_IP)
        .expect("refresh succeeds");

    let rotated = app
        .tokens
        .get_by_token(&first.refresh_token.token)
        .expect("predecessor is kept");
    assert!(!rotated.is_active(app.clock.now()));
    assert_eq!(
        rotated.replaced_by_token.as_deref(),
        Some(second.refresh_token.token.as_str())
    );
    assert_eq!(rotated.revoked_by_ip.as_deref(), Some(CLIENT_IP));

    let active = app.active_tokens(second.user.id);
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].token, second.refresh_token.token);
}

#[test]
fn test_long_chain_keeps_single_active_tip() {
    let app = TestApp::new();
    let mut current = app
        .sessions
        .register("alice", "pw1", CLIENT_IP)
        .expect("registration succeeds");
    let user_id = current.user.id;

    // Walk the chain through several rotations, always using the latest
    // issued token.
    for _ in 0..5 {
        current = app
            .sessions
            .refresh(Some(&current.refresh_token.token), CLIENT_IP)
            .expect("refresh with the chain tip succeeds");

        let active = app.active_tokens(user_id);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].token, current.refresh_token.token);
    }

    // Every superseded node records its successor; following the links
    // from the root reaches the tip.
    let all = app.tokens.get_by_user(user_id);
    assert_eq!(all.len(), 6);

    let mut hops = 0;
    let mut cursor = all
        .iter()
        .find(|t| {
            all.iter()
                .all(|o| o.replaced_by_token.as_deref() != Some(t.token.as_str()))
        })
        .expect("chain has a root");
    while let Some(next_token) = cursor.replaced_by_token.as_deref() {
        cursor = all
            .iter()
            .find(|t| t.token == next_token)
            .expect("successor exists in the ledger");
        hops += 1;
    }
    assert_eq!(hops, 5);
    assert_eq!(cursor.token, current.refresh_token.token);
}
