//! End-to-end tests at the session-protocol level.
//!
//! Each test file covers a specific scenario, driving the protocol and
//! the stores the way the HTTP handlers do, with a deterministic clock.

#![cfg(test)]

mod helpers;

mod test_access_claims;
mod test_logout_idempotent;
mod test_register_conflict;
mod test_resource_scoping;
mod test_reuse_detection;
mod test_rotation_chain;
