// Life of a request:
// 1. JSON comes in over HTTP
// 2. Auth endpoints run the session protocol:
//     - Consult the user directory and refresh-token ledger
//     - Issue / rotate / revoke tokens
//     - Respond with an access token + user, cookie carries the refresh token
//    Resource endpoints:
//     - Verify the bearer token into identity claims
//     - Read or mutate the caller's keyed collection
//     - Respond
//
// System components:
//  - Session protocol (register / login / refresh / logout)
//  - Token issuer (signed access tokens, random refresh tokens)
//  - Keyed stores (users, refresh tokens, books, quotes)

pub mod api;
pub mod auth;
pub mod config;
pub mod model;
pub mod store;
pub mod time;

mod e2e_tests;
