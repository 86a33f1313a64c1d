// Life of a request:
// 1. HTTP request comes in, method and path select a route
// 2. The route's guard runs the strategy registry for its operation
//     - Exempt or unguarded: pass through
//     - Guarded: the bound strategy reads the bearer token, the token
//       service checks signature and expiry, a Principal is attached
//     - Refused: 401, the handler never runs
// 3. The handler runs against the repository
//    For person creation:
//     - Generate a credential, encrypt it, store only the encrypted form
//     - Hand the plaintext to the notifier (email and SMS), do not wait
//    For login:
//     - Verify the credential, issue a signed token
//
// System components:
//  - Credential codec and token service
//  - Strategy registry and guard middleware
//  - In-memory repository
//  - Notifier

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod accounts;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod notify;
pub mod repository;
pub mod routes;
pub mod time;

mod e2e_tests;
