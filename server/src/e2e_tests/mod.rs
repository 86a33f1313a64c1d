//! End-to-end tests at the HTTP request/response level.
//!
//! Each test file covers a specific scenario, driving the full router with a
//! manual clock and a recording notifier.

#![cfg(test)]

mod helpers;

mod test_login;
mod test_person_delete_guard;
mod test_person_signup;
mod test_product_crud;
mod test_product_guard;
mod test_token_expiry;
