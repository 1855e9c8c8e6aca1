//! End-to-end tests for raffle-service.
//!
//! Each test drives the HTTP router through `axum-test` with an in-memory
//! store and a scripted payment provider, so no network access is needed.
//!
//! ```bash
//! cargo test --test e2e
//! ```

mod admin;
mod harness;
mod integration_tests;
mod lookup;
mod purchase;
mod webhook;

pub use harness::TestHarness;
