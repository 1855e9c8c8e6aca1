//! Ticket sales backend for a PIX-paid raffle.
//!
//! Participants buy fixed-size number combinations, pay through a PIX charge
//! issued by the payment provider, and later look up their tickets by CPF.
//! The provider pushes payment notifications to a webhook.
//!
//! The crate is organised around two pieces of logic:
//!
//! - [`numbers`]: recovers number combinations from stored values that were
//!   written in several shapes over time (flat lists, nested lists, delimited
//!   strings, double-encoded JSON, keyed maps).
//! - [`reconcile`] and [`webhook`]: bring the locally stored payment status in
//!   line with the provider, either when a participant looks up their tickets
//!   or when the provider sends a notification.
//!
//! ```text
//!  checkout ──► provider: create PIX charge
//!     │
//!     ▼
//!  store: registration (pending)
//!     ▲                         ▲
//!     │ mark_approved           │ settle_by_payment_id
//!  lookup ◄── provider status   webhook ◄── provider notification
//! ```

pub mod admin;
pub mod api;
pub mod checkout;
pub mod config;
pub mod document;
pub mod error;
pub mod event;
pub mod model;
pub mod numbers;
pub mod provider;
pub mod reconcile;
pub mod service;
pub mod status;
pub mod store;
pub mod tickets;
pub mod webhook;

pub use config::ServiceConfig;
pub use error::{Error, Result};
pub use numbers::{normalize, DrawRules};
pub use service::{RunningService, ServiceBuilder};
pub use status::PaymentStatus;
