//! Registration storage.
//!
//! The service only needs a handful of operations from the backend: insert a
//! registration, list registrations for a CPF or all of them, flip one record to approved,
//! settle the record(s) of a payment id and read the settings row.
//! Every update is a single write so concurrent deliveries for the same
//! payment converge on the same state.

mod memory;
mod rest;

pub use memory::{MemoryStore, StoreStats};
pub use rest::RestStore;

use crate::error::Result;
use crate::model::{NewRegistration, Registration, Settings};
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Persistence operations used by checkout and reconciliation.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Insert a registration and return the stored record.
    async fn insert(&self, registration: NewRegistration) -> Result<Registration>;

    /// Registrations whose CPF equals any of `documents`, newest first.
    async fn find_by_documents(&self, documents: &[String]) -> Result<Vec<Registration>>;

    /// Every registration, newest first.
    async fn list_all(&self) -> Result<Vec<Registration>>;

    /// Set the status of one registration to `approved`.
    async fn mark_approved(&self, id: &str) -> Result<()>;

    /// Set status `approved` (and the amount, when given) on every
    /// registration with this payment id. Returns the number of records
    /// matched.
    async fn settle_by_payment_id(&self, payment_id: &str, amount: Option<Decimal>) -> Result<u64>;

    /// The settings row, if the administration panel has saved one.
    async fn load_settings(&self) -> Result<Option<Settings>>;
}
