//! In-memory registration store.
//!
//! Used by tests and when no backend URL is configured.

use super::RegistrationStore;
use crate::error::{Error, Result};
use crate::model::{NewRegistration, Registration, Settings};
use crate::status::PaymentStatus;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Write counters, for monitoring and tests.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StoreStats {
    /// Registrations inserted.
    pub inserts: u64,
    /// `mark_approved` calls.
    pub approvals: u64,
    /// `settle_by_payment_id` calls.
    pub settlements: u64,
}

#[derive(Default)]
struct Inner {
    registrations: Vec<Registration>,
    settings: Option<Settings>,
    next_number: u64,
}

/// Thread-safe in-memory store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
    stats: Arc<RwLock<StoreStats>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding a settings row.
    #[must_use]
    pub fn with_settings(settings: Settings) -> Self {
        let store = Self::new();
        store.inner.write().settings = Some(settings);
        store
    }

    /// Put a record in as-is, keeping its id, numbers shape and timestamp.
    pub fn insert_raw(&self, registration: Registration) {
        let mut inner = self.inner.write();
        inner.next_number = inner.next_number.max(registration.registration_number);
        inner.registrations.push(registration);
    }

    /// Look up a record by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Registration> {
        self.inner
            .read()
            .registrations
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    /// Every stored record, in insertion order.
    #[must_use]
    pub fn all(&self) -> Vec<Registration> {
        self.inner.read().registrations.clone()
    }

    /// Current write counters.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        self.stats.read().clone()
    }
}

#[async_trait]
impl RegistrationStore for MemoryStore {
    async fn insert(&self, registration: NewRegistration) -> Result<Registration> {
        let chosen_numbers = serde_json::to_value(&registration.chosen_numbers)
            .map_err(|e| Error::Store(format!("cannot encode numbers: {e}")))?;

        let record = {
            let mut inner = self.inner.write();
            inner.next_number += 1;
            let record = Registration {
                id: uuid::Uuid::new_v4().to_string(),
                registration_number: inner.next_number,
                full_name: registration.full_name,
                cpf: registration.cpf,
                phone: registration.phone,
                email: registration.email,
                photo_url: registration.photo_url,
                chosen_numbers,
                payment_id: registration.payment_id,
                payment_status: registration.payment_status,
                total_amount: registration.total_amount,
                referral_code: registration.referral_code,
                created_at: Utc::now(),
            };
            inner.registrations.push(record.clone());
            record
        };

        self.stats.write().inserts += 1;
        Ok(record)
    }

    async fn find_by_documents(&self, documents: &[String]) -> Result<Vec<Registration>> {
        let mut found: Vec<Registration> = self
            .inner
            .read()
            .registrations
            .iter()
            .filter(|r| documents.iter().any(|d| *d == r.cpf))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn list_all(&self) -> Result<Vec<Registration>> {
        let mut all = self.all();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn mark_approved(&self, id: &str) -> Result<()> {
        {
            let mut inner = self.inner.write();
            if let Some(record) = inner.registrations.iter_mut().find(|r| r.id == id) {
                record.payment_status = PaymentStatus::Approved;
            }
        }
        self.stats.write().approvals += 1;
        Ok(())
    }

    async fn settle_by_payment_id(&self, payment_id: &str, amount: Option<Decimal>) -> Result<u64> {
        let mut matched = 0;
        {
            let mut inner = self.inner.write();
            for record in inner
                .registrations
                .iter_mut()
                .filter(|r| r.payment_id == payment_id)
            {
                record.payment_status = PaymentStatus::Approved;
                if let Some(amount) = amount {
                    record.total_amount = amount;
                }
                matched += 1;
            }
        }
        self.stats.write().settlements += 1;
        Ok(matched)
    }

    async fn load_settings(&self) -> Result<Option<Settings>> {
        Ok(self.inner.read().settings.clone())
    }
}
