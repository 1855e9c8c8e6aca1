//! Read-only administration views.
//!
//! The administration panel lists every registration with its combinations
//! recovered from storage, and shows a sales summary: revenue already
//! approved, revenue still pending and the number of combinations sold.
//! Nothing here queries the provider or writes to the store.

use crate::error::Result;
use crate::model::Registration;
use crate::numbers::{self, DrawRules};
use crate::status::PaymentStatus;
use crate::store::RegistrationStore;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// A registration as shown on the administration panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistrationEntry {
    /// Record id.
    pub id: String,
    /// Sequential display number.
    pub registration_number: u64,
    /// Participant name.
    pub full_name: String,
    /// CPF as stored.
    pub cpf: String,
    /// Phone as stored.
    pub phone: String,
    /// Contact e-mail.
    pub email: String,
    /// Photo reference.
    pub photo_url: Option<String>,
    /// Provider payment id.
    pub payment_id: String,
    /// Stored status.
    pub payment_status: PaymentStatus,
    /// Amount charged.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    /// Partner referral code.
    pub referral_code: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Combinations recovered from the stored numbers.
    pub combinations: Vec<Vec<u32>>,
}

impl RegistrationEntry {
    /// Build an entry, normalizing the stored numbers under `rules`.
    #[must_use]
    pub fn from_registration(record: Registration, rules: &DrawRules) -> Self {
        Self {
            combinations: numbers::normalize(&record.chosen_numbers, rules),
            id: record.id,
            registration_number: record.registration_number,
            full_name: record.full_name,
            cpf: record.cpf,
            phone: record.phone,
            email: record.email,
            photo_url: record.photo_url,
            payment_id: record.payment_id,
            payment_status: record.payment_status,
            total_amount: record.total_amount,
            referral_code: record.referral_code,
            created_at: record.created_at,
        }
    }
}

/// Sales totals over all registrations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SalesSummary {
    /// Sum of amounts of approved registrations.
    #[serde(with = "rust_decimal::serde::float")]
    pub approved_revenue: Decimal,
    /// Sum of amounts of registrations still pending.
    #[serde(with = "rust_decimal::serde::float")]
    pub pending_revenue: Decimal,
    /// Combinations across every registration, whatever its status.
    pub ticket_count: usize,
    /// Registrations counted.
    pub registrations: usize,
}

impl SalesSummary {
    /// Totals for `entries`.
    ///
    /// Registrations in any status other than approved or pending count
    /// towards `ticket_count` but not towards revenue.
    #[must_use]
    pub fn from_entries(entries: &[RegistrationEntry]) -> Self {
        entries
            .iter()
            .fold(Self::default(), |mut summary, entry| {
                match entry.payment_status {
                    PaymentStatus::Approved => summary.approved_revenue += entry.total_amount,
                    PaymentStatus::Pending => summary.pending_revenue += entry.total_amount,
                    PaymentStatus::Other(_) => {}
                }
                summary.ticket_count += entry.combinations.len();
                summary.registrations += 1;
                summary
            })
    }
}

/// Administration queries over the store.
pub struct Admin {
    store: Arc<dyn RegistrationStore>,
    rules: DrawRules,
}

impl Admin {
    /// Create the administration view.
    #[must_use]
    pub fn new(store: Arc<dyn RegistrationStore>, rules: DrawRules) -> Self {
        Self { store, rules }
    }

    /// Every registration, newest first, with normalized combinations.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn registrations(&self) -> Result<Vec<RegistrationEntry>> {
        let records = self.store.list_all().await?;
        debug!("Listing {} registrations", records.len());
        Ok(records
            .into_iter()
            .map(|record| RegistrationEntry::from_registration(record, &self.rules))
            .collect())
    }

    /// Sales summary over every registration.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn summary(&self) -> Result<SalesSummary> {
        let entries = self.registrations().await?;
        Ok(SalesSummary::from_entries(&entries))
    }
}
