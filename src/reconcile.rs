//! Ticket lookup with on-demand payment reconciliation.
//!
//! When a participant looks up their tickets, every registration still marked
//! `pending` is checked against the provider. A positive answer is written
//! back before the lookup returns; anything else is only displayed. Provider
//! trouble never changes what is stored.

use crate::document;
use crate::error::Result;
use crate::event::{ApprovalSource, ServiceEvent, ServiceEventsSender};
use crate::model::Registration;
use crate::numbers::{self, DrawRules};
use crate::provider::PaymentProvider;
use crate::status::{self, PaymentStatus};
use crate::store::RegistrationStore;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Configuration for the reconciler.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Upper bound for a single provider status query.
    pub query_timeout: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            query_timeout: Duration::from_secs(10),
        }
    }
}

/// A registration as shown to its owner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketView {
    /// Record id.
    pub id: String,
    /// Sequential display number.
    pub registration_number: u64,
    /// Participant name.
    pub full_name: String,
    /// Provider payment id.
    pub payment_id: String,
    /// Status after reconciliation.
    pub payment_status: PaymentStatus,
    /// Amount charged.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Combinations recovered from the stored numbers.
    pub combinations: Vec<Vec<u32>>,
}

/// Reconciles stored payment statuses with the provider during lookups.
pub struct Reconciler {
    provider: Arc<dyn PaymentProvider>,
    store: Arc<dyn RegistrationStore>,
    rules: DrawRules,
    config: ReconcilerConfig,
    events: ServiceEventsSender,
}

impl Reconciler {
    /// Create a reconciler.
    #[must_use]
    pub fn new(
        provider: Arc<dyn PaymentProvider>,
        store: Arc<dyn RegistrationStore>,
        rules: DrawRules,
        config: ReconcilerConfig,
        events: ServiceEventsSender,
    ) -> Self {
        Self {
            provider,
            store,
            rules,
            config,
            events,
        }
    }

    /// Look up every registration for a CPF, reconciling pending payments.
    ///
    /// Both the digits-only and the masked form of the document are matched.
    /// Results are newest first.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store query fails.
    pub async fn lookup(&self, raw_document: &str) -> Result<Vec<TicketView>> {
        let forms = document::lookup_forms(raw_document);
        let records = self.store.find_by_documents(&forms).await?;
        debug!(
            "Lookup matched {} registrations for {} document forms",
            records.len(),
            forms.len()
        );

        let views = self.reconcile_records(records).await;
        Ok(views)
    }

    /// Reconcile already-loaded records, keeping their order.
    pub async fn reconcile_records(&self, records: Vec<Registration>) -> Vec<TicketView> {
        join_all(records.into_iter().map(|record| self.reconcile_one(record))).await
    }

    async fn reconcile_one(&self, record: Registration) -> TicketView {
        let status = if record.payment_status.is_pending() {
            self.refresh_pending(&record).await
        } else {
            record.payment_status.clone()
        };
        self.view(record, status)
    }

    async fn refresh_pending(&self, record: &Registration) -> PaymentStatus {
        let Some(observed) = self.authoritative_status(&record.payment_id).await else {
            return record.payment_status.clone();
        };

        if observed.is_approved() {
            match self.store.mark_approved(&record.id).await {
                Ok(()) => {
                    info!(
                        "Registration {} approved (payment {})",
                        record.id, record.payment_id
                    );
                    let _ = self.events.send(ServiceEvent::PaymentApproved {
                        payment_id: record.payment_id.clone(),
                        source: ApprovalSource::Lookup,
                    });
                }
                Err(e) => {
                    warn!(
                        "Failed to record approval of registration {}: {e}",
                        record.id
                    );
                }
            }
        }

        observed
    }

    /// Ask the provider for a payment's status.
    ///
    /// `None` when the id is empty or the provider cannot answer in time.
    async fn authoritative_status(&self, payment_id: &str) -> Option<PaymentStatus> {
        if payment_id.is_empty() {
            debug!("Pending registration without payment id, skipping provider query");
            return None;
        }

        match tokio::time::timeout(
            self.config.query_timeout,
            self.provider.get_payment(payment_id),
        )
        .await
        {
            Ok(Ok(details)) => Some(status::classify_payment(&details.status)),
            Ok(Err(e)) => {
                warn!("Status query for payment {payment_id} failed: {e}");
                None
            }
            Err(_) => {
                warn!("Status query for payment {payment_id} timed out");
                None
            }
        }
    }

    fn view(&self, record: Registration, status: PaymentStatus) -> TicketView {
        TicketView {
            combinations: numbers::normalize(&record.chosen_numbers, &self.rules),
            id: record.id,
            registration_number: record.registration_number,
            full_name: record.full_name,
            payment_id: record.payment_id,
            payment_status: status,
            total_amount: record.total_amount,
            created_at: record.created_at,
        }
    }
}
