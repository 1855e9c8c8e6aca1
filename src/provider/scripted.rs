//! In-process provider answering from preset state.

use super::{OrderDetails, PaymentDetails, PaymentProvider, PixCharge, PixPaymentRequest};
use crate::error::{Error, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Scripted<T> {
    Answer(T),
    Fail(String),
    Hang,
}

/// Provider double with preset payments and orders.
///
/// Unknown ids fail like a provider 404. Created charges get sequential ids
/// starting at 1000 and are registered as `pending` payments.
#[derive(Default)]
pub struct ScriptedProvider {
    payments: Mutex<HashMap<String, Scripted<PaymentDetails>>>,
    orders: Mutex<HashMap<String, Scripted<OrderDetails>>>,
    created: Mutex<Vec<PixPaymentRequest>>,
    next_id: AtomicU64,
    payment_queries: AtomicU64,
    order_queries: AtomicU64,
    fail_creation: Mutex<Option<String>>,
}

impl ScriptedProvider {
    /// Create an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1000),
            ..Self::default()
        }
    }

    /// Set the status and amount reported for a payment.
    pub fn set_payment(&self, payment_id: &str, status: &str, amount: Option<Decimal>) {
        self.payments.lock().insert(
            payment_id.to_string(),
            Scripted::Answer(PaymentDetails {
                status: status.to_string(),
                transaction_amount: amount,
            }),
        );
    }

    /// Make lookups of a payment fail.
    pub fn fail_payment(&self, payment_id: &str, message: &str) {
        self.payments
            .lock()
            .insert(payment_id.to_string(), Scripted::Fail(message.to_string()));
    }

    /// Make lookups of a payment never answer.
    pub fn hang_payment(&self, payment_id: &str) {
        self.payments
            .lock()
            .insert(payment_id.to_string(), Scripted::Hang);
    }

    /// Set the status and total reported for an order.
    pub fn set_order(&self, order_id: &str, status: &str, amount: Option<Decimal>) {
        self.orders.lock().insert(
            order_id.to_string(),
            Scripted::Answer(OrderDetails {
                status: status.to_string(),
                total_amount: amount,
            }),
        );
    }

    /// Make charge creation fail.
    pub fn fail_creation(&self, message: &str) {
        *self.fail_creation.lock() = Some(message.to_string());
    }

    /// Charges created so far.
    #[must_use]
    pub fn created(&self) -> Vec<PixPaymentRequest> {
        self.created.lock().clone()
    }

    /// Number of payment lookups served.
    #[must_use]
    pub fn payment_queries(&self) -> u64 {
        self.payment_queries.load(Ordering::Relaxed)
    }

    /// Number of order lookups served.
    #[must_use]
    pub fn order_queries(&self) -> u64 {
        self.order_queries.load(Ordering::Relaxed)
    }
}

async fn answer<T: Clone>(entry: Option<Scripted<T>>, what: &str, id: &str) -> Result<T> {
    match entry {
        Some(Scripted::Answer(value)) => Ok(value),
        Some(Scripted::Fail(message)) => Err(Error::Provider(message)),
        Some(Scripted::Hang) => {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(Error::Provider(format!("{what} {id} timed out")))
        }
        None => Err(Error::Provider(format!("{what} {id} not found"))),
    }
}

#[async_trait]
impl PaymentProvider for ScriptedProvider {
    async fn create_pix_payment(&self, request: &PixPaymentRequest) -> Result<PixCharge> {
        let failure = self.fail_creation.lock().clone();
        if let Some(message) = failure {
            return Err(Error::Provider(message));
        }

        let payment_id = self.next_id.fetch_add(1, Ordering::Relaxed).to_string();
        self.created.lock().push(request.clone());
        self.set_payment(&payment_id, "pending", Some(request.amount));

        Ok(PixCharge {
            qr_code: Some(format!("00020126PIX{payment_id}")),
            qr_code_base64: Some("iVBORw0KGgo=".to_string()),
            payment_id,
            status: "pending".to_string(),
        })
    }

    async fn get_payment(&self, payment_id: &str) -> Result<PaymentDetails> {
        self.payment_queries.fetch_add(1, Ordering::Relaxed);
        let entry = self.payments.lock().get(payment_id).cloned();
        answer(entry, "payment", payment_id).await
    }

    async fn get_order(&self, order_id: &str) -> Result<OrderDetails> {
        self.order_queries.fetch_add(1, Ordering::Relaxed);
        let entry = self.orders.lock().get(order_id).cloned();
        answer(entry, "order", order_id).await
    }
}
