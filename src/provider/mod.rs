//! Payment provider interface.
//!
//! The service talks to the provider for three things: creating a PIX
//! charge at checkout, reading a payment's status and amount, and reading an
//! order's status and amount. [`MercadoPagoClient`] is the HTTP
//! implementation; [`ScriptedProvider`] answers from preset state for tests
//! and offline development.

mod mercado_pago;
mod scripted;

pub use mercado_pago::MercadoPagoClient;
pub use scripted::ScriptedProvider;

use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

/// Payer identification sent with a charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payer {
    /// E-mail, lowercased.
    pub email: String,
    /// First name.
    pub first_name: String,
    /// Remaining names.
    pub last_name: String,
    /// Digits-only CPF.
    pub cpf: String,
}

/// A PIX charge to create.
#[derive(Debug, Clone)]
pub struct PixPaymentRequest {
    /// Amount to charge, two decimal places.
    pub amount: Decimal,
    /// Charge description shown to the payer.
    pub description: String,
    /// Reference echoed back by the provider.
    pub external_reference: String,
    /// Key that makes retried creations safe.
    pub idempotency_key: String,
    /// URL the provider notifies on status changes.
    pub notification_url: Option<String>,
    /// Payer identification.
    pub payer: Payer,
}

/// A created PIX charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PixCharge {
    /// Provider payment identifier.
    pub payment_id: String,
    /// Status reported at creation.
    pub status: String,
    /// PIX copy-and-paste payload.
    pub qr_code: Option<String>,
    /// QR code image, base64 PNG.
    pub qr_code_base64: Option<String>,
}

/// Current state of a payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentDetails {
    /// Raw provider status.
    pub status: String,
    /// Amount the provider settled.
    pub transaction_amount: Option<Decimal>,
}

/// Current state of an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDetails {
    /// Raw provider status.
    pub status: String,
    /// Order total, when reported.
    pub total_amount: Option<Decimal>,
}

/// Operations the service needs from the payment provider.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a PIX charge.
    async fn create_pix_payment(&self, request: &PixPaymentRequest) -> Result<PixCharge>;

    /// Fetch a payment by id.
    async fn get_payment(&self, payment_id: &str) -> Result<PaymentDetails>;

    /// Fetch an order by id.
    async fn get_order(&self, order_id: &str) -> Result<OrderDetails>;
}

/// Read a provider identifier that may arrive as a string or a number.
///
/// Empty strings, zero and other JSON types count as absent.
#[must_use]
pub fn resource_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64().is_some_and(|f| f != 0.0) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resource_id_accepts_strings_and_numbers() {
        assert_eq!(resource_id(&json!("123")), Some("123".to_string()));
        assert_eq!(resource_id(&json!(123_456_789_012_u64)), Some("123456789012".to_string()));
    }

    #[test]
    fn test_resource_id_rejects_blank_values() {
        assert_eq!(resource_id(&json!("")), None);
        assert_eq!(resource_id(&json!(0)), None);
        assert_eq!(resource_id(&json!(null)), None);
        assert_eq!(resource_id(&json!({"id": 1})), None);
    }
}
