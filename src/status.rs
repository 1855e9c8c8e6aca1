//! Payment status classification.
//!
//! The provider reports a free-form status string. Locally only two values
//! carry meaning (`pending` and `approved`); every other string is kept as
//! the provider sent it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Provider payment statuses treated as paid when a participant looks up
/// their tickets.
pub const APPROVED_PAYMENT_STATUSES: [&str; 5] = [
    "approved",
    "accredited",
    "authorized",
    "in_process",
    "in_mediation",
];

/// Order status meaning the order was paid.
pub const PROCESSED_ORDER_STATUS: &str = "processed";

/// Locally stored payment status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentStatus {
    /// Charge created, payment not confirmed yet.
    #[default]
    Pending,
    /// Payment confirmed.
    Approved,
    /// Any other provider status, kept verbatim.
    Other(String),
}

impl PaymentStatus {
    /// Read a stored or provider status string without remapping.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "pending" => Self::Pending,
            "approved" => Self::Approved,
            other => Self::Other(other.to_string()),
        }
    }

    /// The string form written to storage.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Other(raw) => raw,
        }
    }

    /// Returns true while the payment still awaits confirmation.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Returns true once the payment is confirmed.
    #[must_use]
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for PaymentStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "pending" => Self::Pending,
            "approved" => Self::Approved,
            _ => Self::Other(raw),
        }
    }
}

impl From<PaymentStatus> for String {
    fn from(status: PaymentStatus) -> Self {
        match status {
            PaymentStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

/// Classify a payment status for the ticket lookup path.
///
/// Any status in [`APPROVED_PAYMENT_STATUSES`] becomes `approved`; everything
/// else passes through unchanged.
#[must_use]
pub fn classify_payment(raw: &str) -> PaymentStatus {
    if APPROVED_PAYMENT_STATUSES.contains(&raw) {
        PaymentStatus::Approved
    } else {
        PaymentStatus::parse(raw)
    }
}

/// Classify an order status: `processed` becomes `approved`, everything else
/// passes through unchanged.
#[must_use]
pub fn classify_order(raw: &str) -> PaymentStatus {
    if raw == PROCESSED_ORDER_STATUS {
        PaymentStatus::Approved
    } else {
        PaymentStatus::parse(raw)
    }
}

/// Whether a notification with this status settles the registration.
///
/// Only `approved` and `accredited` do; the webhook path never moves a record
/// away from approval.
#[must_use]
pub fn settles(status: &PaymentStatus) -> bool {
    matches!(status.as_str(), "approved" | "accredited")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_statuses_classify_as_approved() {
        for raw in APPROVED_PAYMENT_STATUSES {
            assert_eq!(classify_payment(raw), PaymentStatus::Approved, "{raw}");
        }
    }

    #[test]
    fn test_other_statuses_pass_through() {
        assert_eq!(classify_payment("pending"), PaymentStatus::Pending);
        assert_eq!(
            classify_payment("rejected"),
            PaymentStatus::Other("rejected".to_string())
        );
        assert_eq!(classify_payment("cancelled").as_str(), "cancelled");
    }

    #[test]
    fn test_order_classification() {
        assert_eq!(classify_order("processed"), PaymentStatus::Approved);
        assert_eq!(classify_order("approved"), PaymentStatus::Approved);
        assert_eq!(classify_order("action_required").as_str(), "action_required");
    }

    #[test]
    fn test_only_approved_and_accredited_settle() {
        assert!(settles(&PaymentStatus::Approved));
        assert!(settles(&PaymentStatus::parse("accredited")));
        assert!(!settles(&PaymentStatus::parse("in_process")));
        assert!(!settles(&PaymentStatus::parse("authorized")));
        assert!(!settles(&PaymentStatus::Pending));
        assert!(!settles(&PaymentStatus::parse("refunded")));
    }

    #[test]
    fn test_serde_uses_raw_string() {
        let json = serde_json::to_string(&PaymentStatus::Approved).unwrap();
        assert_eq!(json, "\"approved\"");

        let status: PaymentStatus = serde_json::from_str("\"charged_back\"").unwrap();
        assert_eq!(status, PaymentStatus::Other("charged_back".to_string()));
        assert_eq!(status.to_string(), "charged_back");
    }
}
