//! Records exchanged with the store and the HTTP API.

use crate::numbers::DrawRules;
use crate::status::PaymentStatus;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Participant data collected at checkout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Participant {
    /// Full name as typed.
    pub full_name: String,
    /// CPF, masked or not.
    pub cpf: String,
    /// Phone, any formatting.
    #[serde(default)]
    pub phone: String,
    /// Contact e-mail.
    #[serde(default)]
    pub email: String,
    /// Uploaded photo reference.
    #[serde(default)]
    pub photo_url: Option<String>,
    /// Partner referral code, if the participant came through one.
    #[serde(default)]
    pub referral_code: Option<String>,
}

/// A registration about to be inserted.
#[derive(Debug, Clone, Serialize)]
pub struct NewRegistration {
    /// Full name.
    pub full_name: String,
    /// Digits-only CPF.
    pub cpf: String,
    /// Digits-only phone.
    pub phone: String,
    /// Contact e-mail.
    pub email: String,
    /// Photo reference.
    pub photo_url: Option<String>,
    /// Combinations flattened into one list.
    pub chosen_numbers: Vec<u32>,
    /// Provider payment identifier.
    pub payment_id: String,
    /// Initial status, always pending at checkout.
    pub payment_status: PaymentStatus,
    /// Amount charged.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    /// Partner referral code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral_code: Option<String>,
}

/// A stored registration (one purchase).
///
/// `chosen_numbers` is kept in whatever shape the store returned; run it
/// through [`crate::numbers::normalize`] before display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    /// Store identifier.
    pub id: String,
    /// Sequential display number.
    #[serde(default, deserialize_with = "null_as_default")]
    pub registration_number: u64,
    /// Full name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub full_name: String,
    /// CPF as stored.
    #[serde(default, deserialize_with = "null_as_default")]
    pub cpf: String,
    /// Phone as stored.
    #[serde(default, deserialize_with = "null_as_default")]
    pub phone: String,
    /// Contact e-mail.
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    /// Photo reference.
    #[serde(default)]
    pub photo_url: Option<String>,
    /// Raw stored combinations.
    #[serde(default)]
    pub chosen_numbers: Value,
    /// Provider payment identifier.
    #[serde(default, deserialize_with = "null_as_default")]
    pub payment_id: String,
    /// Stored payment status.
    #[serde(default, deserialize_with = "null_as_default")]
    pub payment_status: PaymentStatus,
    /// Amount charged, or the amount settled by the provider.
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_amount: Decimal,
    /// Partner referral code.
    #[serde(default)]
    pub referral_code: Option<String>,
    /// Insertion time.
    pub created_at: DateTime<Utc>,
}

/// Read an explicit `null` column the same way as a missing one.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Raffle settings, owned by the administration panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Advertised prize.
    pub prize_value: Decimal,
    /// Draw date.
    pub draw_date: DateTime<Utc>,
    /// Winning combination; `0` marks an unset position.
    #[serde(default)]
    pub winning_numbers: Vec<u32>,
    /// Whether ticket sales are open.
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Price of one combination.
    pub bet_price: Decimal,
    /// Discount granted through a partner referral.
    #[serde(default)]
    pub referral_discount: Decimal,
}

const fn default_active() -> bool {
    true
}

impl Settings {
    /// Defaults used until the administration panel saves a row.
    #[must_use]
    pub fn defaults_for(rules: &DrawRules) -> Self {
        Self {
            prize_value: Decimal::new(50_000_000, 2),
            draw_date: Utc::now(),
            winning_numbers: vec![0; rules.pick_size],
            is_active: true,
            bet_price: Decimal::new(999, 2),
            referral_discount: Decimal::ONE,
        }
    }

    /// Whether every winning position has been filled in.
    #[must_use]
    pub fn winning_numbers_set(&self) -> bool {
        !self.winning_numbers.is_empty() && self.winning_numbers.iter().all(|n| *n != 0)
    }
}
