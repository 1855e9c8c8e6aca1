//! Ticket purchase: price the cart, issue a PIX charge, record the
//! registration as pending.

use crate::config::ProviderConfig;
use crate::document;
use crate::error::{Error, Result};
use crate::event::{ServiceEvent, ServiceEventsSender};
use crate::model::{NewRegistration, Participant, Settings};
use crate::numbers::{self, DrawRules};
use crate::provider::{Payer, PaymentProvider, PixPaymentRequest};
use crate::status::PaymentStatus;
use crate::store::RegistrationStore;
use crate::tickets;
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

const DEFAULT_FIRST_NAME: &str = "Participante";

/// Charge presentation settings.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Name used in the charge description.
    pub raffle_name: String,
    /// Prefix for external references and idempotency keys.
    pub reference_prefix: String,
    /// Where the provider should send notifications.
    pub notification_url: Option<String>,
    /// Payer e-mail when the participant gave none.
    pub fallback_email: String,
    /// Payer last name when the participant gave a single name.
    pub fallback_last_name: String,
}

impl From<&ProviderConfig> for CheckoutConfig {
    fn from(config: &ProviderConfig) -> Self {
        Self {
            raffle_name: config.raffle_name.clone(),
            reference_prefix: config.reference_prefix.clone(),
            notification_url: config.notification_url.clone(),
            fallback_email: config.fallback_email.clone(),
            fallback_last_name: config.fallback_last_name.clone(),
        }
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self::from(&ProviderConfig::default())
    }
}

/// Everything the participant needs to pay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseReceipt {
    /// Stored registration id.
    pub registration_id: String,
    /// Sequential display number.
    pub registration_number: u64,
    /// Provider payment id.
    pub payment_id: String,
    /// Provider status at creation.
    pub status: String,
    /// PIX copy-and-paste payload.
    pub qr_code: Option<String>,
    /// QR code image, base64 PNG.
    pub qr_code_base64: Option<String>,
    /// Amount charged.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    /// Combinations bought.
    pub combinations: Vec<Vec<u32>>,
}

/// Checkout operation.
pub struct Checkout {
    provider: Arc<dyn PaymentProvider>,
    store: Arc<dyn RegistrationStore>,
    rules: DrawRules,
    config: CheckoutConfig,
    events: ServiceEventsSender,
}

impl Checkout {
    /// Create a checkout.
    #[must_use]
    pub fn new(
        provider: Arc<dyn PaymentProvider>,
        store: Arc<dyn RegistrationStore>,
        rules: DrawRules,
        config: CheckoutConfig,
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

    /// Buy `combinations` for `participant` at the current settings.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] when the purchase is refused before reaching the
    /// provider; provider and store errors otherwise. A store failure after
    /// the charge was created is logged with the payment id.
    pub async fn purchase(
        &self,
        participant: &Participant,
        combinations: &[Vec<u32>],
        settings: &Settings,
    ) -> Result<PurchaseReceipt> {
        self.validate(participant, combinations, settings)?;

        let count = combinations.len();
        let total = order_total(settings.bet_price, count);
        let cpf = document::digits_only(&participant.cpf);
        let request = self.charge_request(participant, &cpf, total, count);

        let charge = self.provider.create_pix_payment(&request).await?;

        let registration = NewRegistration {
            full_name: participant.full_name.trim().to_string(),
            cpf,
            phone: document::digits_only(&participant.phone),
            email: participant.email.trim().to_string(),
            photo_url: participant.photo_url.clone(),
            chosen_numbers: numbers::flatten(combinations),
            payment_id: charge.payment_id.clone(),
            payment_status: PaymentStatus::Pending,
            total_amount: total,
            referral_code: participant.referral_code.clone(),
        };

        let stored = match self.store.insert(registration).await {
            Ok(stored) => stored,
            Err(e) => {
                error!(
                    "Charge {} created but registration not stored: {e}",
                    charge.payment_id
                );
                return Err(e);
            }
        };

        info!(
            "Registration {} created: {count} tickets, payment {}",
            stored.registration_number, charge.payment_id
        );
        let _ = self.events.send(ServiceEvent::TicketsPurchased {
            payment_id: charge.payment_id.clone(),
            tickets: count,
        });

        Ok(PurchaseReceipt {
            registration_id: stored.id,
            registration_number: stored.registration_number,
            payment_id: charge.payment_id,
            status: charge.status,
            qr_code: charge.qr_code,
            qr_code_base64: charge.qr_code_base64,
            total_amount: total,
            combinations: combinations.to_vec(),
        })
    }

    fn validate(
        &self,
        participant: &Participant,
        combinations: &[Vec<u32>],
        settings: &Settings,
    ) -> Result<()> {
        if !settings.is_active {
            return Err(Error::Validation("sales are closed".to_string()));
        }
        if combinations.is_empty() {
            return Err(Error::Validation("no combinations chosen".to_string()));
        }
        if !document::is_valid_cpf(&participant.cpf) {
            return Err(Error::Validation("invalid CPF".to_string()));
        }
        if participant
            .photo_url
            .as_deref()
            .map_or(true, |url| url.trim().is_empty())
        {
            return Err(Error::Validation("photo is required".to_string()));
        }
        let email = participant.email.trim();
        if !email.is_empty() && !plausible_email(email) {
            return Err(Error::Validation(format!("invalid e-mail {email:?}")));
        }
        for combination in combinations {
            tickets::validate_combination(combination, &self.rules)?;
        }
        Ok(())
    }

    fn charge_request(
        &self,
        participant: &Participant,
        cpf: &str,
        total: Decimal,
        count: usize,
    ) -> PixPaymentRequest {
        let now = Utc::now().timestamp_millis();
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(6)
            .map(char::from)
            .collect();
        let (first_name, last_name) =
            split_name(&participant.full_name, &self.config.fallback_last_name);

        let email = participant.email.trim().to_lowercase();
        let email = if email.is_empty() {
            self.config.fallback_email.clone()
        } else {
            email
        };

        PixPaymentRequest {
            amount: total,
            description: format!("{} - {count} Bilhete(s)", self.config.raffle_name),
            external_reference: format!("{}_{cpf}_{now}", self.config.reference_prefix),
            idempotency_key: format!(
                "{}-{now}-{}",
                self.config.reference_prefix.to_lowercase(),
                suffix.to_lowercase()
            ),
            notification_url: self.config.notification_url.clone(),
            payer: Payer {
                email,
                first_name,
                last_name,
                cpf: cpf.to_string(),
            },
        }
    }
}

/// `local@domain.tld` shape: an `@` with a dot somewhere after it.
fn plausible_email(email: &str) -> bool {
    email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
    })
}

/// First word and the rest of a full name.
fn split_name(full_name: &str, fallback_last: &str) -> (String, String) {
    let trimmed = full_name.trim();
    if trimmed.is_empty() {
        return (DEFAULT_FIRST_NAME.to_string(), fallback_last.to_string());
    }
    match trimmed.split_once(' ') {
        Some((first, rest)) if !rest.trim().is_empty() => {
            (first.to_string(), rest.trim().to_string())
        }
        _ => (trimmed.to_string(), fallback_last.to_string()),
    }
}

/// Price of `count` combinations, rounded half away from zero to cents.
fn order_total(bet_price: Decimal, count: usize) -> Decimal {
    (bet_price * Decimal::from(count))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::event::create_event_channel;
    use crate::provider::ScriptedProvider;
    use crate::store::MemoryStore;
    use serde_json::json;

    struct Fixture {
        provider: Arc<ScriptedProvider>,
        store: MemoryStore,
        checkout: Checkout,
        events: crate::event::ServiceEventsChannel,
    }

    fn fixture() -> Fixture {
        let provider = Arc::new(ScriptedProvider::new());
        let store = MemoryStore::new();
        let (tx, rx) = create_event_channel();
        let config = CheckoutConfig {
            notification_url: Some("https://raffle.example.com/webhooks/payments".to_string()),
            ..CheckoutConfig::default()
        };
        let checkout = Checkout::new(
            provider.clone(),
            Arc::new(store.clone()),
            DrawRules::default(),
            config,
            tx,
        );
        Fixture {
            provider,
            store,
            checkout,
            events: rx,
        }
    }

    fn participant() -> Participant {
        Participant {
            full_name: "Maria da Silva Souza".to_string(),
            cpf: "529.982.247-25".to_string(),
            phone: "(11) 99999-0000".to_string(),
            email: " Maria@Example.com ".to_string(),
            photo_url: Some("https://cdn.example.com/p.jpg".to_string()),
            referral_code: None,
        }
    }

    fn settings() -> Settings {
        Settings::defaults_for(&DrawRules::default())
    }

    #[tokio::test]
    async fn test_purchase_creates_charge_and_pending_registration() {
        let mut f = fixture();
        let cart = vec![vec![1, 2, 3, 4, 5, 6, 7], vec![10, 20, 30, 40, 50, 55, 60]];

        let receipt = f
            .checkout
            .purchase(&participant(), &cart, &settings())
            .await
            .unwrap();

        assert_eq!(receipt.total_amount, Decimal::new(1998, 2));
        assert_eq!(receipt.payment_id, "1000");
        assert!(receipt.qr_code.is_some());

        let created = f.provider.created();
        assert_eq!(created.len(), 1);
        let request = &created[0];
        assert_eq!(request.amount, Decimal::new(1998, 2));
        assert_eq!(request.description, "Mega TUPÃ - 2 Bilhete(s)");
        assert!(request.external_reference.starts_with("TUPA_52998224725_"));
        assert!(request.idempotency_key.starts_with("tupa-"));
        assert_eq!(request.payer.email, "maria@example.com");
        assert_eq!(request.payer.first_name, "Maria");
        assert_eq!(request.payer.last_name, "da Silva Souza");
        assert_eq!(request.payer.cpf, "52998224725");

        let stored = f.store.get(&receipt.registration_id).unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Pending);
        assert_eq!(stored.cpf, "52998224725");
        assert_eq!(stored.phone, "11999990000");
        assert_eq!(stored.payment_id, "1000");
        assert_eq!(
            stored.chosen_numbers,
            json!([1, 2, 3, 4, 5, 6, 7, 10, 20, 30, 40, 50, 55, 60])
        );

        assert!(matches!(
            f.events.try_recv().unwrap(),
            ServiceEvent::TicketsPurchased { tickets: 2, .. }
        ));
    }

    #[tokio::test]
    async fn test_purchase_rejections_never_reach_provider() {
        let f = fixture();
        let cart = vec![vec![1, 2, 3, 4, 5, 6, 7]];

        let mut closed = settings();
        closed.is_active = false;
        let mut bad_cpf = participant();
        bad_cpf.cpf = "111.111.111-11".to_string();
        let mut no_photo = participant();
        no_photo.photo_url = None;
        let mut bad_email = participant();
        bad_email.email = "maria@localhost".to_string();

        let cases: Vec<(Participant, Vec<Vec<u32>>, Settings)> = vec![
            (participant(), cart.clone(), closed),
            (participant(), Vec::new(), settings()),
            (bad_cpf, cart.clone(), settings()),
            (no_photo, cart.clone(), settings()),
            (bad_email, cart, settings()),
            (participant(), vec![vec![1, 2, 3]], settings()),
            (participant(), vec![vec![1, 2, 3, 4, 5, 6, 61]], settings()),
        ];

        for (who, combos, current) in &cases {
            let result = f.checkout.purchase(who, combos, current).await;
            assert!(matches!(result, Err(Error::Validation(_))), "{result:?}");
        }
        assert!(f.provider.created().is_empty());
        assert!(f.store.all().is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure_stores_nothing() {
        let f = fixture();
        f.provider.fail_creation("401 unauthorized");
        let result = f
            .checkout
            .purchase(&participant(), &[vec![1, 2, 3, 4, 5, 6, 7]], &settings())
            .await;
        assert!(matches!(result, Err(Error::Provider(_))));
        assert!(f.store.all().is_empty());
    }

    #[tokio::test]
    async fn test_blank_email_uses_fallback() {
        let f = fixture();
        let mut who = participant();
        who.email = String::new();
        f.checkout
            .purchase(&who, &[vec![1, 2, 3, 4, 5, 6, 7]], &settings())
            .await
            .unwrap();
        assert_eq!(f.provider.created()[0].payer.email, "financeiro@tupa.com");
    }

    #[test]
    fn test_total_rounds_to_cents() {
        assert_eq!(order_total(Decimal::new(3333, 3), 3), Decimal::new(1000, 2));
        assert_eq!(order_total(Decimal::new(999, 2), 2), Decimal::new(1998, 2));
    }

    #[test]
    fn test_total_rounds_half_cents_up() {
        assert_eq!(order_total(Decimal::new(125, 3), 1), Decimal::new(13, 2));
        assert_eq!(order_total(Decimal::new(1005, 3), 1), Decimal::new(101, 2));
        assert_eq!(order_total(Decimal::new(1125, 3), 2), Decimal::new(225, 2));
    }

    #[test]
    fn test_split_name() {
        assert_eq!(
            split_name("  Maria  ", "TUPÃ"),
            ("Maria".to_string(), "TUPÃ".to_string())
        );
        assert_eq!(
            split_name("", "TUPÃ"),
            ("Participante".to_string(), "TUPÃ".to_string())
        );
        assert_eq!(
            split_name("João Pedro Alves", "TUPÃ"),
            ("João".to_string(), "Pedro Alves".to_string())
        );
    }

    #[test]
    fn test_plausible_email() {
        assert!(plausible_email("a@b.co"));
        assert!(!plausible_email("a@b"));
        assert!(!plausible_email("@b.co"));
        assert!(!plausible_email("ab.co"));
    }
}
