//! Provider payment notifications.
//!
//! A notification names a payment or an order. The processor fetches the
//! current state from the provider and, when it is final and positive,
//! settles every registration carrying that payment id. Settlement is a
//! single idempotent write, so repeated deliveries converge.
//!
//! Signatures follow the provider's scheme: the `x-signature` header carries
//! `ts=<unix>,v1=<hex>`, and `v1` is the HMAC-SHA256 of
//! `id:<data.id>;request-id:<x-request-id>;ts:<ts>;`.

use crate::error::{Error, Result};
use crate::event::{ApprovalSource, ServiceEvent, ServiceEventsSender};
use crate::provider::{self, PaymentProvider};
use crate::status::{self, PaymentStatus};
use crate::store::RegistrationStore;
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use std::sync::Arc;
use std::time::Duration;
use subtle::ConstantTimeEq;
use tracing::{debug, error, info, warn};

type HmacSha256 = Hmac<Sha256>;

/// Parsed `x-signature` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Timestamp part.
    pub ts: String,
    /// Hex digest part.
    pub v1: String,
}

impl SignatureHeader {
    /// Parse `ts=<unix>,v1=<hex>`. Order and surrounding spaces don't matter;
    /// unknown keys are ignored.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let mut ts = None;
        let mut v1 = None;
        for part in raw.split(',') {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            match key.trim() {
                "ts" => ts = Some(value.trim().to_string()),
                "v1" => v1 = Some(value.trim().to_string()),
                _ => {}
            }
        }
        Some(Self { ts: ts?, v1: v1? })
    }
}

/// Signed manifest for a notification.
#[must_use]
pub fn manifest(data_id: &str, request_id: &str, ts: &str) -> String {
    format!(
        "id:{};request-id:{request_id};ts:{ts};",
        data_id.to_lowercase()
    )
}

/// Hex HMAC-SHA256 of `message` under `secret`.
#[must_use]
pub fn sign(secret: &str, message: &str) -> String {
    // HMAC accepts keys of any length
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return String::new();
    };
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Result of a signature check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureCheck {
    /// Header present and matching.
    Valid,
    /// Header present but not matching, or unparseable.
    Mismatch,
    /// Not enough information to check (missing header, request id, query
    /// id or secret).
    Skipped,
}

/// Checks notification signatures against the shared secret.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: String,
}

impl WebhookVerifier {
    /// Create a verifier for `secret`. An empty secret skips every check.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Check a notification's signature.
    #[must_use]
    pub fn check<'a>(
        &self,
        signature: Option<&'a str>,
        request_id: Option<&'a str>,
        data_id: Option<&'a str>,
    ) -> SignatureCheck {
        let present = |value: Option<&'a str>| value.filter(|v| !v.is_empty());
        let (Some(signature), Some(request_id), Some(data_id)) =
            (present(signature), present(request_id), present(data_id))
        else {
            return SignatureCheck::Skipped;
        };
        if self.secret.is_empty() {
            debug!("No webhook secret configured, signature not checked");
            return SignatureCheck::Skipped;
        }

        let Some(header) = SignatureHeader::parse(signature) else {
            return SignatureCheck::Mismatch;
        };

        let expected = sign(&self.secret, &manifest(data_id, request_id, &header.ts));
        if constant_time_eq(&expected, &header.v1) {
            SignatureCheck::Valid
        } else {
            SignatureCheck::Mismatch
        }
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Query string of a notification.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookQuery {
    /// Resource id.
    #[serde(rename = "data.id", default)]
    pub data_id: Option<String>,
    /// Resource type.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// A notification as received over HTTP.
#[derive(Debug, Clone, Default)]
pub struct WebhookRequest {
    /// `x-signature` header.
    pub signature: Option<String>,
    /// `x-request-id` header.
    pub request_id: Option<String>,
    /// Query parameters.
    pub query: WebhookQuery,
    /// Raw body.
    pub body: Vec<u8>,
}

/// Kind of resource a notification refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceKind {
    /// A payment (also the default when no type is given).
    Payment,
    /// An order.
    Order,
    /// Anything else.
    Other(String),
}

impl ResourceKind {
    fn parse(raw: Option<&str>) -> Self {
        match raw {
            None | Some("payment") => Self::Payment,
            Some("order") => Self::Order,
            Some(other) => Self::Other(other.to_string()),
        }
    }
}

/// What the processor did with a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Registrations were settled as approved.
    Settled {
        /// Payment (or order) id.
        payment_id: String,
        /// Records matched by the update.
        records: u64,
    },
    /// The resource is not in a settling state; nothing was written.
    NotSettled {
        /// Payment (or order) id.
        payment_id: String,
        /// Classified status.
        status: PaymentStatus,
    },
    /// No resource id in the notification.
    MissingId,
    /// The notification refers to a resource type the service doesn't track.
    Unsupported(String),
}

/// Processes provider notifications.
pub struct WebhookProcessor {
    provider: Arc<dyn PaymentProvider>,
    store: Arc<dyn RegistrationStore>,
    verifier: WebhookVerifier,
    enforce_signature: bool,
    query_timeout: Duration,
    events: ServiceEventsSender,
}

impl WebhookProcessor {
    /// Create a processor.
    #[must_use]
    pub fn new(
        provider: Arc<dyn PaymentProvider>,
        store: Arc<dyn RegistrationStore>,
        verifier: WebhookVerifier,
        events: ServiceEventsSender,
    ) -> Self {
        Self {
            provider,
            store,
            verifier,
            enforce_signature: false,
            query_timeout: Duration::from_secs(10),
            events,
        }
    }

    /// Reject notifications whose signature doesn't match.
    #[must_use]
    pub fn enforce_signature(mut self, enforce: bool) -> Self {
        self.enforce_signature = enforce;
        self
    }

    /// Upper bound for a provider lookup.
    #[must_use]
    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Handle one notification.
    ///
    /// # Errors
    ///
    /// [`Error::Signature`] on a mismatch when enforcement is on,
    /// [`Error::Notification`] for a body that isn't a JSON object, and provider or
    /// store errors as they occur.
    pub async fn handle(&self, request: &WebhookRequest) -> Result<WebhookOutcome> {
        self.verify(request)?;

        let body: Value = serde_json::from_slice(&request.body)
            .map_err(|e| Error::Notification(e.to_string()))?;
        if !body.is_object() {
            return Err(Error::Notification(
                "notification body is not a JSON object".to_string(),
            ));
        }

        let Some(resource_id) = resource_id(&body, &request.query) else {
            debug!("Notification without resource id acknowledged");
            return Ok(WebhookOutcome::MissingId);
        };

        let kind = ResourceKind::parse(
            body.get("type")
                .and_then(Value::as_str)
                .filter(|kind| !kind.is_empty())
                .or_else(|| request.query.kind.as_deref().filter(|kind| !kind.is_empty())),
        );

        let (status, amount) = match kind {
            ResourceKind::Payment => {
                let details = self.bounded(self.provider.get_payment(&resource_id)).await?;
                (
                    PaymentStatus::parse(&details.status),
                    details.transaction_amount,
                )
            }
            ResourceKind::Order => {
                let details = self.bounded(self.provider.get_order(&resource_id)).await?;
                (status::classify_order(&details.status), details.total_amount)
            }
            ResourceKind::Other(kind) => {
                debug!("Notification of type {kind} acknowledged without processing");
                return Ok(WebhookOutcome::Unsupported(kind));
            }
        };

        if !status::settles(&status) {
            debug!("Resource {resource_id} is {status}, nothing to settle");
            return Ok(WebhookOutcome::NotSettled {
                payment_id: resource_id,
                status,
            });
        }

        let records = self.settle(&resource_id, amount).await?;
        Ok(WebhookOutcome::Settled {
            payment_id: resource_id,
            records,
        })
    }

    fn verify(&self, request: &WebhookRequest) -> Result<()> {
        let data_id = request.query.data_id.as_deref();
        let request_id = request.request_id.as_deref();
        match self
            .verifier
            .check(request.signature.as_deref(), request_id, data_id)
        {
            SignatureCheck::Valid | SignatureCheck::Skipped => Ok(()),
            SignatureCheck::Mismatch => {
                let data_id = data_id.unwrap_or_default().to_string();
                let request_id = request_id.unwrap_or_default().to_string();
                error!(
                    "SECURITY ALERT: webhook signature mismatch (data.id={data_id}, request-id={request_id})"
                );
                let _ = self.events.send(ServiceEvent::SignatureMismatch {
                    data_id: data_id.clone(),
                    request_id,
                });
                if self.enforce_signature {
                    Err(Error::Signature(format!(
                        "notification for {data_id} failed verification"
                    )))
                } else {
                    Ok(())
                }
            }
        }
    }

    async fn bounded<T>(&self, call: impl std::future::Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.query_timeout, call)
            .await
            .map_err(|_| Error::Provider("provider lookup timed out".to_string()))?
    }

    async fn settle(&self, payment_id: &str, amount: Option<Decimal>) -> Result<u64> {
        let records = self.store.settle_by_payment_id(payment_id, amount).await?;
        if records == 0 {
            warn!("Settled payment {payment_id} matches no registration");
        } else {
            info!("Payment {payment_id} settled ({records} registrations)");
            let _ = self.events.send(ServiceEvent::PaymentApproved {
                payment_id: payment_id.to_string(),
                source: ApprovalSource::Webhook,
            });
        }
        Ok(records)
    }
}

/// Resource id from the body's `data.id`, the body's `id`, then the query.
fn resource_id(body: &Value, query: &WebhookQuery) -> Option<String> {
    body.get("data")
        .and_then(|data| data.get("id"))
        .and_then(provider::resource_id)
        .or_else(|| body.get("id").and_then(provider::resource_id))
        .or_else(|| query.data_id.clone().filter(|id| !id.is_empty()))
}
