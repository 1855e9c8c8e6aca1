//! Mercado Pago REST client.

use super::{OrderDetails, PaymentDetails, PaymentProvider, PixCharge, PixPaymentRequest};
use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::header::CACHE_CONTROL;
use reqwest::{RequestBuilder, Response};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

/// HTTP client for the Mercado Pago payments and orders APIs.
pub struct MercadoPagoClient {
    http: reqwest::Client,
    api_base: String,
    access_token: String,
}

#[derive(Serialize)]
struct CreatePaymentBody<'a> {
    #[serde(with = "rust_decimal::serde::float")]
    transaction_amount: Decimal,
    description: &'a str,
    external_reference: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    notification_url: Option<&'a str>,
    payment_method_id: &'static str,
    payer: PayerBody<'a>,
}

#[derive(Serialize)]
struct PayerBody<'a> {
    email: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    identification: Identification<'a>,
}

#[derive(Serialize)]
struct Identification<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    number: &'a str,
}

#[derive(Deserialize)]
struct PaymentResponse {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    status: String,
    #[serde(default)]
    transaction_amount: Option<Decimal>,
    #[serde(default)]
    point_of_interaction: Option<PointOfInteraction>,
}

#[derive(Deserialize)]
struct PointOfInteraction {
    #[serde(default)]
    transaction_data: Option<TransactionData>,
}

#[derive(Deserialize)]
struct TransactionData {
    #[serde(default)]
    qr_code: Option<String>,
    #[serde(default)]
    qr_code_base64: Option<String>,
}

#[derive(Deserialize)]
struct OrderResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    total_amount: Option<Decimal>,
}

impl MercadoPagoClient {
    /// Create a client from the provider configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Config(format!("failed to build provider client: {e}")))?;

        if config.access_token.is_empty() {
            warn!("Payment provider access token is empty - provider calls will be rejected");
        }

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_base)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.access_token)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| Error::Provider(format!("{what} request failed: {e}")))?;

        let response = error_for_status(response, what).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| Error::Provider(format!("{what} returned a malformed body: {e}")))
    }
}

/// Turn a non-success status into an error carrying the provider's message.
async fn error_for_status(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<Value>()
        .await
        .ok()
        .and_then(|body| body.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_default();

    Err(Error::Provider(format!("{what} returned {status}: {message}")))
}

/// Ids are interpolated into request paths, so only plain identifiers pass.
fn checked_id(id: &str) -> Result<&str> {
    if !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        Ok(id)
    } else {
        Err(Error::Provider(format!("invalid resource id {id:?}")))
    }
}

#[async_trait]
impl PaymentProvider for MercadoPagoClient {
    async fn create_pix_payment(&self, request: &PixPaymentRequest) -> Result<PixCharge> {
        let body = CreatePaymentBody {
            transaction_amount: request.amount.round_dp(2),
            description: &request.description,
            external_reference: &request.external_reference,
            notification_url: request.notification_url.as_deref(),
            payment_method_id: "pix",
            payer: PayerBody {
                email: &request.payer.email,
                first_name: &request.payer.first_name,
                last_name: &request.payer.last_name,
                identification: Identification {
                    kind: "CPF",
                    number: &request.payer.cpf,
                },
            },
        };

        debug!(
            "Creating PIX charge {} for {}",
            request.external_reference, request.amount
        );

        let http_request = self
            .http
            .post(self.url("/v1/payments"))
            .header("X-Idempotency-Key", &request.idempotency_key)
            .json(&body);
        let payment: PaymentResponse = self.send_json(http_request, "payment creation").await?;

        let payment_id = super::resource_id(&payment.id)
            .ok_or_else(|| Error::Provider("payment creation returned no id".to_string()))?;

        let transaction_data = payment
            .point_of_interaction
            .and_then(|poi| poi.transaction_data);
        let (qr_code, qr_code_base64) = match transaction_data {
            Some(data) => (data.qr_code, data.qr_code_base64),
            None => (None, None),
        };

        info!("PIX charge {payment_id} created ({})", payment.status);

        Ok(PixCharge {
            payment_id,
            status: payment.status,
            qr_code,
            qr_code_base64,
        })
    }

    async fn get_payment(&self, payment_id: &str) -> Result<PaymentDetails> {
        let id = checked_id(payment_id)?;
        let request = self
            .http
            .get(self.url(&format!("/v1/payments/{id}")))
            .header(CACHE_CONTROL, "no-cache");
        let payment: PaymentResponse = self.send_json(request, "payment lookup").await?;

        if payment.status.is_empty() {
            return Err(Error::Provider(format!("payment {id} has no status")));
        }

        debug!("Payment {id} is {}", payment.status);
        Ok(PaymentDetails {
            status: payment.status,
            transaction_amount: payment.transaction_amount,
        })
    }

    async fn get_order(&self, order_id: &str) -> Result<OrderDetails> {
        let id = checked_id(order_id)?;
        let request = self
            .http
            .get(self.url(&format!("/v1/orders/{id}")))
            .header(CACHE_CONTROL, "no-cache");
        let order: OrderResponse = self.send_json(request, "order lookup").await?;

        if order.status.is_empty() {
            return Err(Error::Provider(format!("order {id} has no status")));
        }

        debug!("Order {id} is {}", order.status);
        Ok(OrderDetails {
            status: order.status,
            total_amount: order.total_amount,
        })
    }
}
