//! Hosted backend store speaking PostgREST conventions.

use super::RegistrationStore;
use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::model::{NewRegistration, Registration, Settings};
use crate::status::PaymentStatus;
use async_trait::async_trait;
use reqwest::RequestBuilder;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

const REGISTRATIONS: &str = "registrations";
const SETTINGS: &str = "app_settings";

/// Registration store backed by a hosted REST backend.
pub struct RestStore {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct StatusPatch<'a> {
    payment_status: &'a PaymentStatus,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    total_amount: Option<Decimal>,
}

impl RestStore {
    /// Create a store for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, config: &StoreConfig, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build store client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn table(&self, name: &str) -> String {
        format!("{}/rest/v1/{name}", self.base_url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| Error::Store(format!("{what} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Store(format!("{what} returned {status}: {body}")));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::Store(format!("{what} returned a malformed body: {e}")))
    }
}

/// `or=(cpf.eq."a",cpf.eq."b")` filter matching any of the documents.
fn documents_filter(documents: &[String]) -> String {
    let clauses: Vec<String> = documents
        .iter()
        .map(|d| format!("cpf.eq.\"{}\"", d.replace('"', "")))
        .collect();
    format!("({})", clauses.join(","))
}

#[async_trait]
impl RegistrationStore for RestStore {
    async fn insert(&self, registration: NewRegistration) -> Result<Registration> {
        let request = self
            .http
            .post(self.table(REGISTRATIONS))
            .header("Prefer", "return=representation")
            .json(&registration);

        let mut rows: Vec<Registration> = self.fetch(request, "registration insert").await?;
        rows.pop()
            .ok_or_else(|| Error::Store("registration insert returned no row".to_string()))
    }

    async fn find_by_documents(&self, documents: &[String]) -> Result<Vec<Registration>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let request = self.http.get(self.table(REGISTRATIONS)).query(&[
            ("select", "*".to_string()),
            ("or", documents_filter(documents)),
            ("order", "created_at.desc".to_string()),
        ]);

        let rows: Vec<Registration> = self.fetch(request, "registration lookup").await?;
        debug!("Found {} registrations for document lookup", rows.len());
        Ok(rows)
    }

    async fn list_all(&self) -> Result<Vec<Registration>> {
        let request = self
            .http
            .get(self.table(REGISTRATIONS))
            .query(&[("select", "*"), ("order", "created_at.desc")]);

        let rows: Vec<Registration> = self.fetch(request, "registration listing").await?;
        debug!("Listed {} registrations", rows.len());
        Ok(rows)
    }

    async fn mark_approved(&self, id: &str) -> Result<()> {
        let patch = StatusPatch {
            payment_status: &PaymentStatus::Approved,
            total_amount: None,
        };
        let request = self
            .http
            .patch(self.table(REGISTRATIONS))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(&patch);

        let _rows: Vec<serde_json::Value> = self.fetch(request, "status update").await?;
        Ok(())
    }

    async fn settle_by_payment_id(&self, payment_id: &str, amount: Option<Decimal>) -> Result<u64> {
        let patch = StatusPatch {
            payment_status: &PaymentStatus::Approved,
            total_amount: amount,
        };
        let request = self
            .http
            .patch(self.table(REGISTRATIONS))
            .query(&[("payment_id", format!("eq.{payment_id}"))])
            .header("Prefer", "return=representation")
            .json(&patch);

        let rows: Vec<serde_json::Value> = self.fetch(request, "settlement").await?;
        Ok(u64::try_from(rows.len()).unwrap_or(u64::MAX))
    }

    async fn load_settings(&self) -> Result<Option<Settings>> {
        let request = self
            .http
            .get(self.table(SETTINGS))
            .query(&[("select", "*"), ("id", "eq.1")]);

        let mut rows: Vec<Settings> = self.fetch(request, "settings lookup").await?;
        Ok(rows.pop())
    }
}
