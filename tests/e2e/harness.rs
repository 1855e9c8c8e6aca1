//! Test harness wiring the router to in-memory collaborators.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::http::{HeaderName, HeaderValue};
use axum_test::{TestRequest, TestServer};
use chrono::Utc;
use raffle_service::api::{create_router, AppState};
use raffle_service::config::ServiceConfig;
use raffle_service::event::{create_event_channel, ServiceEventsChannel};
use raffle_service::model::Registration;
use raffle_service::provider::ScriptedProvider;
use raffle_service::store::MemoryStore;
use raffle_service::webhook::{manifest, sign};
use raffle_service::PaymentStatus;
use rust_decimal::Decimal;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Webhook secret configured in every harness.
pub const WEBHOOK_SECRET: &str = "e2e-webhook-secret";

/// Valid CPF used across the tests.
pub const CPF: &str = "52998224725";

/// Router plus handles on its collaborators.
pub struct TestHarness {
    /// HTTP test server.
    pub server: TestServer,
    /// Scripted payment provider.
    pub provider: Arc<ScriptedProvider>,
    /// In-memory store.
    pub store: MemoryStore,
    /// Service events.
    pub events: ServiceEventsChannel,
    next_record: AtomicU64,
}

impl TestHarness {
    /// Harness with default configuration.
    pub fn setup() -> Self {
        Self::setup_with_config(ServiceConfig::default())
    }

    /// Harness with custom configuration. The webhook secret is always set.
    pub fn setup_with_config(mut config: ServiceConfig) -> Self {
        config.webhook.secret = WEBHOOK_SECRET.to_string();
        config.provider.timeout_secs = 1;

        let provider = Arc::new(ScriptedProvider::new());
        let store = MemoryStore::new();
        let (events_tx, events) = create_event_channel();

        let state = AppState::new(
            &config,
            provider.clone(),
            Arc::new(store.clone()),
            events_tx,
        );
        let server = TestServer::new(create_router(state)).expect("test server");

        Self {
            server,
            provider,
            store,
            events,
            next_record: AtomicU64::new(1),
        }
    }

    /// Store a registration directly, bypassing checkout.
    pub fn insert_registration(
        &self,
        cpf: &str,
        payment_id: &str,
        status: PaymentStatus,
        numbers: Value,
    ) -> String {
        let n = self.next_record.fetch_add(1, Ordering::Relaxed);
        let id = format!("rec-{n}");
        self.store.insert_raw(Registration {
            id: id.clone(),
            registration_number: n,
            full_name: "Maria Souza".to_string(),
            cpf: cpf.to_string(),
            phone: "11999990000".to_string(),
            email: "maria@example.com".to_string(),
            photo_url: Some("https://cdn.example.com/p.jpg".to_string()),
            chosen_numbers: numbers,
            payment_id: payment_id.to_string(),
            payment_status: status,
            total_amount: Decimal::new(999, 2),
            referral_code: None,
            created_at: Utc::now(),
        });
        id
    }

    /// Stored status of a registration.
    pub fn status_of(&self, id: &str) -> PaymentStatus {
        self.store.get(id).expect("registration exists").payment_status
    }
}

/// Add provider-style signature headers for `data_id` to a request.
pub fn with_signature(request: TestRequest, data_id: &str, request_id: &str, secret: &str) -> TestRequest {
    let ts = "1704908010";
    let v1 = sign(secret, &manifest(data_id, request_id, ts));
    request
        .add_header(
            HeaderName::from_static("x-signature"),
            HeaderValue::from_str(&format!("ts={ts},v1={v1}")).unwrap(),
        )
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_str(request_id).unwrap(),
        )
        .add_query_param("data.id", data_id)
}
