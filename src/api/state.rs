//! Application state for the API server

use crate::admin::Admin;
use crate::checkout::{Checkout, CheckoutConfig};
use crate::config::ServiceConfig;
use crate::error::Result;
use crate::event::ServiceEventsSender;
use crate::model::Settings;
use crate::numbers::DrawRules;
use crate::provider::PaymentProvider;
use crate::reconcile::{Reconciler, ReconcilerConfig};
use crate::store::RegistrationStore;
use crate::webhook::{WebhookProcessor, WebhookVerifier};
use std::sync::Arc;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// Ticket lookup with reconciliation.
    pub reconciler: Arc<Reconciler>,
    /// Notification processing.
    pub webhooks: Arc<WebhookProcessor>,
    /// Ticket purchase.
    pub checkout: Arc<Checkout>,
    /// Administration listing and summary.
    pub admin: Arc<Admin>,
    /// Registration store.
    pub store: Arc<dyn RegistrationStore>,
    /// Draw rules.
    pub rules: DrawRules,
    /// API version
    pub version: String,
}

impl AppState {
    /// Wire the service components around a provider and a store.
    #[must_use]
    pub fn new(
        config: &ServiceConfig,
        provider: Arc<dyn PaymentProvider>,
        store: Arc<dyn RegistrationStore>,
        events: ServiceEventsSender,
    ) -> Self {
        let timeout = config.provider.timeout();

        let reconciler = Reconciler::new(
            Arc::clone(&provider),
            Arc::clone(&store),
            config.rules,
            ReconcilerConfig {
                query_timeout: timeout,
            },
            events.clone(),
        );

        let webhooks = WebhookProcessor::new(
            Arc::clone(&provider),
            Arc::clone(&store),
            WebhookVerifier::new(config.webhook.secret.clone()),
            events.clone(),
        )
        .enforce_signature(config.webhook.enforce_signature)
        .query_timeout(timeout);

        let checkout = Checkout::new(
            provider,
            Arc::clone(&store),
            config.rules,
            CheckoutConfig::from(&config.provider),
            events,
        );

        Self {
            reconciler: Arc::new(reconciler),
            webhooks: Arc::new(webhooks),
            checkout: Arc::new(checkout),
            admin: Arc::new(Admin::new(Arc::clone(&store), config.rules)),
            store,
            rules: config.rules,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// The saved settings row, or defaults when none exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn current_settings(&self) -> Result<Settings> {
        Ok(self
            .store
            .load_settings()
            .await?
            .unwrap_or_else(|| Settings::defaults_for(&self.rules)))
    }
}
