//! Configuration for raffle-service.

use crate::numbers::DrawRules;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Payment provider configuration.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Persistence backend configuration.
    #[serde(default)]
    pub store: StoreConfig,

    /// Webhook configuration.
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Draw rules (numbers per combination, pool size).
    #[serde(default)]
    pub rules: DrawRules,

    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on (port 0 for auto-select).
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
}

/// Payment provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Access token (bearer).
    #[serde(default)]
    pub access_token: String,

    /// URL the provider posts notifications to.
    #[serde(default)]
    pub notification_url: Option<String>,

    /// Timeout for provider calls in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Name shown in charge descriptions.
    #[serde(default = "default_raffle_name")]
    pub raffle_name: String,

    /// Prefix for external references and idempotency keys.
    #[serde(default = "default_reference_prefix")]
    pub reference_prefix: String,

    /// Payer e-mail used when the participant left it blank.
    #[serde(default = "default_fallback_email")]
    pub fallback_email: String,

    /// Payer last name used when the participant typed a single name.
    #[serde(default = "default_fallback_last_name")]
    pub fallback_last_name: String,
}

/// Persistence backend configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the hosted REST backend. In-memory storage when unset.
    #[serde(default)]
    pub url: Option<String>,

    /// API key sent as `apikey` and bearer token.
    #[serde(default)]
    pub api_key: String,
}

/// Webhook configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Shared secret for notification signatures.
    #[serde(default)]
    pub secret: String,

    /// Reject notifications whose signature does not match.
    ///
    /// Off by default: mismatches are only logged.
    #[serde(default)]
    pub enforce_signature: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level / filter directive.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            access_token: String::new(),
            notification_url: None,
            timeout_secs: default_timeout_secs(),
            raffle_name: default_raffle_name(),
            reference_prefix: default_reference_prefix(),
            fallback_email: default_fallback_email(),
            fallback_last_name: default_fallback_last_name(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl ProviderConfig {
    /// Timeout applied to every provider call.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_api_base() -> String {
    "https://api.mercadopago.com".to_string()
}

const fn default_timeout_secs() -> u64 {
    10
}

fn default_raffle_name() -> String {
    "Mega TUPÃ".to_string()
}

fn default_reference_prefix() -> String {
    "TUPA".to_string()
}

fn default_fallback_email() -> String {
    "financeiro@tupa.com".to_string()
}

fn default_fallback_last_name() -> String {
    "TUPÃ".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ServiceConfig {
    /// Default location of the configuration file.
    #[must_use]
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("", "", "raffle-service")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("raffle-service.toml"))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Save configuration to a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn to_file(&self, path: &std::path::Path) -> crate::Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check values that would make the service misbehave.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] for unusable draw rules or when
    /// signature enforcement is requested without a secret.
    pub fn validate(&self) -> crate::Result<()> {
        if self.rules.pick_size == 0 || self.rules.pool_size == 0 {
            return Err(crate::Error::Config(
                "rules.pick_size and rules.pool_size must be positive".to_string(),
            ));
        }
        if usize::try_from(self.rules.pool_size).is_ok_and(|pool| self.rules.pick_size > pool) {
            return Err(crate::Error::Config(format!(
                "rules.pick_size ({}) exceeds rules.pool_size ({})",
                self.rules.pick_size, self.rules.pool_size
            )));
        }
        if self.webhook.enforce_signature && self.webhook.secret.is_empty() {
            return Err(crate::Error::Config(
                "webhook.enforce_signature requires webhook.secret".to_string(),
            ));
        }
        Ok(())
    }
}
