//! Command-line interface definition.

use raffle_service::config::ServiceConfig;
use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Environment variables holding secrets. They are never taken as flags.
const ENV_ACCESS_TOKEN: &str = "RAFFLE_PROVIDER_TOKEN";
const ENV_STORE_API_KEY: &str = "RAFFLE_STORE_API_KEY";
const ENV_WEBHOOK_SECRET: &str = "RAFFLE_WEBHOOK_SECRET";

/// Ticket sales backend for a PIX-paid raffle.
#[derive(Parser, Debug)]
#[command(name = "raffle-service")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Address to listen on.
    #[arg(long, short, env = "RAFFLE_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Payment provider API base URL.
    #[arg(long, env = "RAFFLE_PROVIDER_API")]
    pub provider_api: Option<String>,

    /// Public URL the provider should send notifications to.
    #[arg(long, env = "RAFFLE_NOTIFICATION_URL")]
    pub notification_url: Option<String>,

    /// Hosted store base URL (in-memory store when unset).
    #[arg(long, env = "RAFFLE_STORE_URL")]
    pub store_url: Option<String>,

    /// Reject webhook notifications whose signature does not match.
    #[arg(long, env = "RAFFLE_ENFORCE_SIGNATURE")]
    pub enforce_signature: bool,

    /// Log level.
    #[arg(long, env = "RUST_LOG")]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long, env = "RAFFLE_LOG_JSON")]
    pub log_json: bool,

    /// Path to configuration file.
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Convert CLI arguments into a `ServiceConfig`.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file is specified but cannot be loaded.
    pub fn into_config(self) -> color_eyre::Result<ServiceConfig> {
        // Start with the given file, the default file if present, or defaults
        let mut config = match self.config {
            Some(ref path) => ServiceConfig::from_file(path)?,
            None => {
                let path = ServiceConfig::default_path();
                if path.exists() {
                    ServiceConfig::from_file(&path)?
                } else {
                    ServiceConfig::default()
                }
            }
        };

        // Override with CLI arguments
        if let Some(listen) = self.listen {
            config.server.listen = listen;
        }
        if let Some(api) = self.provider_api {
            config.provider.api_base = api;
        }
        if self.notification_url.is_some() {
            config.provider.notification_url = self.notification_url;
        }
        if self.store_url.is_some() {
            config.store.url = self.store_url;
        }
        if self.enforce_signature {
            config.webhook.enforce_signature = true;
        }
        if let Some(level) = self.log_level {
            config.log.level = level;
        }
        if self.log_json {
            config.log.json = true;
        }

        // Secrets
        if let Ok(token) = std::env::var(ENV_ACCESS_TOKEN) {
            config.provider.access_token = token;
        }
        if let Ok(key) = std::env::var(ENV_STORE_API_KEY) {
            config.store.api_key = key;
        }
        if let Ok(secret) = std::env::var(ENV_WEBHOOK_SECRET) {
            config.webhook.secret = secret;
        }

        Ok(config)
    }
}
