//! Service assembly and lifecycle.

use crate::api::{create_router, AppState};
use crate::config::ServiceConfig;
use crate::error::{Error, Result};
use crate::event::{create_event_channel, ServiceEvent, ServiceEventsChannel, ServiceEventsSender};
use crate::provider::{MercadoPagoClient, PaymentProvider};
use crate::store::{MemoryStore, RegistrationStore, RestStore};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

/// Builder for constructing the service.
pub struct ServiceBuilder {
    config: ServiceConfig,
    provider: Option<Arc<dyn PaymentProvider>>,
    store: Option<Arc<dyn RegistrationStore>>,
}

impl ServiceBuilder {
    /// Create a new service builder with the given configuration.
    #[must_use]
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config,
            provider: None,
            store: None,
        }
    }

    /// Use this provider instead of the configured HTTP client.
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn PaymentProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Use this store instead of the configured backend.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn RegistrationStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Build the service and bind its listener.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, a client cannot be
    /// built or the listen address cannot be bound.
    pub async fn build(self) -> Result<RunningService> {
        info!("Building raffle-service with config: {:?}", self.config.server);
        self.config.validate()?;

        let provider = match self.provider {
            Some(provider) => provider,
            None => Arc::new(MercadoPagoClient::new(&self.config.provider)?),
        };

        let store: Arc<dyn RegistrationStore> = match (self.store, &self.config.store.url) {
            (Some(store), _) => store,
            (None, Some(url)) => {
                info!("Using hosted store at {url}");
                Arc::new(RestStore::new(
                    url,
                    &self.config.store,
                    self.config.provider.timeout(),
                )?)
            }
            (None, None) => {
                warn!("No store URL configured - registrations are kept in memory only");
                Arc::new(MemoryStore::new())
            }
        };

        // Create shutdown channel
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        // Create event channel
        let (events_tx, events_rx) = create_event_channel();

        let state = AppState::new(&self.config, provider, store, events_tx.clone());
        let router = create_router(state);

        let listener = TcpListener::bind(self.config.server.listen).await?;
        let local_addr = listener.local_addr()?;

        Ok(RunningService {
            local_addr,
            listener: Some(listener),
            router: Some(router),
            shutdown_tx,
            shutdown_rx,
            events_tx,
            events_rx: Some(events_rx),
        })
    }
}

/// A bound, not yet serving, service.
pub struct RunningService {
    local_addr: SocketAddr,
    listener: Option<TcpListener>,
    router: Option<Router>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    events_tx: ServiceEventsSender,
    events_rx: Option<ServiceEventsChannel>,
}

impl RunningService {
    /// Address the listener is bound to.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Get a receiver for service events.
    ///
    /// Note: Can only be called once. Subsequent calls return None.
    pub fn events(&mut self) -> Option<ServiceEventsChannel> {
        self.events_rx.take()
    }

    /// Subscribe to service events.
    #[must_use]
    pub fn subscribe_events(&self) -> ServiceEventsChannel {
        self.events_tx.subscribe()
    }

    /// A handle that stops the service when sent `true`.
    #[must_use]
    pub fn shutdown_handle(&self) -> watch::Sender<bool> {
        self.shutdown_tx.clone()
    }

    /// Serve requests until shutdown is requested or Ctrl-C arrives.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails or has already run.
    pub async fn run(&mut self) -> Result<()> {
        let (Some(listener), Some(router)) = (self.listener.take(), self.router.take()) else {
            return Err(Error::Config("service has already run".to_string()));
        };

        info!("raffle-service listening on {}", self.local_addr);
        let _ = self.events_tx.send(ServiceEvent::Started);

        let mut shutdown_rx = self.shutdown_rx.clone();
        let signal = async move {
            loop {
                tokio::select! {
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            info!("Shutdown signal received");
                            break;
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        info!("Ctrl-C received, initiating shutdown");
                        break;
                    }
                }
            }
        };

        let served = axum::serve(listener, router)
            .with_graceful_shutdown(signal)
            .await;

        let _ = self.events_tx.send(ServiceEvent::ShuttingDown);
        if let Err(e) = served {
            let _ = self.events_tx.send(ServiceEvent::Error {
                message: format!("server error: {e}"),
            });
            return Err(Error::Io(e));
        }

        info!("Service shutdown complete");
        Ok(())
    }

    /// Request the service to shut down.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}
