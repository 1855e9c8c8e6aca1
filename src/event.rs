//! Service event system.
//!
//! Collaborators (admin screens, ticket pages) subscribe to learn that a
//! record changed and re-fetch it.

use tokio::sync::broadcast;

/// Which path confirmed a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalSource {
    /// A participant looked up their tickets.
    Lookup,
    /// The provider sent a notification.
    Webhook,
}

/// Events emitted by the service.
#[derive(Debug, Clone)]
pub enum ServiceEvent {
    /// Service has started successfully.
    Started,

    /// Service is shutting down.
    ShuttingDown,

    /// A checkout created a pending registration.
    TicketsPurchased {
        /// Provider payment identifier.
        payment_id: String,
        /// Number of combinations bought.
        tickets: usize,
    },

    /// A registration moved to `approved`.
    PaymentApproved {
        /// Provider payment identifier.
        payment_id: String,
        /// Path that performed the update.
        source: ApprovalSource,
    },

    /// A webhook arrived with a signature that did not match.
    SignatureMismatch {
        /// Resource id from the query string.
        data_id: String,
        /// Request id header.
        request_id: String,
    },

    /// Error occurred.
    Error {
        /// Error message.
        message: String,
    },
}

/// Channel for receiving service events.
pub type ServiceEventsChannel = broadcast::Receiver<ServiceEvent>;

/// Sender for service events.
pub type ServiceEventsSender = broadcast::Sender<ServiceEvent>;

/// Create a new event channel pair.
#[must_use]
pub fn create_event_channel() -> (ServiceEventsSender, ServiceEventsChannel) {
    broadcast::channel(256)
}
