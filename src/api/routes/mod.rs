//! API route handlers

pub mod admin;
pub mod health;
pub mod purchase;
pub mod tickets;
pub mod webhook;

use axum::{
    routing::{any, get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::api::state::AppState;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/settings", get(health::get_settings))
        // Tickets
        .route("/tickets/:document", get(tickets::lookup_tickets))
        .route("/quick-pick", get(tickets::quick_pick))
        .route("/purchases", post(purchase::create_purchase))
        // Administration
        .route("/registrations", get(admin::list_registrations))
        .route("/summary", get(admin::sales_summary))
        // Provider notifications
        .route("/webhooks/payments", any(webhook::payment_notification))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
