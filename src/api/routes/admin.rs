//! Read-only administration endpoints

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::debug;

use crate::admin::{RegistrationEntry, SalesSummary};
use crate::api::error::ApiResult;
use crate::api::state::AppState;

/// Registration listing response
#[derive(Debug, Serialize)]
pub struct RegistrationsResponse {
    /// Registrations, newest first.
    pub registrations: Vec<RegistrationEntry>,
}

/// List every registration with its normalized combinations.
pub async fn list_registrations(
    State(state): State<AppState>,
) -> ApiResult<Json<RegistrationsResponse>> {
    let registrations = state.admin.registrations().await?;
    debug!("Returning {} registrations", registrations.len());
    Ok(Json(RegistrationsResponse { registrations }))
}

/// Revenue by status and the number of combinations sold.
pub async fn sales_summary(State(state): State<AppState>) -> ApiResult<Json<SalesSummary>> {
    Ok(Json(state.admin.summary().await?))
}
