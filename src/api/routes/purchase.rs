//! Checkout endpoint

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::checkout::PurchaseReceipt;
use crate::model::Participant;

/// Purchase request
#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    /// Buyer details.
    pub participant: Participant,
    /// Chosen combinations.
    pub combinations: Vec<Vec<u32>>,
}

/// Create a PIX charge and a pending registration.
pub async fn create_purchase(
    State(state): State<AppState>,
    Json(request): Json<PurchaseRequest>,
) -> ApiResult<(StatusCode, Json<PurchaseReceipt>)> {
    let settings = state.current_settings().await?;
    let receipt = state
        .checkout
        .purchase(&request.participant, &request.combinations, &settings)
        .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}
