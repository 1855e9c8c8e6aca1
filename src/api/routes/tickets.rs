//! Ticket lookup and quick-pick endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::document::{self, CPF_LEN};
use crate::reconcile::TicketView;
use crate::tickets;

/// Most combinations a single quick-pick request may ask for.
pub const MAX_QUICK_PICKS: usize = 50;

/// Lookup response
#[derive(Debug, Serialize)]
pub struct TicketsResponse {
    /// Masked document.
    pub document: String,
    /// Registrations, newest first.
    pub tickets: Vec<TicketView>,
}

/// Look up a participant's tickets by CPF, reconciling pending payments.
pub async fn lookup_tickets(
    State(state): State<AppState>,
    Path(raw_document): Path<String>,
) -> ApiResult<Json<TicketsResponse>> {
    let clean = document::digits_only(&raw_document);
    if clean.len() != CPF_LEN {
        return Err(ApiError::BadRequest(format!(
            "document must have {CPF_LEN} digits"
        )));
    }

    let tickets = state.reconciler.lookup(&clean).await?;
    debug!("Returning {} registrations", tickets.len());

    Ok(Json(TicketsResponse {
        document: document::mask_cpf(&clean),
        tickets,
    }))
}

/// Quick-pick query
#[derive(Debug, Deserialize)]
pub struct QuickPickQuery {
    /// Combinations to generate.
    #[serde(default = "default_count")]
    pub count: usize,
}

const fn default_count() -> usize {
    1
}

/// Quick-pick response
#[derive(Debug, Serialize)]
pub struct QuickPickResponse {
    /// Sorted combinations.
    pub combinations: Vec<Vec<u32>>,
}

/// Generate random combinations under the configured draw rules.
pub async fn quick_pick(
    State(state): State<AppState>,
    Query(query): Query<QuickPickQuery>,
) -> ApiResult<Json<QuickPickResponse>> {
    if query.count == 0 || query.count > MAX_QUICK_PICKS {
        return Err(ApiError::BadRequest(format!(
            "count must be between 1 and {MAX_QUICK_PICKS}"
        )));
    }

    let mut rng = rand::thread_rng();
    let combinations = (0..query.count)
        .map(|_| tickets::quick_pick(&state.rules, &mut rng))
        .collect();

    Ok(Json(QuickPickResponse { combinations }))
}
