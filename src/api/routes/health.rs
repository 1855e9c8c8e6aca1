//! Health and read-only endpoints

use axum::{extract::State, Json};
use serde::Serialize;

use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::model::Settings;

/// Liveness response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `healthy` while the server answers.
    pub status: String,
    /// Crate version.
    pub version: String,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
    })
}

/// Current raffle settings
pub async fn get_settings(State(state): State<AppState>) -> ApiResult<Json<Settings>> {
    Ok(Json(state.current_settings().await?))
}
