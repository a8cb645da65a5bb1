//! HTTP handlers for ledger settings

use axum::{extract::State, Json};
use chrono::Utc;

use crate::error::AppResult;
use crate::models::{ThresholdInput, ThresholdResponse};
use crate::AppState;

/// Get the low-stock threshold
pub async fn get_threshold(State(state): State<AppState>) -> AppResult<Json<ThresholdResponse>> {
    let threshold = state.inventory.threshold().await;
    Ok(Json(ThresholdResponse { threshold }))
}

/// Update the low-stock threshold; alerts are re-evaluated against it
pub async fn set_threshold(
    State(state): State<AppState>,
    Json(input): Json<ThresholdInput>,
) -> AppResult<Json<ThresholdResponse>> {
    let threshold = state
        .inventory
        .set_threshold(input.threshold, Utc::now())
        .await?;
    Ok(Json(ThresholdResponse { threshold }))
}
