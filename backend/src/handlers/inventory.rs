//! HTTP handlers for batch and usage endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{
    AddBatchInput, Batch, BatchQuery, BatchView, ConsumeInput, ConsumptionReceipt, UsageEvent,
};
use crate::AppState;

// ============================================================================
// Batches
// ============================================================================

/// List batches, optionally filtered by type, expiry status and donor name
pub async fn list_batches(
    State(state): State<AppState>,
    Query(query): Query<BatchQuery>,
) -> AppResult<Json<Vec<BatchView>>> {
    let filter = query.into_filter()?;
    let batches = state.inventory.list_batches(&filter, Utc::now()).await;
    Ok(Json(batches))
}

/// Get one batch
pub async fn get_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> AppResult<Json<BatchView>> {
    let batch = state.inventory.get_batch(batch_id, Utc::now()).await?;
    Ok(Json(batch))
}

/// Record a new collection
pub async fn add_batch(
    State(state): State<AppState>,
    Json(input): Json<AddBatchInput>,
) -> AppResult<(StatusCode, Json<Batch>)> {
    let batch = state.inventory.add_batch(input, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(batch)))
}

// ============================================================================
// Usage
// ============================================================================

/// List usage events, most recent first
pub async fn list_usage(State(state): State<AppState>) -> AppResult<Json<Vec<UsageEvent>>> {
    Ok(Json(state.inventory.list_usage().await))
}

/// Issue units of one blood type
pub async fn consume(
    State(state): State<AppState>,
    Json(input): Json<ConsumeInput>,
) -> AppResult<(StatusCode, Json<ConsumptionReceipt>)> {
    let receipt = state.inventory.consume(input, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}
