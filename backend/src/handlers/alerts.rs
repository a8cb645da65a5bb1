//! HTTP handlers for alert endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{AcknowledgeAllResponse, AcknowledgeResponse, Alert, AlertQuery};
use crate::AppState;

/// List alerts, most recent first. `?unread=true` limits to unread alerts.
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(query): Query<AlertQuery>,
) -> AppResult<Json<Vec<Alert>>> {
    Ok(Json(state.inventory.list_alerts(query.unread_only()?).await))
}

/// Mark an alert read
pub async fn acknowledge_alert(
    State(state): State<AppState>,
    Path(alert_id): Path<Uuid>,
) -> AppResult<Json<AcknowledgeResponse>> {
    let acknowledged = state.inventory.acknowledge(alert_id).await;
    Ok(Json(AcknowledgeResponse {
        id: alert_id,
        acknowledged,
    }))
}

/// Mark every alert read
pub async fn acknowledge_all_alerts(
    State(state): State<AppState>,
) -> AppResult<Json<AcknowledgeAllResponse>> {
    let acknowledged = state.inventory.acknowledge_all().await;
    Ok(Json(AcknowledgeAllResponse { acknowledged }))
}
