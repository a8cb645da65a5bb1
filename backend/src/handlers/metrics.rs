//! HTTP handlers for inventory metrics

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use shared::ledger::metrics::{
    DailyUsage, ReasonUsage, ShortageReport, StorageUtilization, TypeStock, EXPIRING_SOON_DAYS,
};

use crate::error::AppResult;
use crate::models::{DashboardResponse, DaysQuery, ExpiringBatch, DEFAULT_USAGE_DAYS};
use crate::AppState;

/// Dashboard summary cards
pub async fn get_dashboard(State(state): State<AppState>) -> AppResult<Json<DashboardResponse>> {
    Ok(Json(state.inventory.dashboard(Utc::now()).await))
}

/// Units on hand per blood type
pub async fn get_stock_summary(State(state): State<AppState>) -> AppResult<Json<Vec<TypeStock>>> {
    Ok(Json(state.inventory.stock_summary().await))
}

/// Batches expiring within `?days=` (default 7), soonest first
pub async fn get_expiring(
    State(state): State<AppState>,
    Query(query): Query<DaysQuery>,
) -> AppResult<Json<Vec<ExpiringBatch>>> {
    let days = query.days_or(EXPIRING_SOON_DAYS as u32)?;
    let batches = state
        .inventory
        .expiring_within(i64::from(days), Utc::now())
        .await;
    Ok(Json(batches))
}

/// Units used per day over the last `?days=` days
pub async fn get_daily_usage(
    State(state): State<AppState>,
    Query(query): Query<DaysQuery>,
) -> AppResult<Json<Vec<DailyUsage>>> {
    let days = query.days_or(DEFAULT_USAGE_DAYS)?;
    Ok(Json(state.inventory.usage_by_day(days, Utc::now()).await))
}

pub async fn get_usage_by_reason(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ReasonUsage>>> {
    Ok(Json(state.inventory.usage_by_reason().await))
}

pub async fn get_shortage_risk(State(state): State<AppState>) -> AppResult<Json<ShortageReport>> {
    Ok(Json(state.inventory.shortage_risk().await))
}

pub async fn get_storage(State(state): State<AppState>) -> AppResult<Json<StorageUtilization>> {
    Ok(Json(state.inventory.storage_utilization().await))
}
