//! Liveness and ledger status

use axum::{extract::State, Json};
use serde::Serialize;

use crate::services::LedgerStatus;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub data_dir: String,
    pub ledger: LedgerStatus,
}

/// Reports the server version, where records are written, and ledger counts
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        data_dir: state.config.storage.data_dir.clone(),
        ledger: state.inventory.status().await,
    })
}
