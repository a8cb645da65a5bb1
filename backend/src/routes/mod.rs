//! Route definitions for the Blood Bank Inventory API

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/batches", batch_routes())
        .nest("/usage", usage_routes())
        .nest("/alerts", alert_routes())
        .nest("/settings", settings_routes())
        .nest("/metrics", metrics_routes())
}

/// Batch (collection) routes
fn batch_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_batches).post(handlers::add_batch))
        .route("/:batch_id", get(handlers::get_batch))
}

/// Usage (consumption) routes
fn usage_routes() -> Router<AppState> {
    Router::new().route("/", get(handlers::list_usage).post(handlers::consume))
}

/// Alert routes
fn alert_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_alerts))
        .route("/acknowledge-all", post(handlers::acknowledge_all_alerts))
        .route("/:alert_id/acknowledge", post(handlers::acknowledge_alert))
}

/// Settings routes
fn settings_routes() -> Router<AppState> {
    Router::new().route(
        "/threshold",
        get(handlers::get_threshold).put(handlers::set_threshold),
    )
}

/// Metrics routes
fn metrics_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/stock", get(handlers::get_stock_summary))
        .route("/expiring", get(handlers::get_expiring))
        .route("/shortage", get(handlers::get_shortage_risk))
        .route("/storage", get(handlers::get_storage))
        .route("/usage/daily", get(handlers::get_daily_usage))
        .route("/usage/reasons", get(handlers::get_usage_by_reason))
}
