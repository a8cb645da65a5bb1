//! Blood Bank Inventory - Backend Server
//!
//! Hosts the inventory ledger and alert engine behind a JSON API, persisting
//! ledger records as JSON files.

use axum::{routing::get, Router};
use chrono::Utc;
use shared::demo::seed_demo_data;
use shared::ledger::{InventoryLedger, PersistenceSink};
use std::{sync::Arc, time::Duration};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod handlers;
mod models;
mod routes;
mod services;

pub use config::Config;
use services::{spawn_writer, InventoryService, JsonFileStore};

/// How often expiry alerts are re-evaluated while idle
const ALERT_REFRESH_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// How long shutdown waits for pending ledger writes
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub inventory: InventoryService,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blood_bank_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::load()?;

    tracing::info!("Starting Blood Bank Inventory Server");
    tracing::info!("Environment: {}", config.environment);

    // Restore the ledger
    let store = JsonFileStore::new(&config.storage.data_dir);
    let snapshot = store.load(config.inventory.default_threshold).await?;
    let mut ledger = InventoryLedger::from_snapshot(snapshot, config.inventory.alert_settings());

    let now = Utc::now();
    let seeded = config.storage.seed_demo_data
        && ledger.batches().is_empty()
        && ledger.list_usage_events().is_empty();
    if seeded {
        tracing::info!("Seeding demo inventory...");
        seed_demo_data(&mut ledger, now)?;
    }
    let raised = ledger.refresh_alerts(now).len();

    // Attach persistence
    let (sink, writer) = spawn_writer(store);
    if seeded || raised > 0 {
        if let Err(e) = sink.persist(&ledger.snapshot()) {
            tracing::warn!(error = %e, "Failed to queue initial ledger write");
        }
    }
    let ledger = ledger.with_sink(sink);

    // Create application state
    let state = AppState {
        inventory: InventoryService::new(ledger, config.inventory.storage_capacity),
        config: Arc::new(config.clone()),
    };

    let refresher = tokio::spawn(refresh_alerts_periodically(state.inventory.clone()));

    // Build application
    let app = create_app(state.clone());

    // Start server
    let addr = config.socket_addr();
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Dropping the last ledger handle closes the writer's queue
    refresher.abort();
    let _ = refresher.await;
    drop(state);
    match tokio::time::timeout(WRITER_DRAIN_TIMEOUT, writer).await {
        Ok(result) => result?,
        Err(_) => tracing::warn!("Timed out waiting for pending ledger writes"),
    }

    tracing::info!("Server stopped");
    Ok(())
}

/// Create the application router with all routes and middleware
fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn refresh_alerts_periodically(inventory: InventoryService) {
    let mut interval = tokio::time::interval(ALERT_REFRESH_INTERVAL);
    // The first tick completes immediately and startup has already scanned
    interval.tick().await;
    loop {
        interval.tick().await;
        let raised = inventory.refresh_alerts(Utc::now()).await;
        tracing::debug!(raised, "Periodic alert scan");
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Root endpoint
async fn root() -> &'static str {
    "Blood Bank Inventory API v1.0"
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    fn app() -> Router {
        let state = AppState {
            inventory: InventoryService::new(InventoryLedger::default(), 500),
            config: Arc::new(Config::default()),
        };
        create_app(state)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(resp: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn batch_body(units: i64) -> Value {
        json!({
            "donor_name": "Kwame Asante",
            "donor_phone": "0241234567",
            "blood_type": "O+",
            "units_collected": units,
            "collection_date": Utc::now().date_naive().to_string(),
        })
    }

    #[tokio::test]
    async fn health_ok() {
        let resp = app().oneshot(get_request("/api/v1/health")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["ledger"]["batches"], 0);
        assert_eq!(body["ledger"]["threshold"], 20);
    }

    #[tokio::test]
    async fn add_then_list_batches() {
        let app = app();
        let resp = app
            .clone()
            .oneshot(json_request("POST", "/api/v1/batches", batch_body(4)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created = body_json(resp).await;
        assert_eq!(created["units_remaining"], 4);

        let resp = app
            .clone()
            .oneshot(get_request("/api/v1/batches?blood_type=O%2B"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let listed = body_json(resp).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["expiry_status"], "safe");

        let resp = app
            .oneshot(get_request("/api/v1/batches?blood_type=A-"))
            .await
            .unwrap();
        assert_eq!(body_json(resp).await.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn invalid_batch_is_400_with_field() {
        let resp = app()
            .oneshot(json_request("POST", "/api/v1/batches", batch_body(0)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["field"], "units_collected");
    }

    #[tokio::test]
    async fn overdraw_is_422_with_available() {
        let app = app();
        app.clone()
            .oneshot(json_request("POST", "/api/v1/batches", batch_body(18)))
            .await
            .unwrap();

        let resp = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/usage",
                json!({ "blood_type": "O+", "units": 25, "reason": "Emergency" }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(resp).await;
        assert_eq!(body["error"]["code"], "INSUFFICIENT_STOCK");
        assert_eq!(body["error"]["available"], 18);

        let resp = app.oneshot(get_request("/api/v1/usage")).await.unwrap();
        assert_eq!(body_json(resp).await.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn consume_returns_receipt() {
        let app = app();
        app.clone()
            .oneshot(json_request("POST", "/api/v1/batches", batch_body(18)))
            .await
            .unwrap();

        let resp = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/usage",
                json!({ "blood_type": "O+", "units": 5, "reason": "Surgery" }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let receipt = body_json(resp).await;
        assert_eq!(receipt["event"]["units_used"], 5);
        assert_eq!(receipt["draws"][0]["units"], 5);

        let resp = app.oneshot(get_request("/api/v1/metrics/stock")).await.unwrap();
        let stock = body_json(resp).await;
        assert_eq!(stock[0]["blood_type"], "O+");
        assert_eq!(stock[0]["units"], 13);
        assert_eq!(stock[0]["level"], "low");
    }

    #[tokio::test]
    async fn threshold_roundtrip_and_validation() {
        let app = app();
        let resp = app
            .clone()
            .oneshot(json_request("PUT", "/api/v1/settings/threshold", json!({ "threshold": -1 })))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = app
            .clone()
            .oneshot(json_request("PUT", "/api/v1/settings/threshold", json!({ "threshold": 30 })))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app
            .oneshot(get_request("/api/v1/settings/threshold"))
            .await
            .unwrap();
        assert_eq!(body_json(resp).await["threshold"], 30);
    }

    #[tokio::test]
    async fn acknowledge_flow() {
        let app = app();
        app.clone()
            .oneshot(json_request("POST", "/api/v1/batches", batch_body(5)))
            .await
            .unwrap();

        let resp = app
            .clone()
            .oneshot(get_request("/api/v1/alerts?unread=true"))
            .await
            .unwrap();
        let alerts = body_json(resp).await;
        assert_eq!(alerts.as_array().unwrap().len(), 1);
        assert_eq!(alerts[0]["kind"], "low_stock");
        let id = alerts[0]["id"].as_str().unwrap().to_string();

        let uri = format!("/api/v1/alerts/{}/acknowledge", id);
        let resp = app
            .clone()
            .oneshot(json_request("POST", &uri, json!({})))
            .await
            .unwrap();
        assert_eq!(body_json(resp).await["acknowledged"], true);

        let resp = app
            .clone()
            .oneshot(json_request("POST", &uri, json!({})))
            .await
            .unwrap();
        assert_eq!(body_json(resp).await["acknowledged"], false);

        let uri = format!("/api/v1/alerts/{}/acknowledge", Uuid::new_v4());
        let resp = app.oneshot(json_request("POST", &uri, json!({}))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["acknowledged"], false);
    }

    #[tokio::test]
    async fn unknown_batch_is_404() {
        let uri = format!("/api/v1/batches/{}", Uuid::new_v4());
        let resp = app().oneshot(get_request(&uri)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn report_windows_are_validated() {
        let resp = app()
            .oneshot(get_request("/api/v1/metrics/usage/daily?days=0"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = app()
            .oneshot(get_request("/api/v1/metrics/usage/daily?days=3"))
            .await
            .unwrap();
        assert_eq!(body_json(resp).await.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn malformed_query_values_return_json_errors() {
        let resp = app()
            .oneshot(get_request("/api/v1/metrics/usage/daily?days=abc"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["field"], "days");

        let resp = app()
            .oneshot(get_request("/api/v1/alerts?unread=maybe"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["error"]["field"], "unread");
    }

    #[tokio::test]
    async fn dashboard_shape() {
        let resp = app()
            .oneshot(get_request("/api/v1/metrics/dashboard"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["total_units"], 0);
        assert_eq!(body["storage"]["capacity"], 500);
        assert_eq!(body["shortage"]["risk"], "high");
        assert_eq!(body["threshold"], 20);
    }
}
