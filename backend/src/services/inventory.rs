//! Inventory service wrapping the shared ledger
//!
//! The ledger sits behind a single `RwLock`. Commands hold the write guard
//! for the whole command, so a mutation and the alert scan it triggers are
//! never interleaved with another request.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::ledger::metrics::{
    DailyUsage, DashboardSummary, ReasonUsage, ShortageReport, StorageUtilization, TypeStock,
};
use shared::ledger::InventoryLedger;
use shared::models::{
    AddBatchInput, Alert, Batch, BatchFilter, ConsumeInput, ConsumptionReceipt, UsageEvent,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{BatchView, DashboardResponse, ExpiringBatch};

/// Record counts reported by the health endpoint
#[derive(Debug, Clone, Serialize)]
pub struct LedgerStatus {
    pub batches: usize,
    pub usage_events: usize,
    pub unread_alerts: usize,
    pub threshold: u32,
}

/// Inventory service shared by every handler
#[derive(Clone)]
pub struct InventoryService {
    ledger: Arc<RwLock<InventoryLedger>>,
    storage_capacity: u32,
}

impl InventoryService {
    pub fn new(ledger: InventoryLedger, storage_capacity: u32) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(ledger)),
            storage_capacity,
        }
    }

    pub async fn status(&self) -> LedgerStatus {
        let ledger = self.ledger.read().await;
        LedgerStatus {
            batches: ledger.batches().len(),
            usage_events: ledger.list_usage_events().len(),
            unread_alerts: ledger.unread_alert_count(),
            threshold: ledger.threshold(),
        }
    }

    // ========================================================================
    // Batches
    // ========================================================================

    /// List batches matching the filter, in store order
    pub async fn list_batches(&self, filter: &BatchFilter, now: DateTime<Utc>) -> Vec<BatchView> {
        let ledger = self.ledger.read().await;
        let batches: Vec<BatchView> = ledger
            .list_batches(filter, now)
            .into_iter()
            .map(|b| BatchView::new(b, now))
            .collect();
        tracing::debug!(count = batches.len(), "Listed batches");
        batches
    }

    pub async fn get_batch(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<BatchView> {
        let ledger = self.ledger.read().await;
        ledger
            .batch(id)
            .map(|b| BatchView::new(b, now))
            .ok_or_else(|| AppError::NotFound(format!("Batch {}", id)))
    }

    pub async fn add_batch(&self, input: AddBatchInput, now: DateTime<Utc>) -> AppResult<Batch> {
        let mut ledger = self.ledger.write().await;
        Ok(ledger.add_batch(input, now)?)
    }

    // ========================================================================
    // Usage
    // ========================================================================

    pub async fn list_usage(&self) -> Vec<UsageEvent> {
        self.ledger.read().await.list_usage_events().to_vec()
    }

    pub async fn consume(&self, input: ConsumeInput, now: DateTime<Utc>) -> AppResult<ConsumptionReceipt> {
        let mut ledger = self.ledger.write().await;
        Ok(ledger.consume(input, now)?)
    }

    // ========================================================================
    // Alerts
    // ========================================================================

    pub async fn list_alerts(&self, unread_only: bool) -> Vec<Alert> {
        let ledger = self.ledger.read().await;
        if unread_only {
            ledger.alert_log().unread().cloned().collect()
        } else {
            ledger.list_alerts().to_vec()
        }
    }

    /// Acknowledge one alert; unknown ids are a no-op
    pub async fn acknowledge(&self, id: Uuid) -> bool {
        self.ledger.write().await.acknowledge(id)
    }

    pub async fn acknowledge_all(&self) -> usize {
        self.ledger.write().await.acknowledge_all()
    }

    /// Re-run the alert scan; expiry bands move as the clock advances
    pub async fn refresh_alerts(&self, now: DateTime<Utc>) -> usize {
        self.ledger.write().await.refresh_and_persist(now)
    }

    // ========================================================================
    // Settings
    // ========================================================================

    pub async fn threshold(&self) -> u32 {
        self.ledger.read().await.threshold()
    }

    pub async fn set_threshold(&self, value: i64, now: DateTime<Utc>) -> AppResult<u32> {
        let mut ledger = self.ledger.write().await;
        Ok(ledger.set_threshold(value, now)?)
    }

    // ========================================================================
    // Metrics
    // ========================================================================

    pub async fn dashboard(&self, now: DateTime<Utc>) -> DashboardResponse {
        let ledger = self.ledger.read().await;
        let metrics = ledger.metrics();
        let summary: DashboardSummary = metrics.dashboard(now, ledger.threshold());
        DashboardResponse {
            summary,
            storage: metrics.storage_utilization(self.storage_capacity),
            shortage: metrics.shortage_risk(),
            threshold: ledger.threshold(),
        }
    }

    pub async fn stock_summary(&self) -> Vec<TypeStock> {
        let ledger = self.ledger.read().await;
        ledger.metrics().stock_summary(ledger.threshold())
    }

    pub async fn expiring_within(&self, days: i64, now: DateTime<Utc>) -> Vec<ExpiringBatch> {
        let ledger = self.ledger.read().await;
        ledger
            .expiring_within(days, now)
            .into_iter()
            .map(|b| ExpiringBatch {
                days_left: b.days_until_expiry(now),
                batch: b.clone(),
            })
            .collect()
    }

    pub async fn usage_by_day(&self, days: u32, now: DateTime<Utc>) -> Vec<DailyUsage> {
        self.ledger
            .read()
            .await
            .metrics()
            .usage_by_day(now.date_naive(), days)
    }

    pub async fn usage_by_reason(&self) -> Vec<ReasonUsage> {
        self.ledger.read().await.metrics().usage_by_reason()
    }

    pub async fn shortage_risk(&self) -> ShortageReport {
        self.ledger.read().await.metrics().shortage_risk()
    }

    pub async fn storage_utilization(&self) -> StorageUtilization {
        self.ledger
            .read()
            .await
            .metrics()
            .storage_utilization(self.storage_capacity)
    }
}
