//! Inventory ledger
//!
//! Owns the batch store, the usage ledger and the alert log. Every command
//! validates and plans before touching state, so a failed command leaves the
//! ledger exactly as it was. Every successful batch mutation re-runs the alert
//! scan and hands a snapshot to the persistence sink, if one is attached.
//!
//! The ledger itself is not synchronised. Hosts that share it between threads
//! must hold a single lock across each command so that "mutate store, re-run
//! scan" is observed as one step.

pub mod alerts;
pub mod consumption;
pub mod metrics;
pub mod snapshot;
pub mod store;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    AddBatchInput, Alert, AlertSettings, Batch, BatchFilter, ConsumeInput, ConsumptionReceipt,
    UsageEvent,
};
use crate::types::BloodType;
use crate::validation::{validate_add_batch, validate_consume, validate_threshold};

pub use alerts::{scan, AlertLog};
pub use consumption::plan_draws;
pub use metrics::InventoryMetrics;
pub use snapshot::{LedgerRecord, LedgerSnapshot, PersistenceSink};
pub use store::{BatchStore, UsageLedger};

/// The authoritative blood stock ledger
pub struct InventoryLedger {
    batches: BatchStore,
    usage: UsageLedger,
    alerts: AlertLog,
    settings: AlertSettings,
    sink: Option<Box<dyn PersistenceSink>>,
}

impl std::fmt::Debug for InventoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryLedger")
            .field("batches", &self.batches.len())
            .field("usage", &self.usage.len())
            .field("alerts", &self.alerts.as_slice().len())
            .field("settings", &self.settings)
            .field("persistent", &self.sink.is_some())
            .finish()
    }
}

impl Default for InventoryLedger {
    fn default() -> Self {
        Self::new(AlertSettings::default())
    }
}

impl InventoryLedger {
    pub fn new(settings: AlertSettings) -> Self {
        Self {
            batches: BatchStore::default(),
            usage: UsageLedger::default(),
            alerts: AlertLog::default(),
            settings,
            sink: None,
        }
    }

    /// Restore from persisted records. The stored threshold wins over the one
    /// in `settings`.
    pub fn from_snapshot(snapshot: LedgerSnapshot, settings: AlertSettings) -> Self {
        Self {
            batches: BatchStore::from_batches(snapshot.batches),
            usage: UsageLedger::from_events(snapshot.usage),
            alerts: AlertLog::from_alerts(snapshot.alerts),
            settings: AlertSettings {
                low_stock_threshold: snapshot.threshold,
                ..settings
            },
            sink: None,
        }
    }

    /// Attach the sink that receives a snapshot after each mutation
    pub fn with_sink<S>(mut self, sink: S) -> Self
    where
        S: PersistenceSink + 'static,
    {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            batches: self.batches.as_slice().to_vec(),
            usage: self.usage.as_slice().to_vec(),
            alerts: self.alerts.as_slice().to_vec(),
            threshold: self.settings.low_stock_threshold,
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn settings(&self) -> &AlertSettings {
        &self.settings
    }

    pub fn threshold(&self) -> u32 {
        self.settings.low_stock_threshold
    }

    pub fn batches(&self) -> &[Batch] {
        self.batches.as_slice()
    }

    pub fn batch(&self, id: Uuid) -> Option<&Batch> {
        self.batches.get(id)
    }

    pub fn list_batches(&self, filter: &BatchFilter, now: DateTime<Utc>) -> Vec<&Batch> {
        self.batches.list(filter, now)
    }

    pub fn list_batches_where<F>(&self, predicate: F) -> Vec<&Batch>
    where
        F: Fn(&Batch) -> bool,
    {
        self.batches.list_where(predicate)
    }

    pub fn list_usage_events(&self) -> &[UsageEvent] {
        self.usage.as_slice()
    }

    pub fn list_alerts(&self) -> &[Alert] {
        self.alerts.as_slice()
    }

    pub fn alert_log(&self) -> &AlertLog {
        &self.alerts
    }

    pub fn unread_alert_count(&self) -> usize {
        self.alerts.unread_count()
    }

    pub fn metrics(&self) -> InventoryMetrics<'_> {
        InventoryMetrics::new(
            self.batches.as_slice(),
            self.usage.as_slice(),
            self.alerts.as_slice(),
        )
    }

    pub fn total_by_type(&self, blood_type: BloodType) -> u64 {
        self.batches.available(blood_type)
    }

    pub fn total_units(&self) -> u64 {
        self.metrics().total_units()
    }

    pub fn expiring_within(&self, days: i64, now: DateTime<Utc>) -> Vec<&Batch> {
        self.metrics().expiring_within(days, now)
    }

    pub fn used_today(&self, today: chrono::NaiveDate) -> u64 {
        self.metrics().used_today(today)
    }

    pub fn highest_demand_type(&self) -> Option<BloodType> {
        self.metrics().highest_demand_type()
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Record a new collection
    pub fn add_batch(&mut self, input: AddBatchInput, now: DateTime<Utc>) -> LedgerResult<Batch> {
        let valid = validate_add_batch(input, now.date_naive()).map_err(|e| {
            tracing::warn!(error = %e, "Rejected batch");
            e
        })?;

        let batch = Batch {
            id: Uuid::new_v4(),
            donor_name: valid.donor_name,
            donor_phone: valid.donor_phone,
            donor_email: valid.donor_email,
            blood_type: valid.blood_type,
            units_collected: valid.units_collected,
            units_remaining: valid.units_collected,
            collection_date: valid.collection_date,
            expiry_date: Batch::expiry_for(valid.collection_date),
        };
        self.batches.prepend(batch.clone());

        tracing::info!(
            batch_id = %batch.id,
            blood_type = %batch.blood_type,
            units = batch.units_collected,
            expiry = %batch.expiry_date,
            "Batch added"
        );

        self.refresh_alerts(now);
        self.persist();
        Ok(batch)
    }

    /// Issue units of one blood type, drawing soonest-expiring batches first
    pub fn consume(&mut self, input: ConsumeInput, now: DateTime<Utc>) -> LedgerResult<ConsumptionReceipt> {
        let valid = validate_consume(&input, now.date_naive())?;
        let draws = plan_draws(self.batches.as_slice(), valid.blood_type, valid.units).map_err(|e| {
            if let LedgerError::InsufficientStock { available, .. } = &e {
                tracing::warn!(
                    blood_type = %valid.blood_type,
                    requested = valid.units,
                    available,
                    "Rejected consumption: insufficient stock"
                );
            }
            e
        })?;

        self.batches.apply(&draws);
        let event = UsageEvent {
            id: Uuid::new_v4(),
            blood_type: valid.blood_type,
            units_used: valid.units,
            reason: valid.reason,
            date: valid.date,
        };
        self.usage.record(event.clone());

        tracing::info!(
            usage_id = %event.id,
            blood_type = %event.blood_type,
            units = event.units_used,
            reason = %event.reason,
            batches = draws.len(),
            "Units consumed"
        );

        self.refresh_alerts(now);
        self.persist();
        Ok(ConsumptionReceipt { event, draws })
    }

    /// Mark an alert read. Unknown ids and already-read alerts are a no-op.
    pub fn acknowledge(&mut self, alert_id: Uuid) -> bool {
        let changed = self.alerts.acknowledge(alert_id);
        if changed {
            tracing::debug!(%alert_id, "Alert acknowledged");
            self.persist();
        } else if self.alerts.get(alert_id).is_none() {
            tracing::debug!(%alert_id, "Ignoring acknowledgement of unknown alert");
        }
        changed
    }

    /// Mark every unread alert read; returns how many changed
    pub fn acknowledge_all(&mut self) -> usize {
        let changed = self.alerts.acknowledge_all();
        if changed > 0 {
            tracing::debug!(count = changed, "Alerts acknowledged");
            self.persist();
        }
        changed
    }

    /// Change the low-stock threshold and re-evaluate alerts against it
    pub fn set_threshold(&mut self, value: i64, now: DateTime<Utc>) -> LedgerResult<u32> {
        let threshold =
            validate_threshold(value).map_err(|m| LedgerError::validation("threshold", m))?;
        self.settings.low_stock_threshold = threshold;
        tracing::info!(threshold, "Low stock threshold updated");

        self.refresh_alerts(now);
        self.persist();
        Ok(threshold)
    }

    /// Run the alert scan against the current state and store its output.
    /// Hosts call this on startup since expiry bands move with the clock.
    pub fn refresh_alerts(&mut self, now: DateTime<Utc>) -> Vec<Alert> {
        let new_alerts = scan(
            self.batches.as_slice(),
            self.alerts.as_slice(),
            &self.settings,
            now,
        );
        if !new_alerts.is_empty() {
            tracing::info!(count = new_alerts.len(), "Alerts raised");
            self.alerts.prepend_all(new_alerts.clone());
        }
        new_alerts
    }

    /// Run the scan and persist if anything was raised
    pub fn refresh_and_persist(&mut self, now: DateTime<Utc>) -> usize {
        let raised = self.refresh_alerts(now).len();
        if raised > 0 {
            self.persist();
        }
        raised
    }

    fn persist(&self) {
        let Some(sink) = &self.sink else {
            return;
        };
        if let Err(e) = sink.persist(&self.snapshot()) {
            tracing::warn!(error = %e, "Failed to persist ledger; in-memory state kept");
        }
    }
}
