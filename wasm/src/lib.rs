//! WebAssembly module for the Blood Bank Inventory platform
//!
//! Hosts the inventory ledger in the browser:
//! - Batch, usage and alert commands through a `BloodBank` handle
//! - Persistence in `localStorage`
//! - Stateless expiry helpers for forms
//!
//! Every method exchanges JSON strings. Failed commands reject with a JSON
//! error object `{ code, message, field?, available? }`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::demo::seed_demo_data;
use shared::ledger::{InventoryLedger, LedgerSnapshot};
use shared::{
    parse_iso_date, AddBatchInput, AlertSettings, Batch, BatchFilter, BloodType, ConsumeInput,
    ExpiryStatus, LedgerError,
};
use uuid::Uuid;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;

/// Current time from the host clock
fn now() -> DateTime<Utc> {
    #[cfg(target_arch = "wasm32")]
    {
        DateTime::from_timestamp_millis(js_sys::Date::now() as i64).unwrap_or_default()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        Utc::now()
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Error shape handed to JavaScript
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BankError {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<u64>,
}

impl BankError {
    fn invalid_json(err: serde_json::Error) -> Self {
        Self {
            code: "INVALID_JSON",
            message: format!("Invalid JSON: {}", err),
            field: None,
            available: None,
        }
    }

    fn to_js(&self) -> JsValue {
        let body = serde_json::to_string(self).unwrap_or_else(|_| self.message.clone());
        JsValue::from_str(&body)
    }
}

impl From<LedgerError> for BankError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::Validation { field, message } => Self {
                code: "VALIDATION_ERROR",
                message,
                field: Some(field),
                available: None,
            },
            LedgerError::InsufficientStock { available, .. } => Self {
                code: "INSUFFICIENT_STOCK",
                message,
                field: None,
                available: Some(available),
            },
        }
    }
}

type BankResult<T> = Result<T, BankError>;

fn to_json<T: Serialize>(value: &T) -> BankResult<String> {
    serde_json::to_string(value).map_err(|e| BankError {
        code: "SERIALIZATION_ERROR",
        message: e.to_string(),
        field: None,
        available: None,
    })
}

// ============================================================================
// Browser storage
// ============================================================================

#[cfg(target_arch = "wasm32")]
mod storage {
    use shared::error::PersistenceError;
    use shared::ledger::{LedgerRecord, LedgerSnapshot, PersistenceSink};

    fn local_storage() -> Result<web_sys::Storage, PersistenceError> {
        web_sys::window()
            .ok_or_else(|| PersistenceError::Storage("no window".to_string()))?
            .local_storage()
            .map_err(|_| PersistenceError::Storage("localStorage is not accessible".to_string()))?
            .ok_or_else(|| PersistenceError::Storage("localStorage is unavailable".to_string()))
    }

    pub fn load() -> Result<LedgerSnapshot, PersistenceError> {
        let storage = local_storage()?;
        LedgerSnapshot::decode(|record: LedgerRecord| {
            storage.get_item(record.storage_key()).map_err(|_| {
                PersistenceError::Storage(format!("failed to read {}", record.storage_key()))
            })
        })
    }

    /// Writes each record under its `bb_*` key
    pub struct LocalStorageSink;

    impl PersistenceSink for LocalStorageSink {
        fn persist(&self, snapshot: &LedgerSnapshot) -> Result<(), PersistenceError> {
            let storage = local_storage()?;
            for (record, contents) in snapshot.encode_all()? {
                storage
                    .set_item(record.storage_key(), &contents)
                    .map_err(|_| {
                        PersistenceError::Storage(format!("failed to write {}", record.storage_key()))
                    })?;
            }
            Ok(())
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn console_warn(message: &str) {
    web_sys::console::warn_1(&JsValue::from_str(message));
}

// ============================================================================
// Ledger handle
// ============================================================================

/// Browser-side inventory ledger
#[wasm_bindgen]
pub struct BloodBank {
    ledger: InventoryLedger,
}

#[wasm_bindgen]
impl BloodBank {
    /// Open the ledger stored in `localStorage`, starting empty if nothing
    /// is stored or the stored records cannot be read
    #[wasm_bindgen(constructor)]
    pub fn new() -> BloodBank {
        #[cfg(target_arch = "wasm32")]
        {
            let snapshot = storage::load().unwrap_or_else(|e| {
                console_warn(&format!("Starting with an empty ledger: {}", e));
                LedgerSnapshot::default()
            });
            let ledger = InventoryLedger::from_snapshot(snapshot, AlertSettings::default())
                .with_sink(storage::LocalStorageSink);
            let mut bank = BloodBank { ledger };
            // Expiry bands may have moved since the last visit
            bank.ledger.refresh_and_persist(now());
            bank
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            BloodBank::from_snapshot(LedgerSnapshot::default())
        }
    }

    /// Seed the demo inventory if the ledger holds nothing yet.
    /// Returns whether anything was seeded.
    #[wasm_bindgen(js_name = seedDemoData)]
    pub fn seed_demo_data(&mut self) -> Result<bool, JsValue> {
        self.seed(now()).map_err(|e| e.to_js())
    }

    #[wasm_bindgen(js_name = listBatches)]
    pub fn list_batches(&self, filter_json: &str) -> Result<String, JsValue> {
        self.batches_json(filter_json, now()).map_err(|e| e.to_js())
    }

    #[wasm_bindgen(js_name = addBatch)]
    pub fn add_batch(&mut self, input_json: &str) -> Result<String, JsValue> {
        self.add_batch_json(input_json, now()).map_err(|e| e.to_js())
    }

    pub fn consume(&mut self, input_json: &str) -> Result<String, JsValue> {
        self.consume_json(input_json, now()).map_err(|e| e.to_js())
    }

    #[wasm_bindgen(js_name = listUsage)]
    pub fn list_usage(&self) -> Result<String, JsValue> {
        to_json(&self.ledger.list_usage_events()).map_err(|e| e.to_js())
    }

    #[wasm_bindgen(js_name = listAlerts)]
    pub fn list_alerts(&self) -> Result<String, JsValue> {
        to_json(&self.ledger.list_alerts()).map_err(|e| e.to_js())
    }

    #[wasm_bindgen(js_name = unreadAlertCount)]
    pub fn unread_alert_count(&self) -> usize {
        self.ledger.unread_alert_count()
    }

    /// Mark one alert read. Unknown or malformed ids are ignored.
    pub fn acknowledge(&mut self, alert_id: &str) -> bool {
        match Uuid::parse_str(alert_id) {
            Ok(id) => self.ledger.acknowledge(id),
            Err(_) => false,
        }
    }

    #[wasm_bindgen(js_name = acknowledgeAll)]
    pub fn acknowledge_all(&mut self) -> usize {
        self.ledger.acknowledge_all()
    }

    pub fn threshold(&self) -> u32 {
        self.ledger.threshold()
    }

    #[wasm_bindgen(js_name = setThreshold)]
    pub fn set_threshold(&mut self, value: i32) -> Result<u32, JsValue> {
        self.set_threshold_at(value, now()).map_err(|e| e.to_js())
    }

    /// Units on hand for a blood type label such as `"AB-"`
    #[wasm_bindgen(js_name = totalByType)]
    pub fn total_by_type(&self, label: &str) -> Result<u32, JsValue> {
        self.total_for_label(label).map_err(|e| e.to_js())
    }

    #[wasm_bindgen(js_name = totalUnits)]
    pub fn total_units(&self) -> u32 {
        saturate(self.ledger.total_units())
    }

    #[wasm_bindgen(js_name = expiringWithin)]
    pub fn expiring_within(&self, days: i32) -> Result<String, JsValue> {
        to_json(&self.ledger.expiring_within(i64::from(days), now())).map_err(|e| e.to_js())
    }

    #[wasm_bindgen(js_name = highestDemandType)]
    pub fn highest_demand_type(&self) -> Option<String> {
        self.ledger.highest_demand_type().map(|bt| bt.to_string())
    }

    /// Summary cards plus storage utilisation for `capacity` units
    pub fn dashboard(&self, capacity: u32) -> Result<String, JsValue> {
        self.dashboard_json(capacity, now()).map_err(|e| e.to_js())
    }

    #[wasm_bindgen(js_name = refreshAlerts)]
    pub fn refresh_alerts(&mut self) -> usize {
        self.ledger.refresh_and_persist(now())
    }
}

impl Default for BloodBank {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct Dashboard<'a> {
    #[serde(flatten)]
    summary: shared::ledger::metrics::DashboardSummary,
    storage: shared::ledger::metrics::StorageUtilization,
    shortage: shared::ledger::metrics::ShortageReport,
    usage_by_reason: Vec<shared::ledger::metrics::ReasonUsage>,
    expiring: Vec<&'a Batch>,
}

/// Clock-explicit operations behind the JavaScript surface
impl BloodBank {
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        Self {
            ledger: InventoryLedger::from_snapshot(snapshot, AlertSettings::default()),
        }
    }

    pub fn ledger(&self) -> &InventoryLedger {
        &self.ledger
    }

    fn seed(&mut self, now: DateTime<Utc>) -> BankResult<bool> {
        if !self.ledger.batches().is_empty() || !self.ledger.list_usage_events().is_empty() {
            return Ok(false);
        }
        seed_demo_data(&mut self.ledger, now)?;
        Ok(true)
    }

    fn batches_json(&self, filter_json: &str, now: DateTime<Utc>) -> BankResult<String> {
        let filter: BatchFilter = if filter_json.trim().is_empty() {
            BatchFilter::default()
        } else {
            serde_json::from_str(filter_json).map_err(BankError::invalid_json)?
        };
        to_json(&self.ledger.list_batches(&filter, now))
    }

    fn add_batch_json(&mut self, input_json: &str, now: DateTime<Utc>) -> BankResult<String> {
        let input: AddBatchInput = serde_json::from_str(input_json).map_err(BankError::invalid_json)?;
        let batch = self.ledger.add_batch(input, now)?;
        to_json(&batch)
    }

    fn consume_json(&mut self, input_json: &str, now: DateTime<Utc>) -> BankResult<String> {
        let input: ConsumeInput = serde_json::from_str(input_json).map_err(BankError::invalid_json)?;
        let receipt = self.ledger.consume(input, now)?;
        to_json(&receipt)
    }

    fn set_threshold_at(&mut self, value: i32, now: DateTime<Utc>) -> BankResult<u32> {
        Ok(self.ledger.set_threshold(i64::from(value), now)?)
    }

    fn total_for_label(&self, label: &str) -> BankResult<u32> {
        let blood_type: BloodType = label.parse().map_err(|e: shared::ParseBloodTypeError| BankError {
            code: "VALIDATION_ERROR",
            message: e.to_string(),
            field: Some("blood_type".to_string()),
            available: None,
        })?;
        Ok(saturate(self.ledger.total_by_type(blood_type)))
    }

    fn dashboard_json(&self, capacity: u32, now: DateTime<Utc>) -> BankResult<String> {
        let metrics = self.ledger.metrics();
        to_json(&Dashboard {
            summary: metrics.dashboard(now, self.ledger.threshold()),
            storage: metrics.storage_utilization(capacity),
            shortage: metrics.shortage_risk(),
            usage_by_reason: metrics.usage_by_reason(),
            expiring: metrics.expiring_within(shared::ledger::metrics::EXPIRING_SOON_DAYS, now),
        })
    }
}

fn saturate(units: u64) -> u32 {
    u32::try_from(units).unwrap_or(u32::MAX)
}

// ============================================================================
// Stateless helpers
// ============================================================================

/// Expiry date (`YYYY-MM-DD`) for a collection date
#[wasm_bindgen(js_name = expiryDateFor)]
pub fn expiry_date_for(collection_date: &str) -> Option<String> {
    parse_iso_date(collection_date)
        .ok()
        .map(|date| Batch::expiry_for(date).to_string())
}

/// Expiry band for a days-left count
#[wasm_bindgen(js_name = classifyExpiry)]
pub fn classify_expiry(days_left: i32) -> String {
    format!("{}", ExpiryStatus::from_days_left(i64::from(days_left)))
}


#[cfg(all(test, target_arch = "wasm32"))]
mod browser_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_ledger_survives_reload() {
        let mut bank = BloodBank::new();
        bank.set_threshold(17).unwrap();

        let reopened = BloodBank::new();
        assert_eq!(reopened.threshold(), 17);
    }
}
