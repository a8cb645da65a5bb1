//! Alert engine
//!
//! Derives low-stock and expiry alerts from the current batches. A scan only
//! ever adds alerts; existing alerts change solely through acknowledgement.
//!
//! De-duplication is against *unread* alerts:
//! - `low_stock` is keyed by blood type
//! - `expiry_warning` / `critical_expiry` are keyed by kind and source batch id

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    critical_expiry_message, expiry_warning_message, low_stock_message, Alert, AlertKind,
    AlertSettings, Batch, ExpiryStatus,
};
use crate::types::BloodType;

/// Compute the alerts a scan should add, in emission order: low-stock alerts
/// in blood type order, then expiry alerts in store order
pub fn scan(
    batches: &[Batch],
    existing: &[Alert],
    settings: &AlertSettings,
    now: DateTime<Utc>,
) -> Vec<Alert> {
    let today = now.date_naive();
    let mut new_alerts = Vec::new();

    for blood_type in BloodType::ALL {
        let mut stocked = false;
        let total: u64 = batches
            .iter()
            .filter(|b| b.blood_type == blood_type)
            .inspect(|_| stocked = true)
            .map(|b| u64::from(b.units_remaining))
            .sum();

        let low = total > 0 && total < u64::from(settings.low_stock_threshold);
        let exhausted = settings.alert_when_exhausted && stocked && total == 0;
        if !(low || exhausted) {
            continue;
        }
        if existing.iter().any(|a| a.is_unread_low_stock_for(blood_type)) {
            continue;
        }

        new_alerts.push(Alert {
            id: Uuid::new_v4(),
            kind: AlertKind::LowStock,
            blood_type: Some(blood_type),
            source_batch_id: None,
            message: low_stock_message(blood_type, total),
            date: today,
            read: false,
        });
    }

    for batch in batches.iter().filter(|b| b.units_remaining > 0) {
        let days_left = batch.days_until_expiry(now);
        let (kind, message) = match ExpiryStatus::from_days_left(days_left) {
            ExpiryStatus::Critical => (
                AlertKind::CriticalExpiry,
                critical_expiry_message(batch.blood_type, &batch.donor_name, days_left),
            ),
            ExpiryStatus::Warning => (
                AlertKind::ExpiryWarning,
                expiry_warning_message(batch.blood_type, &batch.donor_name, days_left),
            ),
            ExpiryStatus::Expired | ExpiryStatus::Safe => continue,
        };
        if existing.iter().any(|a| a.is_unread_for_batch(kind, batch.id)) {
            continue;
        }

        new_alerts.push(Alert {
            id: Uuid::new_v4(),
            kind,
            blood_type: Some(batch.blood_type),
            source_batch_id: Some(batch.id),
            message,
            date: today,
            read: false,
        });
    }

    new_alerts
}

/// Alert collection, most recent first
#[derive(Debug, Clone, Default)]
pub struct AlertLog {
    alerts: Vec<Alert>,
}

impl AlertLog {
    pub fn from_alerts(alerts: Vec<Alert>) -> Self {
        Self { alerts }
    }

    pub fn as_slice(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn get(&self, id: Uuid) -> Option<&Alert> {
        self.alerts.iter().find(|a| a.id == id)
    }

    /// Prepend a scan's output, keeping its internal order
    pub(crate) fn prepend_all(&mut self, new_alerts: Vec<Alert>) {
        if new_alerts.is_empty() {
            return;
        }
        self.alerts.splice(0..0, new_alerts);
    }

    /// Mark one alert read. Returns `true` only if something changed.
    pub(crate) fn acknowledge(&mut self, id: Uuid) -> bool {
        self.alerts
            .iter_mut()
            .find(|a| a.id == id)
            .map(Alert::acknowledge)
            .unwrap_or(false)
    }

    pub(crate) fn acknowledge_all(&mut self) -> usize {
        self.alerts
            .iter_mut()
            .map(Alert::acknowledge)
            .filter(|changed| *changed)
            .count()
    }

    pub fn unread(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter().filter(|a| !a.read)
    }

    pub fn unread_count(&self) -> usize {
        self.unread().count()
    }

    /// Unread alerts, most severe first, newest first within a severity
    pub fn unread_by_severity(&self) -> Vec<&Alert> {
        let mut unread: Vec<&Alert> = self.unread().collect();
        // Stable: collection order is already newest first
        unread.sort_by(|a, b| b.kind.severity().cmp(&a.kind.severity()));
        unread
    }
}
