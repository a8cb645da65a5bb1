//! Inventory alert models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::BloodType;

/// Default minimum units before a blood type counts as low
pub const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 20;

/// A derived notice, mutable only through acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Alert {
    pub id: Uuid,
    pub kind: AlertKind,
    #[serde(default)]
    pub blood_type: Option<BloodType>,
    /// Batch an expiry alert was raised for
    #[serde(default)]
    pub source_batch_id: Option<Uuid>,
    pub message: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub read: bool,
}

impl Alert {
    /// Mark as read. Returns `true` if the alert was unread before the call.
    pub fn acknowledge(&mut self) -> bool {
        let changed = !self.read;
        self.read = true;
        changed
    }

    pub fn is_unread_low_stock_for(&self, blood_type: BloodType) -> bool {
        !self.read && self.kind == AlertKind::LowStock && self.blood_type == Some(blood_type)
    }

    pub fn is_unread_for_batch(&self, kind: AlertKind, batch_id: Uuid) -> bool {
        !self.read && self.kind == kind && self.source_batch_id == Some(batch_id)
    }
}

/// Alert kinds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    LowStock,
    ExpiryWarning,
    CriticalExpiry,
}

impl AlertKind {
    /// Higher is more urgent
    pub fn severity(&self) -> u8 {
        match self {
            AlertKind::CriticalExpiry => 3,
            AlertKind::LowStock => 2,
            AlertKind::ExpiryWarning => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::LowStock => "low_stock",
            AlertKind::ExpiryWarning => "expiry_warning",
            AlertKind::CriticalExpiry => "critical_expiry",
        }
    }
}

/// Settings the alert scan is evaluated against
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlertSettings {
    /// A type is low when `0 < total < low_stock_threshold`
    #[serde(default = "default_threshold")]
    pub low_stock_threshold: u32,
    /// Also raise a low-stock alert when a stocked type runs out entirely
    #[serde(default)]
    pub alert_when_exhausted: bool,
}

fn default_threshold() -> u32 {
    DEFAULT_LOW_STOCK_THRESHOLD
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            alert_when_exhausted: false,
        }
    }
}

/// Low-stock alert text
pub fn low_stock_message(blood_type: BloodType, total: u64) -> String {
    if total == 0 {
        format!("{} stock exhausted (0 units).", blood_type)
    } else {
        format!("{} stock critically low ({} units).", blood_type, total)
    }
}

/// Critical expiry alert text
pub fn critical_expiry_message(blood_type: BloodType, donor_name: &str, days_left: i64) -> String {
    format!(
        "Critical: {} from {} expires in {} day(s).",
        blood_type, donor_name, days_left
    )
}

/// Expiry warning alert text
pub fn expiry_warning_message(blood_type: BloodType, donor_name: &str, days_left: i64) -> String {
    format!("{} from {} expires in {} days.", blood_type, donor_name, days_left)
}
